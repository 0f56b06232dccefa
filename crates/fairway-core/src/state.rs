// Draft state machine: turn order, pick validation and the roster projection.
//
// A `DraftState` is an in-memory snapshot of one session. Everything here is
// pure; committing a pick to storage is the job of `DraftService`.

use std::collections::{HashMap, HashSet};
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::auth::PickAuthorizer;
use crate::error::DraftError;
use crate::filter::{self, CompositionRules};
use crate::ids::{ParticipantId, PlayerId, UserId};
use crate::order::{self, PickSlot};
use crate::pick::DraftPick;
use crate::player::Player;
use crate::recommend::recommend;
use crate::roster::Roster;
use crate::session::DraftSession;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DraftPhase {
    NotStarted,
    InProgress,
    Complete,
}

impl fmt::Display for DraftPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DraftPhase::NotStarted => "not started",
            DraftPhase::InProgress => "in progress",
            DraftPhase::Complete => "complete",
        };
        f.write_str(s)
    }
}

/// The participant whose turn it is, and the slot they are picking in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OnTheClock {
    pub participant_id: ParticipantId,
    pub slot: PickSlot,
}

/// What a participant may draft right now.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftOptions {
    pub participant_id: ParticipantId,
    pub current_round: u32,
    /// Every undrafted active player, ordered by id.
    pub available_pool: Vec<Player>,
    /// `available_pool` after the roster composition filter.
    pub filtered_pool: Vec<Player>,
    pub recommendation: Option<Player>,
}

/// Snapshot of a draft session and everything derived from its picks.
#[derive(Debug, Clone)]
pub struct DraftState {
    session: DraftSession,
    rules: CompositionRules,
    picks: Vec<DraftPick>,
    available: Vec<Player>,
    rosters: HashMap<ParticipantId, Roster>,
}

impl DraftState {
    /// Assemble a snapshot from data already loaded from a store.
    ///
    /// `available` is cleaned up here: inactive and already-drafted players
    /// are dropped and the rest sorted by id.
    pub fn new(
        session: DraftSession,
        rules: CompositionRules,
        picks: Vec<DraftPick>,
        available: Vec<Player>,
        rosters: Vec<Roster>,
    ) -> Self {
        let drafted: HashSet<&PlayerId> = picks.iter().map(|p| &p.player_id).collect();
        let mut available: Vec<Player> = available
            .into_iter()
            .filter(|p| p.is_active() && !drafted.contains(p.id()))
            .collect();
        available.sort_by(|a, b| a.id().cmp(b.id()));

        let rosters = rosters
            .into_iter()
            .map(|r| (r.participant_id.clone(), r))
            .collect();

        DraftState {
            session,
            rules,
            picks,
            available,
            rosters,
        }
    }

    /// Rebuild the state by replaying `picks` against the full player
    /// registry.
    pub fn replay(
        session: DraftSession,
        rules: CompositionRules,
        players: Vec<Player>,
        picks: Vec<DraftPick>,
    ) -> Result<Self, DraftError> {
        let mut state = DraftState::new(session, rules, Vec::new(), players, Vec::new());
        for pick in picks {
            state.apply(pick)?;
        }
        Ok(state)
    }

    pub fn session(&self) -> &DraftSession {
        &self.session
    }

    pub fn rules(&self) -> &CompositionRules {
        &self.rules
    }

    pub fn picks(&self) -> &[DraftPick] {
        &self.picks
    }

    pub fn available(&self) -> &[Player] {
        &self.available
    }

    /// A participant's roster; empty if they have not picked yet.
    pub fn roster(&self, participant_id: &ParticipantId) -> Roster {
        self.rosters
            .get(participant_id)
            .cloned()
            .unwrap_or_else(|| Roster::new(participant_id.clone()))
    }

    pub fn rosters(&self) -> impl Iterator<Item = &Roster> {
        self.rosters.values()
    }

    pub fn pick_count(&self) -> u32 {
        self.picks.len() as u32
    }

    /// The pick number that would be committed next.
    pub fn current_pick_number(&self) -> u32 {
        self.pick_count() + 1
    }

    pub fn is_complete(&self) -> bool {
        self.pick_count() >= self.session.total_picks()
    }

    pub fn phase(&self) -> DraftPhase {
        if self.is_complete() {
            DraftPhase::Complete
        } else if self.session.is_started() {
            DraftPhase::InProgress
        } else {
            DraftPhase::NotStarted
        }
    }

    /// Who picks next, derived from the pick count. `None` once complete.
    pub fn on_the_clock(&self) -> Option<OnTheClock> {
        if self.is_complete() {
            return None;
        }
        let slot = order::slot_for_pick(self.session.participant_count(), self.current_pick_number())?;
        let participant = self.session.participant_at(slot.draft_position)?;
        Some(OnTheClock {
            participant_id: participant.id.clone(),
            slot,
        })
    }

    /// The current round, or `None` once complete.
    pub fn current_round(&self) -> Option<u32> {
        if self.is_complete() {
            return None;
        }
        order::slot_for_pick(self.session.participant_count(), self.current_pick_number()).map(|s| s.round)
    }

    /// Pool, filtered pool and recommendation for `participant_id`. Any
    /// participant may ask, whether or not they are on the clock.
    pub fn request_options(&self, participant_id: &ParticipantId) -> Result<DraftOptions, DraftError> {
        if self.session.participant(participant_id).is_none() {
            return Err(DraftError::UnknownParticipant(participant_id.clone()));
        }
        let current_round = self.current_round().ok_or(DraftError::InvalidState {
            phase: DraftPhase::Complete,
            operation: "request options",
        })?;

        let roster = self.roster(participant_id);
        let filtered_pool = filter::filter_pool(&self.available, roster.players(), current_round, &self.rules);
        let recommendation = recommend(&filtered_pool).cloned();
        debug!(
            "Options for {}: round {}, {} available, {} allowed",
            participant_id,
            current_round,
            self.available.len(),
            filtered_pool.len()
        );

        Ok(DraftOptions {
            participant_id: participant_id.clone(),
            current_round,
            available_pool: self.available.clone(),
            filtered_pool,
            recommendation,
        })
    }

    /// Validate a human pick and build the record to commit.
    ///
    /// Checks run in a fixed order and the first failure is returned:
    /// phase, turn, authorization, availability, composition.
    pub fn prepare_pick(
        &self,
        participant_id: &ParticipantId,
        player_id: &PlayerId,
        acting_user: &UserId,
        authorizer: &dyn PickAuthorizer,
        now: DateTime<Utc>,
    ) -> Result<DraftPick, DraftError> {
        let clock = self.require_in_progress("make a pick")?;

        if &clock.participant_id != participant_id {
            return Err(DraftError::NotYourTurn {
                participant: participant_id.clone(),
                on_the_clock: clock.participant_id,
            });
        }

        let participant = self
            .session
            .participant(participant_id)
            .ok_or_else(|| DraftError::UnknownParticipant(participant_id.clone()))?;
        if !authorizer.may_pick_for(acting_user, participant) {
            warn!("User {} tried to pick for {}", acting_user, participant_id);
            return Err(DraftError::Unauthorized {
                user: acting_user.clone(),
                participant: participant_id.clone(),
            });
        }

        let player = self
            .available
            .iter()
            .find(|p| p.id() == player_id)
            .ok_or_else(|| DraftError::PlayerUnavailable(player_id.clone()))?;

        let roster = self.roster(participant_id);
        if !filter::is_allowed(player, roster.players(), clock.slot.round, &self.rules) {
            return Err(DraftError::PlayerNotAllowed {
                player: player_id.clone(),
                sex: player.sex(),
            });
        }

        Ok(self.pick_record(&clock, player_id.clone(), false, now))
    }

    /// Choose the recommended player for whoever is on the clock.
    ///
    /// An empty filtered pool is fatal: the remaining players cannot satisfy
    /// the composition rules and the draft cannot continue on its own.
    pub fn prepare_auto_pick(&self, now: DateTime<Utc>) -> Result<DraftPick, DraftError> {
        let clock = self.require_in_progress("auto-pick")?;
        let options = self.request_options(&clock.participant_id)?;
        let Some(choice) = options.recommendation else {
            return Err(DraftError::NoLegalPicks {
                participant: clock.participant_id,
                pick_number: clock.slot.pick_number,
            });
        };
        Ok(self.pick_record(&clock, choice.id().clone(), true, now))
    }

    /// Fold a committed pick into the snapshot.
    ///
    /// The pick must carry the next pick number, be credited to the
    /// participant on the clock and name an available player; anything else
    /// means the snapshot and the stored sequence disagree.
    pub fn apply(&mut self, pick: DraftPick) -> Result<(), DraftError> {
        match self.on_the_clock() {
            Some(clock)
                if clock.slot.pick_number == pick.pick_number && clock.participant_id == pick.participant_id => {}
            _ => {
                return Err(DraftError::Conflict {
                    pick_number: pick.pick_number,
                })
            }
        }
        let idx = self
            .available
            .iter()
            .position(|p| p.id() == &pick.player_id)
            .ok_or_else(|| DraftError::PlayerUnavailable(pick.player_id.clone()))?;
        let player = self.available.remove(idx);

        self.rosters
            .entry(pick.participant_id.clone())
            .or_insert_with(|| Roster::new(pick.participant_id.clone()))
            .add_player(player);
        self.picks.push(pick);
        Ok(())
    }

    fn require_in_progress(&self, operation: &'static str) -> Result<OnTheClock, DraftError> {
        let phase = self.phase();
        if phase != DraftPhase::InProgress {
            return Err(DraftError::InvalidState { phase, operation });
        }
        self.on_the_clock().ok_or(DraftError::InvalidState {
            phase: DraftPhase::Complete,
            operation,
        })
    }

    fn pick_record(&self, clock: &OnTheClock, player_id: PlayerId, auto_picked: bool, now: DateTime<Utc>) -> DraftPick {
        DraftPick {
            session_id: self.session.id.clone(),
            participant_id: clock.participant_id.clone(),
            player_id,
            round: clock.slot.round,
            pick_number: clock.slot.pick_number,
            auto_picked,
            picked_at: now,
        }
    }
}
