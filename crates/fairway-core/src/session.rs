// Draft sessions: participants, draft positions and round count.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{DraftError, ValidationError};
use crate::ids::{LeagueId, ParticipantId, SessionId, UserId};
use crate::league::League;
use crate::order;
use crate::state::DraftPhase;

/// A league member's team taking part in a draft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub name: String,
    /// The user who owns this team.
    pub user_id: UserId,
    /// 1-based draft position, assigned once before the draft starts.
    pub draft_position: Option<u32>,
}

impl Participant {
    pub fn new(id: impl Into<ParticipantId>, name: impl Into<String>, user_id: impl Into<UserId>) -> Self {
        Participant {
            id: id.into(),
            name: name.into(),
            user_id: user_id.into(),
            draft_position: None,
        }
    }
}

/// One league's draft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftSession {
    pub id: SessionId,
    pub league_id: LeagueId,
    participants: Vec<Participant>,
    total_rounds: u32,
    started_at: Option<DateTime<Utc>>,
}

impl DraftSession {
    pub fn new(
        id: SessionId,
        league_id: LeagueId,
        participants: Vec<Participant>,
        total_rounds: u32,
    ) -> Result<Self, ValidationError> {
        if participants.is_empty() {
            return Err(ValidationError::Empty {
                field: "session.participants",
            });
        }
        if total_rounds == 0 {
            return Err(ValidationError::OutOfRange {
                field: "session.total_rounds",
                message: "must be at least 1".into(),
            });
        }
        let mut seen = HashSet::new();
        for p in &participants {
            if !seen.insert(&p.id) {
                return Err(ValidationError::Duplicate {
                    what: "participant",
                    value: p.id.to_string(),
                });
            }
        }
        Ok(DraftSession {
            id,
            league_id,
            participants,
            total_rounds,
            started_at: None,
        })
    }

    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    pub fn participant(&self, id: &ParticipantId) -> Option<&Participant> {
        self.participants.iter().find(|p| &p.id == id)
    }

    /// The participant holding `draft_position`.
    pub fn participant_at(&self, draft_position: u32) -> Option<&Participant> {
        self.participants
            .iter()
            .find(|p| p.draft_position == Some(draft_position))
    }

    pub fn participant_count(&self) -> u32 {
        self.participants.len() as u32
    }

    pub fn total_rounds(&self) -> u32 {
        self.total_rounds
    }

    pub fn total_picks(&self) -> u32 {
        order::total_picks(self.participant_count(), self.total_rounds)
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn is_started(&self) -> bool {
        self.started_at.is_some()
    }

    pub fn positions_assigned(&self) -> bool {
        self.participants.iter().all(|p| p.draft_position.is_some())
    }

    /// Assign draft positions 1..=N by a uniform shuffle.
    pub fn assign_random_positions<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<(), DraftError> {
        let mut order: Vec<ParticipantId> = self.participants.iter().map(|p| p.id.clone()).collect();
        order.shuffle(rng);
        self.assign_positions(&order)
    }

    /// Assign draft positions from an explicit order: `order[0]` picks first.
    ///
    /// `order` must name every participant exactly once. Positions can only be
    /// assigned before the draft starts.
    pub fn assign_positions(&mut self, order: &[ParticipantId]) -> Result<(), DraftError> {
        if self.is_started() {
            return Err(DraftError::InvalidState {
                phase: DraftPhase::InProgress,
                operation: "assign draft positions",
            });
        }
        if order.len() != self.participants.len() {
            return Err(ValidationError::OutOfRange {
                field: "session.draft_order",
                message: format!(
                    "expected {} participants, got {}",
                    self.participants.len(),
                    order.len()
                ),
            }
            .into());
        }
        let mut seen = HashSet::new();
        for id in order {
            if !seen.insert(id) {
                return Err(ValidationError::Duplicate {
                    what: "participant in draft order",
                    value: id.to_string(),
                }
                .into());
            }
            if self.participant(id).is_none() {
                return Err(DraftError::UnknownParticipant(id.clone()));
            }
        }
        for (idx, id) in order.iter().enumerate() {
            if let Some(p) = self.participants.iter_mut().find(|p| &p.id == id) {
                p.draft_position = Some(idx as u32 + 1);
            }
        }
        Ok(())
    }

    /// Open the draft for picks. The league must already be drafting and
    /// every participant must hold a draft position.
    pub fn start(&mut self, league: &League, now: DateTime<Utc>) -> Result<(), DraftError> {
        if self.is_started() {
            return Err(DraftError::InvalidState {
                phase: DraftPhase::InProgress,
                operation: "start the draft",
            });
        }
        if league.id != self.league_id {
            return Err(ValidationError::OutOfRange {
                field: "session.league_id",
                message: format!("session belongs to {}, not {}", self.league_id, league.id),
            }
            .into());
        }
        if !league.is_drafting() {
            return Err(DraftError::LeagueNotDrafting(league.status));
        }
        if !self.positions_assigned() {
            return Err(ValidationError::Empty {
                field: "participant.draft_position",
            }
            .into());
        }
        self.started_at = Some(now);
        Ok(())
    }
}
