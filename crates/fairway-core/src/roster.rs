// Participant rosters, projected from the pick sequence.

use serde::{Deserialize, Serialize};

use crate::filter::SexCaps;
use crate::ids::{ParticipantId, PlayerId};
use crate::pick::DraftPick;
use crate::player::{Player, Sex};

/// The players a participant has drafted, in pick order.
///
/// A roster is a cache rebuilt from [`DraftPick`]s; it is never written to
/// directly by draft operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Roster {
    pub participant_id: ParticipantId,
    players: Vec<Player>,
}

impl Roster {
    pub fn new(participant_id: ParticipantId) -> Self {
        Roster {
            participant_id,
            players: Vec::new(),
        }
    }

    /// Rebuild a roster by replaying `picks`, resolving player ids through
    /// `lookup`. Picks for other participants are skipped.
    pub fn from_picks<F>(participant_id: ParticipantId, picks: &[DraftPick], lookup: F) -> Self
    where
        F: Fn(&PlayerId) -> Option<Player>,
    {
        let mut roster = Roster::new(participant_id.clone());
        for pick in picks.iter().filter(|p| p.participant_id == participant_id) {
            if let Some(player) = lookup(&pick.player_id) {
                roster.add_player(player);
            }
        }
        roster
    }

    /// Append a player. Returns `false` (and leaves the roster unchanged) if
    /// the player is already on it.
    pub fn add_player(&mut self, player: Player) -> bool {
        if self.contains(player.id()) {
            return false;
        }
        self.players.push(player);
        true
    }

    pub fn contains(&self, player_id: &PlayerId) -> bool {
        self.players.iter().any(|p| p.id() == player_id)
    }

    pub fn count(&self, sex: Sex) -> u32 {
        self.players.iter().filter(|p| p.sex() == sex).count() as u32
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    /// Whether the roster holds exactly the required split.
    pub fn is_complete(&self, required: &SexCaps) -> bool {
        self.count(Sex::Male) == required.male && self.count(Sex::Female) == required.female
    }

    /// Whether neither sex exceeds its cap.
    pub fn within_caps(&self, caps: &SexCaps) -> bool {
        self.count(Sex::Male) <= caps.male && self.count(Sex::Female) <= caps.female
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::SessionId;
    use chrono::Utc;

    fn golfer(id: &str, sex: Sex) -> Player {
        Player::new(id, format!("Golfer {id}"), sex, true, None).unwrap()
    }

    fn pick(n: u32, participant: &str, player: &str) -> DraftPick {
        DraftPick {
            session_id: SessionId::from("s1"),
            participant_id: ParticipantId::from(participant),
            player_id: PlayerId::from(player),
            round: 1,
            pick_number: n,
            auto_picked: false,
            picked_at: Utc::now(),
        }
    }

    #[test]
    fn add_player_rejects_duplicates() {
        let mut roster = Roster::new(ParticipantId::from("a"));
        assert!(roster.add_player(golfer("m1", Sex::Male)));
        assert!(!roster.add_player(golfer("m1", Sex::Male)));
        assert_eq!(roster.len(), 1);
    }

    #[test]
    fn counts_by_sex() {
        let mut roster = Roster::new(ParticipantId::from("a"));
        roster.add_player(golfer("m1", Sex::Male));
        roster.add_player(golfer("f1", Sex::Female));
        roster.add_player(golfer("m2", Sex::Male));
        assert_eq!(roster.count(Sex::Male), 2);
        assert_eq!(roster.count(Sex::Female), 1);
        assert!(roster.within_caps(&SexCaps::default()));
        assert!(!roster.is_complete(&SexCaps::default()));
        roster.add_player(golfer("f2", Sex::Female));
        assert!(roster.is_complete(&SexCaps::default()));
    }

    #[test]
    fn from_picks_keeps_pick_order_and_owner() {
        let picks = vec![
            pick(1, "a", "m1"),
            pick(2, "b", "f1"),
            pick(3, "b", "m2"),
            pick(4, "a", "f2"),
        ];
        let lookup = |id: &PlayerId| {
            let sex = if id.as_str().starts_with('m') {
                Sex::Male
            } else {
                Sex::Female
            };
            Some(golfer(id.as_str(), sex))
        };
        let roster = Roster::from_picks(ParticipantId::from("a"), &picks, lookup);
        let ids: Vec<&str> = roster.players().iter().map(|p| p.id().as_str()).collect();
        assert_eq!(ids, vec!["m1", "f2"]);
    }
}
