// Immutable draft pick records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{ParticipantId, PlayerId, SessionId};

/// A committed draft pick. Never mutated or deleted once stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftPick {
    pub session_id: SessionId,
    pub participant_id: ParticipantId,
    pub player_id: PlayerId,
    /// 1-based round the pick was made in.
    pub round: u32,
    /// 1-based overall pick number.
    pub pick_number: u32,
    /// Whether the pick was made by the clock rather than the participant.
    pub auto_picked: bool,
    pub picked_at: DateTime<Utc>,
}

/// Check that `picks` are numbered 1..=len without gaps or repeats.
pub fn is_contiguous(picks: &[DraftPick]) -> bool {
    picks
        .iter()
        .enumerate()
        .all(|(i, p)| p.pick_number as usize == i + 1)
}
