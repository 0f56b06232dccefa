// Error types for the draft core.

use thiserror::Error;

use crate::ids::{ParticipantId, PlayerId, UserId};
use crate::league::LeagueStatus;
use crate::player::Sex;
use crate::state::DraftPhase;

/// Rejected input at the boundary where external data enters the core.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("field `{field}` must not be empty")]
    Empty { field: &'static str },

    #[error("field `{field}` out of range: {message}")]
    OutOfRange { field: &'static str, message: String },

    #[error("duplicate {what}: {value}")]
    Duplicate { what: &'static str, value: String },
}

/// Failure reported by a [`crate::store::DraftStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    /// The append lost a race: the pick number is taken, out of sequence, or
    /// the player was committed by another writer.
    #[error("pick #{pick_number} conflicts with the stored pick sequence")]
    Conflict { pick_number: u32 },

    /// The pick names a player the registry does not hold.
    #[error("player {0} is not in the registry")]
    UnknownPlayer(PlayerId),

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

/// Every way a draft operation can fail.
#[derive(Debug, Error)]
pub enum DraftError {
    #[error("cannot {operation} while the draft is {phase}")]
    InvalidState {
        phase: DraftPhase,
        operation: &'static str,
    },

    #[error("it is not {participant}'s turn ({on_the_clock} is on the clock)")]
    NotYourTurn {
        participant: ParticipantId,
        on_the_clock: ParticipantId,
    },

    #[error("user {user} may not pick for {participant}")]
    Unauthorized {
        user: UserId,
        participant: ParticipantId,
    },

    #[error("player {0} is not available")]
    PlayerUnavailable(PlayerId),

    #[error("player {player} ({sex}) is not allowed by the roster composition rules")]
    PlayerNotAllowed { player: PlayerId, sex: Sex },

    #[error("no legal picks remain for {participant} at pick #{pick_number}")]
    NoLegalPicks {
        participant: ParticipantId,
        pick_number: u32,
    },

    #[error("pick #{pick_number} was committed concurrently")]
    Conflict { pick_number: u32 },

    #[error("unknown participant: {0}")]
    UnknownParticipant(ParticipantId),

    #[error("league is {0}, not drafting")]
    LeagueNotDrafting(LeagueStatus),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(anyhow::Error),
}

impl DraftError {
    /// `Conflict` is the only kind that can succeed by re-validating and
    /// trying again with the same input.
    pub fn is_retryable(&self) -> bool {
        matches!(self, DraftError::Conflict { .. })
    }

    /// Conditions that need an operator before the draft can continue.
    pub fn is_fatal(&self) -> bool {
        matches!(self, DraftError::NoLegalPicks { .. })
    }
}

impl From<StoreError> for DraftError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Conflict { pick_number } => DraftError::Conflict { pick_number },
            StoreError::UnknownPlayer(id) => DraftError::PlayerUnavailable(id),
            StoreError::Backend(source) => DraftError::Store(source),
        }
    }
}
