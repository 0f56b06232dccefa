// League lifecycle: pre-draft -> drafting -> post-draft -> finalized.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::filter::CompositionRules;
use crate::ids::{LeagueId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LeagueStatus {
    PreDraft,
    Drafting,
    PostDraft,
    Finalized,
}

impl LeagueStatus {
    /// The single legal successor of each status.
    pub fn next(self) -> Option<LeagueStatus> {
        match self {
            LeagueStatus::PreDraft => Some(LeagueStatus::Drafting),
            LeagueStatus::Drafting => Some(LeagueStatus::PostDraft),
            LeagueStatus::PostDraft => Some(LeagueStatus::Finalized),
            LeagueStatus::Finalized => None,
        }
    }

    pub fn can_transition_to(self, to: LeagueStatus) -> bool {
        self.next() == Some(to)
    }

    pub fn is_terminal(self) -> bool {
        self.next().is_none()
    }
}

impl fmt::Display for LeagueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LeagueStatus::PreDraft => "pre-draft",
            LeagueStatus::Drafting => "drafting",
            LeagueStatus::PostDraft => "post-draft",
            LeagueStatus::Finalized => "finalized",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LeagueError {
    #[error("illegal league transition from {from} to {to}")]
    IllegalTransition { from: LeagueStatus, to: LeagueStatus },

    #[error("league needs at least {need} participants to start drafting, has {have}")]
    NotEnoughParticipants { have: usize, need: usize },

    #[error("league cannot leave drafting until the draft is complete")]
    DraftIncomplete,
}

/// Facts about the league's draft that gate status transitions.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransitionFacts {
    pub participant_count: usize,
    pub draft_complete: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct League {
    pub id: LeagueId,
    pub name: String,
    pub commissioner: UserId,
    pub status: LeagueStatus,
    pub rules: CompositionRules,
    pub min_participants: usize,
}

impl League {
    pub fn new(
        id: LeagueId,
        name: impl Into<String>,
        commissioner: UserId,
        rules: CompositionRules,
        min_participants: usize,
    ) -> Self {
        League {
            id,
            name: name.into(),
            commissioner,
            status: LeagueStatus::PreDraft,
            rules,
            min_participants,
        }
    }

    pub fn is_drafting(&self) -> bool {
        self.status == LeagueStatus::Drafting
    }

    /// Move to `to`, checking the transition table and its guards.
    pub fn transition(&mut self, to: LeagueStatus, facts: TransitionFacts) -> Result<(), LeagueError> {
        if !self.status.can_transition_to(to) {
            return Err(LeagueError::IllegalTransition {
                from: self.status,
                to,
            });
        }
        match to {
            LeagueStatus::Drafting if facts.participant_count < self.min_participants => {
                return Err(LeagueError::NotEnoughParticipants {
                    have: facts.participant_count,
                    need: self.min_participants,
                });
            }
            LeagueStatus::PostDraft if !facts.draft_complete => {
                return Err(LeagueError::DraftIncomplete);
            }
            _ => {}
        }
        self.status = to;
        Ok(())
    }
}
