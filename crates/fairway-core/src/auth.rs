// Who may make a pick on a participant's behalf.

use crate::ids::UserId;
use crate::session::Participant;

/// Authorization hook consulted before a human pick is committed.
pub trait PickAuthorizer: Send + Sync {
    fn may_pick_for(&self, user: &UserId, participant: &Participant) -> bool;
}

/// The participant's owner, or the league commissioner.
#[derive(Debug, Clone)]
pub struct OwnerOrCommissioner {
    pub commissioner: UserId,
}

impl PickAuthorizer for OwnerOrCommissioner {
    fn may_pick_for(&self, user: &UserId, participant: &Participant) -> bool {
        user == &participant.user_id || user == &self.commissioner
    }
}

/// Accepts everyone. For trusted callers that authorize upstream.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl PickAuthorizer for AllowAll {
    fn may_pick_for(&self, _user: &UserId, _participant: &Participant) -> bool {
        true
    }
}
