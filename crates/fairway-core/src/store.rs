// Record-store interface consumed by the draft service, plus an in-memory
// implementation.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::error::StoreError;
use crate::ids::{ParticipantId, PlayerId, SessionId};
use crate::pick::DraftPick;
use crate::player::Player;
use crate::roster::Roster;

/// Persistence collaborator for the draft.
///
/// `append_pick` is the only write and the single point where concurrent
/// writers are arbitrated: it must fail with [`StoreError::Conflict`] unless
/// `pick.pick_number` is exactly one past the stored sequence and the player
/// has not been drafted in the session.
#[async_trait]
pub trait DraftStore: Send + Sync {
    /// Picks for `session_id`, oldest first.
    async fn list_picks(&self, session_id: &SessionId) -> Result<Vec<DraftPick>, StoreError>;

    /// Append a pick to `session_id`'s sequence.
    async fn append_pick(&self, session_id: &SessionId, pick: DraftPick) -> Result<DraftPick, StoreError>;

    /// Active players not in `excluding`, ordered by id.
    async fn list_available_players(&self, excluding: &[PlayerId]) -> Result<Vec<Player>, StoreError>;

    /// Registry entries for `ids`, active or not. Unknown ids are skipped.
    async fn get_players(&self, ids: &[PlayerId]) -> Result<Vec<Player>, StoreError>;

    /// A participant's drafted players in pick order.
    async fn get_roster(&self, session_id: &SessionId, participant_id: &ParticipantId)
        -> Result<Vec<Player>, StoreError>;
}

#[derive(Debug, Default)]
struct MemoryInner {
    players: Vec<Player>,
    picks: HashMap<SessionId, Vec<DraftPick>>,
}

/// `DraftStore` held entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryInner>,
}

impl MemoryStore {
    pub fn new(players: Vec<Player>) -> Self {
        MemoryStore {
            inner: Mutex::new(MemoryInner {
                players,
                picks: HashMap::new(),
            }),
        }
    }

    /// Add or replace a player in the registry.
    pub fn upsert_player(&self, player: Player) {
        let mut inner = self.lock();
        match inner.players.iter_mut().find(|p| p.id() == player.id()) {
            Some(existing) => *existing = player,
            None => inner.players.push(player),
        }
    }

    /// Panics if the mutex is poisoned.
    fn lock(&self) -> MutexGuard<'_, MemoryInner> {
        self.inner.lock().expect("memory store mutex poisoned")
    }
}

#[async_trait]
impl DraftStore for MemoryStore {
    async fn list_picks(&self, session_id: &SessionId) -> Result<Vec<DraftPick>, StoreError> {
        Ok(self.lock().picks.get(session_id).cloned().unwrap_or_default())
    }

    async fn append_pick(&self, session_id: &SessionId, pick: DraftPick) -> Result<DraftPick, StoreError> {
        let mut inner = self.lock();
        if !inner.players.iter().any(|p| p.id() == &pick.player_id) {
            return Err(StoreError::UnknownPlayer(pick.player_id));
        }
        let picks = inner.picks.entry(session_id.clone()).or_default();
        let expected = picks.len() as u32 + 1;
        if pick.pick_number != expected || picks.iter().any(|p| p.player_id == pick.player_id) {
            return Err(StoreError::Conflict {
                pick_number: pick.pick_number,
            });
        }
        picks.push(pick.clone());
        Ok(pick)
    }

    async fn list_available_players(&self, excluding: &[PlayerId]) -> Result<Vec<Player>, StoreError> {
        let excluded: HashSet<&PlayerId> = excluding.iter().collect();
        let mut players: Vec<Player> = self
            .lock()
            .players
            .iter()
            .filter(|p| p.is_active() && !excluded.contains(p.id()))
            .cloned()
            .collect();
        players.sort_by(|a, b| a.id().cmp(b.id()));
        Ok(players)
    }

    async fn get_players(&self, ids: &[PlayerId]) -> Result<Vec<Player>, StoreError> {
        let wanted: HashSet<&PlayerId> = ids.iter().collect();
        Ok(self
            .lock()
            .players
            .iter()
            .filter(|p| wanted.contains(p.id()))
            .cloned()
            .collect())
    }

    async fn get_roster(
        &self,
        session_id: &SessionId,
        participant_id: &ParticipantId,
    ) -> Result<Vec<Player>, StoreError> {
        let inner = self.lock();
        let picks = inner.picks.get(session_id).map(Vec::as_slice).unwrap_or_default();
        let roster = Roster::from_picks(participant_id.clone(), picks, |id| {
            inner.players.iter().find(|p| p.id() == id).cloned()
        });
        Ok(roster.players().to_vec())
    }
}
