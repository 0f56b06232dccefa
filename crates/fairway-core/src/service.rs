// Draft operations against a store: snapshot, validate, commit.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use anyhow::anyhow;
use chrono::Utc;
use tracing::{error, info, warn};

use crate::auth::PickAuthorizer;
use crate::error::DraftError;
use crate::filter::CompositionRules;
use crate::ids::{ParticipantId, PlayerId, UserId};
use crate::pick::{self, DraftPick};
use crate::player::Player;
use crate::roster::Roster;
use crate::session::DraftSession;
use crate::state::{DraftOptions, DraftState};
use crate::store::DraftStore;

/// Runs the draft operations for one session.
///
/// Every operation reads a fresh snapshot from the store, so several services
/// (or processes) may point at the same session; the store's conditional
/// append decides which of two racing commits wins.
pub struct DraftService<S> {
    store: Arc<S>,
    session: DraftSession,
    rules: CompositionRules,
    authorizer: Arc<dyn PickAuthorizer>,
}

impl<S: DraftStore> DraftService<S> {
    pub fn new(
        store: Arc<S>,
        session: DraftSession,
        rules: CompositionRules,
        authorizer: Arc<dyn PickAuthorizer>,
    ) -> Self {
        DraftService {
            store,
            session,
            rules,
            authorizer,
        }
    }

    pub fn session(&self) -> &DraftSession {
        &self.session
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Load the current state of the session from the store.
    ///
    /// Rosters are projected from the pick list read here, so they always
    /// agree with the pick count even if another writer commits mid-read.
    pub async fn snapshot(&self) -> Result<DraftState, DraftError> {
        let picks = self.store.list_picks(&self.session.id).await?;
        if !pick::is_contiguous(&picks) {
            return Err(DraftError::Store(anyhow!(
                "stored pick sequence for session {} has gaps or duplicates",
                self.session.id
            )));
        }

        let drafted: Vec<PlayerId> = picks.iter().map(|p| p.player_id.clone()).collect();
        let available = self.store.list_available_players(&drafted).await?;
        let registry: HashMap<PlayerId, Player> = self
            .store
            .get_players(&drafted)
            .await?
            .into_iter()
            .map(|p| (p.id().clone(), p))
            .collect();
        if let Some(missing) = drafted.iter().find(|id| !registry.contains_key(*id)) {
            return Err(DraftError::Store(anyhow!(
                "drafted player {} is missing from the registry",
                missing
            )));
        }

        let rosters = self
            .session
            .participants()
            .iter()
            .map(|participant| {
                Roster::from_picks(participant.id.clone(), &picks, |id| registry.get(id).cloned())
            })
            .collect();

        Ok(DraftState::new(
            self.session.clone(),
            self.rules,
            picks,
            available,
            rosters,
        ))
    }

    pub async fn request_options(&self, participant_id: &ParticipantId) -> Result<DraftOptions, DraftError> {
        self.snapshot().await?.request_options(participant_id)
    }

    /// Validate and commit a human pick.
    pub async fn make_pick(
        &self,
        participant_id: &ParticipantId,
        player_id: &PlayerId,
        acting_user: &UserId,
    ) -> Result<DraftPick, DraftError> {
        let state = self.snapshot().await?;
        let pick = state
            .prepare_pick(
                participant_id,
                player_id,
                acting_user,
                self.authorizer.as_ref(),
                Utc::now(),
            )
            .inspect_err(|e| warn!("Rejected pick of {} by {}: {}", player_id, participant_id, e))?;
        self.commit(pick).await
    }

    /// Commit the recommended player for whoever is on the clock.
    pub async fn auto_pick(&self) -> Result<DraftPick, DraftError> {
        let state = self.snapshot().await?;
        let pick = state.prepare_auto_pick(Utc::now()).inspect_err(|e| {
            if e.is_fatal() {
                error!("Auto-pick halted session {}: {}", self.session.id, e);
            }
        })?;
        self.commit(pick).await
    }

    /// Append a validated pick. Fails with `Conflict` if another writer got
    /// there first.
    pub async fn commit(&self, pick: DraftPick) -> Result<DraftPick, DraftError> {
        match self.store.append_pick(&self.session.id, pick).await {
            Ok(pick) => {
                info!(
                    "Pick #{} (round {}): {} drafted {}{}",
                    pick.pick_number,
                    pick.round,
                    pick.participant_id,
                    pick.player_id,
                    if pick.auto_picked { " [auto]" } else { "" }
                );
                Ok(pick)
            }
            Err(e) => {
                let e = DraftError::from(e);
                warn!("Commit failed for session {}: {}", self.session.id, e);
                Err(e)
            }
        }
    }
}

/// Run `op`, and run it exactly once more if it lost a commit race.
///
/// `op` must re-read state and re-validate on each call; the second attempt
/// usually fails with `NotYourTurn` or `PlayerUnavailable`, which is the
/// answer the caller needs.
pub async fn retry_on_conflict<T, F, Fut>(mut op: F) -> Result<T, DraftError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, DraftError>>,
{
    match op().await {
        Err(e) if e.is_retryable() => {
            info!("Retrying after conflict: {}", e);
            op().await
        }
        other => other,
    }
}
