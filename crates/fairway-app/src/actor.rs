// Single-writer draft actor: serializes commands for one session and owns the
// pick clock.

use std::time::Duration;

use fairway_core::error::DraftError;
use fairway_core::ids::{ParticipantId, PlayerId, UserId};
use fairway_core::pick::DraftPick;
use fairway_core::service::{retry_on_conflict, DraftService};
use fairway_core::state::{DraftOptions, DraftPhase, OnTheClock};
use fairway_core::store::DraftStore;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{error, info, warn};

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

/// Requests served by the actor, each with a reply channel.
#[derive(Debug)]
pub enum DraftCommand {
    Options {
        participant_id: ParticipantId,
        reply: oneshot::Sender<Result<DraftOptions, DraftError>>,
    },
    Pick {
        participant_id: ParticipantId,
        player_id: PlayerId,
        acting_user: UserId,
        reply: oneshot::Sender<Result<DraftPick, DraftError>>,
    },
    Status {
        reply: oneshot::Sender<Result<DraftStatus, DraftError>>,
    },
    Quit,
}

/// Notifications pushed to whoever drives the UI or log.
#[derive(Debug, Clone, PartialEq)]
pub enum DraftEvent {
    OnTheClock { clock: OnTheClock, timer: Duration },
    PickMade(DraftPick),
    Completed { total_picks: u32 },
    /// Auto-pick found nothing legal; the clock is stopped until an operator
    /// intervenes.
    Halted { participant: ParticipantId, pick_number: u32, reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DraftStatus {
    pub phase: DraftPhase,
    pub pick_count: u32,
    pub total_picks: u32,
    pub on_the_clock: Option<OnTheClock>,
    pub halted: bool,
    /// Time left on the pick clock, if it is running.
    pub remaining: Option<Duration>,
}

#[derive(Debug, Error)]
pub enum ActorError {
    #[error(transparent)]
    Draft(#[from] DraftError),

    #[error("draft actor is no longer running")]
    Closed,
}

// ---------------------------------------------------------------------------
// Handle
// ---------------------------------------------------------------------------

/// Cloneable front end to a running [`DraftActor`].
#[derive(Debug, Clone)]
pub struct DraftHandle {
    tx: mpsc::Sender<DraftCommand>,
}

impl DraftHandle {
    pub async fn options(&self, participant_id: ParticipantId) -> Result<DraftOptions, ActorError> {
        self.request(|reply| DraftCommand::Options { participant_id, reply }).await
    }

    pub async fn pick(
        &self,
        participant_id: ParticipantId,
        player_id: PlayerId,
        acting_user: UserId,
    ) -> Result<DraftPick, ActorError> {
        self.request(|reply| DraftCommand::Pick {
            participant_id,
            player_id,
            acting_user,
            reply,
        })
        .await
    }

    pub async fn status(&self) -> Result<DraftStatus, ActorError> {
        self.request(|reply| DraftCommand::Status { reply }).await
    }

    /// Ask the actor to stop. Does not wait for it to exit.
    pub async fn quit(&self) -> Result<(), ActorError> {
        self.tx.send(DraftCommand::Quit).await.map_err(|_| ActorError::Closed)
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<Result<T, DraftError>>) -> DraftCommand,
    ) -> Result<T, ActorError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx.send(build(reply_tx)).await.map_err(|_| ActorError::Closed)?;
        let result = reply_rx.await.map_err(|_| ActorError::Closed)?;
        Ok(result?)
    }
}

// ---------------------------------------------------------------------------
// Actor
// ---------------------------------------------------------------------------

pub struct DraftActor<S> {
    service: DraftService<S>,
    pick_timer: Duration,
    events: mpsc::Sender<DraftEvent>,
    deadline: Option<Instant>,
    halted: bool,
}

impl<S: DraftStore + 'static> DraftActor<S> {
    pub fn new(service: DraftService<S>, pick_timer: Duration, events: mpsc::Sender<DraftEvent>) -> Self {
        DraftActor {
            service,
            pick_timer,
            events,
            deadline: None,
            halted: false,
        }
    }

    /// Spawn the actor on the current runtime.
    pub fn spawn(self) -> (DraftHandle, JoinHandle<anyhow::Result<()>>) {
        let (tx, rx) = mpsc::channel(64);
        let task = tokio::spawn(self.run(rx));
        (DraftHandle { tx }, task)
    }

    /// Serve commands until `Quit` or every handle is dropped.
    ///
    /// The pick clock restarts after every committed pick. When it expires
    /// the participant on the clock is auto-picked.
    pub async fn run(mut self, mut cmd_rx: mpsc::Receiver<DraftCommand>) -> anyhow::Result<()> {
        info!("Draft actor started for session {}", self.service.session().id);
        self.advance().await;

        loop {
            let timer_running = self.deadline.is_some();
            let deadline = self.deadline.unwrap_or_else(Instant::now);

            tokio::select! {
                cmd = cmd_rx.recv() => {
                    match cmd {
                        Some(DraftCommand::Quit) => {
                            info!("Quit command received, shutting down");
                            break;
                        }
                        Some(cmd) => self.handle_command(cmd).await,
                        None => {
                            info!("Command channel closed, shutting down");
                            break;
                        }
                    }
                }

                _ = sleep_until(deadline), if timer_running => {
                    self.on_timer_expired().await;
                }
            }
        }

        info!("Draft actor exiting");
        Ok(())
    }

    async fn handle_command(&mut self, cmd: DraftCommand) {
        match cmd {
            DraftCommand::Options { participant_id, reply } => {
                let _ = reply.send(self.service.request_options(&participant_id).await);
            }
            DraftCommand::Pick {
                participant_id,
                player_id,
                acting_user,
                reply,
            } => {
                let result = retry_on_conflict(|| {
                    self.service.make_pick(&participant_id, &player_id, &acting_user)
                })
                .await;
                let committed = result.as_ref().ok().cloned();
                let _ = reply.send(result);
                if let Some(pick) = committed {
                    self.emit(DraftEvent::PickMade(pick));
                    self.halted = false;
                    self.advance().await;
                }
            }
            DraftCommand::Status { reply } => {
                let _ = reply.send(self.status().await);
            }
            DraftCommand::Quit => {}
        }
    }

    async fn on_timer_expired(&mut self) {
        self.deadline = None;
        match self.service.auto_pick().await {
            Ok(pick) => {
                self.emit(DraftEvent::PickMade(pick));
                self.advance().await;
            }
            // Someone else committed this turn; the expired participant is no
            // longer on the clock, so re-read instead of retrying.
            Err(DraftError::Conflict { pick_number }) => {
                info!("Auto-pick #{} lost to a concurrent commit", pick_number);
                self.advance().await;
            }
            Err(DraftError::NoLegalPicks {
                participant,
                pick_number,
            }) => {
                let reason = format!("no legal picks remain for {participant} at pick #{pick_number}");
                error!("Draft halted: {}", reason);
                self.halted = true;
                self.emit(DraftEvent::Halted {
                    participant,
                    pick_number,
                    reason,
                });
            }
            Err(e) => {
                error!("Auto-pick failed, restarting clock: {}", e);
                self.deadline = Some(Instant::now() + self.pick_timer);
            }
        }
    }

    /// Re-read the session and restart the clock for whoever is up next.
    async fn advance(&mut self) {
        self.deadline = None;
        let state = match self.service.snapshot().await {
            Ok(state) => state,
            Err(e) => {
                error!("Failed to read draft state: {}", e);
                self.deadline = Some(Instant::now() + self.pick_timer);
                return;
            }
        };

        match state.phase() {
            DraftPhase::NotStarted => {
                warn!("Session {} has not started; clock idle", state.session().id);
            }
            DraftPhase::Complete => {
                info!("Draft complete after {} picks", state.pick_count());
                self.emit(DraftEvent::Completed {
                    total_picks: state.pick_count(),
                });
            }
            DraftPhase::InProgress => {
                if let Some(clock) = state.on_the_clock() {
                    info!(
                        "Pick #{} (round {}): {} on the clock",
                        clock.slot.pick_number, clock.slot.round, clock.participant_id
                    );
                    self.deadline = Some(Instant::now() + self.pick_timer);
                    self.emit(DraftEvent::OnTheClock {
                        clock,
                        timer: self.pick_timer,
                    });
                }
            }
        }
    }

    async fn status(&self) -> Result<DraftStatus, DraftError> {
        let state = self.service.snapshot().await?;
        Ok(DraftStatus {
            phase: state.phase(),
            pick_count: state.pick_count(),
            total_picks: state.session().total_picks(),
            on_the_clock: state.on_the_clock(),
            halted: self.halted,
            remaining: self
                .deadline
                .map(|d| d.saturating_duration_since(Instant::now())),
        })
    }

    /// Publish an event without waiting. A full channel drops the event so a
    /// slow reader cannot stall the clock or command handling.
    fn emit(&self, event: DraftEvent) {
        match self.events.try_send(event) {
            Ok(()) | Err(TrySendError::Closed(_)) => {}
            Err(TrySendError::Full(event)) => {
                warn!("Event channel full, dropping {:?}", event);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
