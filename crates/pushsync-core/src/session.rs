// ── Reactive sync session ──
//
// Drives a `TopicSyncEngine` from a stream of input changes. The host
// publishes the latest sign-in identity, community list, and push flag;
// the session reconciles once at start and again on every change.
// Changes that arrive while a pass is running are coalesced into the
// next pass, so passes for one subscriber never overlap.
//
// The retained token belongs to the subscriber it was obtained for. When
// the subscriber changes, the driver drops it before the next pass; hosts
// that persist tokens per subscriber shut the session down and start a
// new one instead.

use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::engine::TopicSyncEngine;
use crate::error::CoreError;
use crate::model::{CommunityId, DeviceToken, ReconcileOutcome, Subscriber};

const EVENT_CHANNEL_SIZE: usize = 64;

/// The three inputs a reconciliation pass depends on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncInputs {
    pub subscriber: Subscriber,
    pub communities: Vec<CommunityId>,
    pub push_enabled: bool,
}

/// Result of one pass, as published to session observers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Reconciled(ReconcileOutcome),
    /// The token service failed. Not retried; the next input change
    /// triggers a fresh pass.
    Failed { message: String, transient: bool },
}

/// Handle to a running session task.
pub struct SyncSession {
    inputs: watch::Sender<SyncInputs>,
    events: broadcast::Sender<SessionEvent>,
    cancel: CancellationToken,
    task: JoinHandle<TopicSyncEngine>,
}

impl SyncSession {
    /// Spawn the driver task and run the first pass with `initial`.
    ///
    /// Returns the session plus a receiver that is subscribed before the
    /// first pass, so no outcome is missed.
    pub fn start(
        engine: TopicSyncEngine,
        initial: SyncInputs,
    ) -> (Self, broadcast::Receiver<SessionEvent>) {
        let cancel = engine.cancellation_token().clone();
        let (inputs, inputs_rx) = watch::channel(initial);
        let (events, events_rx) = broadcast::channel(EVENT_CHANNEL_SIZE);

        let task = tokio::spawn(drive(engine, inputs_rx, events.clone(), cancel.clone()));

        (
            Self {
                inputs,
                events,
                cancel,
                task,
            },
            events_rx,
        )
    }

    /// Publish new inputs. Returns `false` (and triggers nothing) when
    /// they equal the current ones.
    pub fn update(&self, next: SyncInputs) -> bool {
        self.inputs.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        })
    }

    /// Apply a change to the current inputs in place.
    pub fn modify(&self, f: impl FnOnce(&mut SyncInputs)) -> bool {
        self.inputs.send_if_modified(|current| {
            let before = current.clone();
            f(current);
            *current != before
        })
    }

    /// Snapshot of the most recently published inputs.
    pub fn current(&self) -> SyncInputs {
        self.inputs.borrow().clone()
    }

    /// Subscribe an additional observer.
    pub fn outcomes(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Tear the session down and hand back the retained token.
    ///
    /// A pass in flight finishes its current call but its result is
    /// discarded (it reports `Cancelled`).
    pub async fn shutdown(self) -> Result<Option<DeviceToken>, CoreError> {
        self.cancel.cancel();
        let mut engine = self
            .task
            .await
            .map_err(|e| CoreError::Internal(format!("sync session task failed: {e}")))?;
        Ok(engine.take_retained_token())
    }
}

async fn drive(
    mut engine: TopicSyncEngine,
    mut inputs: watch::Receiver<SyncInputs>,
    events: broadcast::Sender<SessionEvent>,
    cancel: CancellationToken,
) -> TopicSyncEngine {
    let mut owner = inputs.borrow().subscriber.id.clone();
    loop {
        let current = inputs.borrow_and_update().clone();
        if current.subscriber.id != owner {
            if engine.take_retained_token().is_some() {
                debug!(previous = %owner, "subscriber changed; dropped retained token");
            }
            owner = current.subscriber.id.clone();
        }
        let event = match engine
            .reconcile(
                &current.subscriber,
                &current.communities,
                current.push_enabled,
            )
            .await
        {
            Ok(outcome) => SessionEvent::Reconciled(outcome),
            Err(e) => {
                warn!(error = %e, "reconciliation failed");
                SessionEvent::Failed {
                    message: e.to_string(),
                    transient: e.is_transient(),
                }
            }
        };
        // No observers is fine.
        let _ = events.send(event);

        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            changed = inputs.changed() => {
                if changed.is_err() {
                    debug!("session handle dropped");
                    break;
                }
            }
        }
    }

    debug!("sync session stopped");
    engine
}
