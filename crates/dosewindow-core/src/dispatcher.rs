//! Action coordination: stage, commit, submit, park.
//!
//! Wires the undo buffer, rate limiter, gateway, and offline queue into the
//! one flow every caller needs: a user intent is staged for undo; once it
//! commits (superseded, lapsed, or swept by `tick`) it travels over a
//! channel to the submission loop; transport failures park it in the offline
//! queue for replay. Commit callbacks only send on the channel, so nothing
//! blocks inside the undo buffer's lock.

use std::sync::Arc;

use chrono::Duration;
use tokio::sync::mpsc;

use crate::action::DoseAction;
use crate::clock::Clock;
use crate::error::DomainError;
use crate::gateway::ActionGateway;
use crate::limiter::RateLimiter;
use crate::queue::{ConnectivityProbe, FlushSummary, OfflineQueue, QueueConfig};
use crate::undo::{UndoBuffer, UndoOutcome};

/// Outcome of one [`ActionDispatcher::drain_committed`] pass.
#[derive(Debug, Default)]
pub struct DispatchSummary {
    /// Actions that reached the remote service.
    pub submitted: usize,
    /// Actions parked in the offline queue for later replay.
    pub parked: usize,
    /// Remote rejections (already taken, window exceeded, ...). These are
    /// final; the caller decides how to present them.
    pub rejected: Vec<DomainError>,
}

/// Single entry point for user intents. UI-event handlers and background
/// reconnect callbacks share the same synchronized components underneath.
pub struct ActionDispatcher<G: ActionGateway> {
    clock: Arc<dyn Clock>,
    undo: UndoBuffer,
    queue: OfflineQueue,
    gateway: G,
    limiter: RateLimiter,
    probe: Arc<dyn ConnectivityProbe>,
    committed_tx: mpsc::UnboundedSender<DoseAction>,
    committed_rx: tokio::sync::Mutex<mpsc::UnboundedReceiver<DoseAction>>,
}

impl<G: ActionGateway> ActionDispatcher<G> {
    pub fn new(
        clock: Arc<dyn Clock>,
        gateway: G,
        probe: Arc<dyn ConnectivityProbe>,
        limiter: RateLimiter,
        queue_config: QueueConfig,
        undo_window: Duration,
    ) -> Self {
        let (committed_tx, committed_rx) = mpsc::unbounded_channel();
        let undo = UndoBuffer::new(clock.clone(), undo_window);
        {
            let tx = committed_tx.clone();
            undo.set_on_commit(move |action| {
                // Receiver dropped only when the dispatcher is gone.
                let _ = tx.send(action);
            });
        }
        let queue = OfflineQueue::new(clock.clone(), queue_config);
        Self {
            clock,
            undo,
            queue,
            gateway,
            limiter,
            probe,
            committed_tx,
            committed_rx: tokio::sync::Mutex::new(committed_rx),
        }
    }

    // ── Intents ──────────────────────────────────────────────────────

    /// Stage a dosing action for undo. Returns the undo grace period.
    pub fn stage(&self, action: DoseAction) -> Duration {
        self.undo.register(action)
    }

    /// Revert the most recently staged action, if still within its grace
    /// period.
    pub fn undo_last(&self) -> UndoOutcome {
        self.undo.undo()
    }

    /// Time left to undo the pending action.
    pub fn remaining_undo(&self) -> Duration {
        self.undo.remaining_time()
    }

    /// Lazily commit a lapsed pending action. Call on the UI refresh cadence.
    pub fn tick(&self) {
        self.undo.tick();
    }

    /// Record a minor journal event, debounced per kind. Returns false when
    /// the event was swallowed by its cooldown. Minor events bypass the undo
    /// buffer and go straight to the submission channel.
    pub fn log_event(&self, kind: &str) -> bool {
        let now = self.clock.now();
        if !self.limiter.should_allow(kind, now) {
            return false;
        }
        let _ = self.committed_tx.send(DoseAction::LogEvent {
            kind: kind.to_string(),
            at: now,
        });
        true
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    // ── Submission ───────────────────────────────────────────────────

    /// Drain committed actions to the remote service. Offline or
    /// transport-failed actions are parked in the offline queue; remote
    /// rejections are surfaced in the summary.
    pub async fn drain_committed(&self) -> DispatchSummary {
        self.tick();
        let mut rx = self.committed_rx.lock().await;
        let mut summary = DispatchSummary::default();
        while let Ok(action) = rx.try_recv() {
            if !self.probe.is_online() {
                self.queue.enqueue(action).await;
                summary.parked += 1;
                continue;
            }
            match self.gateway.submit(&action).await {
                Ok(()) => summary.submitted += 1,
                Err(DomainError::NetworkError(_)) | Err(DomainError::Offline) => {
                    tracing::debug!(action = %action.label(), "transport failure, parking action");
                    self.queue.enqueue(action).await;
                    summary.parked += 1;
                }
                Err(err) => {
                    tracing::warn!(action = %action.label(), error = %err, "remote rejected action");
                    summary.rejected.push(err);
                }
            }
        }
        summary
    }

    /// Replay the offline queue (e.g. from a reconnect callback).
    pub async fn flush_queue(&self) -> FlushSummary {
        self.queue.flush(self.probe.as_ref(), &self.gateway).await
    }

    /// Actions currently parked for replay.
    pub async fn parked(&self) -> Vec<DoseAction> {
        self.queue.pending().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use chrono::{TimeZone, Utc};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex as StdMutex;

    struct ToggleGateway {
        reachable: AtomicBool,
        submitted: StdMutex<Vec<String>>,
    }

    impl ToggleGateway {
        fn new(reachable: bool) -> Self {
            Self {
                reachable: AtomicBool::new(reachable),
                submitted: StdMutex::new(Vec::new()),
            }
        }

        fn submissions(&self) -> Vec<String> {
            self.submitted.lock().unwrap().clone()
        }
    }

    impl ActionGateway for ToggleGateway {
        async fn submit(&self, action: &DoseAction) -> Result<(), DomainError> {
            if !self.reachable.load(Ordering::SeqCst) {
                return Err(DomainError::NetworkError("unreachable".to_string()));
            }
            self.submitted.lock().unwrap().push(action.label());
            Ok(())
        }
    }

    struct Harness {
        clock: Arc<ManualClock>,
        online: Arc<AtomicBool>,
        dispatcher: ActionDispatcher<Arc<ToggleGateway>>,
        gateway: Arc<ToggleGateway>,
    }

    impl ActionGateway for Arc<ToggleGateway> {
        async fn submit(&self, action: &DoseAction) -> Result<(), DomainError> {
            self.as_ref().submit(action).await
        }
    }

    fn harness(reachable: bool) -> Harness {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2025, 6, 1, 22, 0, 0).unwrap(),
        ));
        let online = Arc::new(AtomicBool::new(reachable));
        let probe: Arc<dyn ConnectivityProbe> = {
            let online = online.clone();
            Arc::new(move || online.load(Ordering::SeqCst))
        };
        let gateway = Arc::new(ToggleGateway::new(reachable));
        let dispatcher = ActionDispatcher::new(
            clock.clone() as Arc<dyn Clock>,
            gateway.clone(),
            probe,
            RateLimiter::new().with_cooldown("bathroom", 120),
            QueueConfig {
                max_retries: 2,
                backoff_base_seconds: 0.0,
            },
            UndoBuffer::DEFAULT_WINDOW,
        );
        Harness {
            clock,
            online,
            dispatcher,
            gateway,
        }
    }

    fn take_action(clock: &ManualClock) -> DoseAction {
        DoseAction::TakeDose { at: clock.now() }
    }

    #[tokio::test]
    async fn undone_action_is_never_submitted() {
        let h = harness(true);
        h.dispatcher.stage(take_action(&h.clock));
        h.clock.advance(Duration::seconds(2));
        assert!(matches!(h.dispatcher.undo_last(), UndoOutcome::Undone(_)));

        let summary = h.dispatcher.drain_committed().await;
        assert_eq!(summary.submitted, 0);
        assert!(h.gateway.submissions().is_empty());
    }

    #[tokio::test]
    async fn lapsed_action_commits_and_reaches_gateway() {
        let h = harness(true);
        h.dispatcher.stage(take_action(&h.clock));
        h.clock.advance(Duration::seconds(6));

        let summary = h.dispatcher.drain_committed().await;
        assert_eq!(summary.submitted, 1);
        assert_eq!(h.gateway.submissions(), vec!["take_dose"]);
    }

    #[tokio::test]
    async fn superseded_action_commits_before_new_one() {
        let h = harness(true);
        h.dispatcher.stage(DoseAction::Snooze { at: h.clock.now() });
        h.clock.advance(Duration::seconds(1));
        h.dispatcher.stage(take_action(&h.clock));
        h.clock.advance(Duration::seconds(6));

        let summary = h.dispatcher.drain_committed().await;
        assert_eq!(summary.submitted, 2);
        assert_eq!(h.gateway.submissions(), vec!["snooze", "take_dose"]);
    }

    #[tokio::test]
    async fn offline_actions_are_parked_then_replayed() {
        let h = harness(false);
        h.dispatcher.stage(take_action(&h.clock));
        h.clock.advance(Duration::seconds(6));

        let summary = h.dispatcher.drain_committed().await;
        assert_eq!(summary.parked, 1);
        assert_eq!(h.dispatcher.parked().await.len(), 1);

        // Reconnect: the queue replays the parked action.
        h.online.store(true, Ordering::SeqCst);
        h.gateway.reachable.store(true, Ordering::SeqCst);
        let flush = h.dispatcher.flush_queue().await;
        assert_eq!(flush.executed, 1);
        assert_eq!(h.gateway.submissions(), vec!["take_dose"]);
        assert!(h.dispatcher.parked().await.is_empty());
    }

    #[tokio::test]
    async fn transport_failure_parks_instead_of_losing_the_action() {
        let h = harness(true);
        // Probe says online but the gateway cannot reach the host.
        h.gateway.reachable.store(false, Ordering::SeqCst);

        h.dispatcher.stage(take_action(&h.clock));
        h.clock.advance(Duration::seconds(6));

        let summary = h.dispatcher.drain_committed().await;
        assert_eq!(summary.submitted, 0);
        assert_eq!(summary.parked, 1);
        assert_eq!(h.dispatcher.parked().await.len(), 1);
    }

    #[tokio::test]
    async fn minor_events_are_debounced_per_kind() {
        let h = harness(true);
        assert!(h.dispatcher.log_event("bathroom"));
        assert!(!h.dispatcher.log_event("bathroom"));

        h.clock.advance(Duration::seconds(120));
        assert!(h.dispatcher.log_event("bathroom"));

        let summary = h.dispatcher.drain_committed().await;
        assert_eq!(summary.submitted, 2);
        assert_eq!(
            h.gateway.submissions(),
            vec!["log_event:bathroom", "log_event:bathroom"]
        );
    }
}
