//! Offline action queue with bounded retry.
//!
//! Actions recorded while the network is unavailable are parked here and
//! replayed in submission order once connectivity returns. A failing action
//! is retried with exponential backoff up to `max_retries` and then dropped;
//! the drop is logged here because the queue intentionally keeps no
//! provenance for dropped tasks (the caller layer surfaces terminal
//! failures if it wants to).

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::action::DoseAction;
use crate::clock::Clock;
use crate::gateway::ActionGateway;

/// Connectivity probe consulted before a flush pass. Closures work:
/// `let probe = move || online.load(Ordering::SeqCst);`
pub trait ConnectivityProbe: Send + Sync {
    fn is_online(&self) -> bool;
}

impl<F> ConnectivityProbe for F
where
    F: Fn() -> bool + Send + Sync,
{
    fn is_online(&self) -> bool {
        self()
    }
}

/// Retry policy for queued actions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", default)]
pub struct QueueConfig {
    /// Retries after the initial attempt before a task is dropped.
    pub max_retries: u32,
    /// Base for the `base * 2^attempt` backoff delay.
    pub backoff_base_seconds: f64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_base_seconds: 0.5,
        }
    }
}

/// A parked action. Owned exclusively by the queue: created on enqueue,
/// attempt/next_retry_at updated on failed retries, removed on success or
/// after exhausting retries.
#[derive(Debug, Clone)]
pub struct QueuedAction {
    pub id: Uuid,
    pub action: DoseAction,
    pub attempt: u32,
    pub next_retry_at: DateTime<Utc>,
}

/// Outcome of one flush pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushSummary {
    /// Tasks that reached the remote service.
    pub executed: usize,
    /// Tasks dropped after exhausting retries.
    pub dropped: usize,
    /// Tasks still parked (only non-zero when the probe reported offline).
    pub remaining: usize,
}

/// FIFO queue of actions awaiting replay. The async mutex is held across an
/// entire flush pass, so concurrent `flush()` calls cannot execute a task
/// twice.
pub struct OfflineQueue {
    clock: Arc<dyn Clock>,
    config: QueueConfig,
    tasks: tokio::sync::Mutex<Vec<QueuedAction>>,
}

impl OfflineQueue {
    pub fn new(clock: Arc<dyn Clock>, config: QueueConfig) -> Self {
        Self {
            clock,
            config,
            tasks: tokio::sync::Mutex::new(Vec::new()),
        }
    }

    /// Park an action for later replay.
    pub async fn enqueue(&self, action: DoseAction) {
        let now = self.clock.now();
        self.tasks.lock().await.push(QueuedAction {
            id: Uuid::new_v4(),
            action,
            attempt: 0,
            next_retry_at: now,
        });
    }

    /// Actions currently parked, in replay order.
    pub async fn pending(&self) -> Vec<DoseAction> {
        self.tasks
            .lock()
            .await
            .iter()
            .map(|task| task.action.clone())
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.tasks.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.tasks.lock().await.is_empty()
    }

    /// Replay parked actions in FIFO order.
    ///
    /// Does nothing while the probe reports offline. Each task runs to
    /// success-or-drop within the pass; a permanently failing task does not
    /// block tasks enqueued after it.
    pub async fn flush<P, G>(&self, probe: &P, gateway: &G) -> FlushSummary
    where
        P: ConnectivityProbe + ?Sized,
        G: ActionGateway,
    {
        let mut tasks = self.tasks.lock().await;
        if !probe.is_online() {
            return FlushSummary {
                remaining: tasks.len(),
                ..Default::default()
            };
        }

        let mut summary = FlushSummary::default();
        for mut task in tasks.drain(..) {
            loop {
                match gateway.submit(&task.action).await {
                    Ok(()) => {
                        summary.executed += 1;
                        break;
                    }
                    Err(err) => {
                        task.attempt += 1;
                        if task.attempt > self.config.max_retries {
                            tracing::warn!(
                                id = %task.id,
                                action = %task.action.label(),
                                attempts = task.attempt,
                                error = %err,
                                "dropping queued action after exhausting retries"
                            );
                            summary.dropped += 1;
                            break;
                        }
                        let delay = self.backoff_delay(task.attempt);
                        task.next_retry_at = self.clock.now()
                            + chrono::Duration::milliseconds(delay.as_millis() as i64);
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }
        summary
    }

    fn backoff_delay(&self, attempt: u32) -> StdDuration {
        let secs = self.config.backoff_base_seconds * 2f64.powi(attempt.min(16) as i32);
        StdDuration::from_secs_f64(secs.max(0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::error::DomainError;
    use chrono::TimeZone;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex as StdMutex;

    /// Gateway that records submission order and fails forever for
    /// configured labels.
    #[derive(Default)]
    struct RecordingGateway {
        submitted: StdMutex<Vec<String>>,
        failing: HashSet<String>,
    }

    impl RecordingGateway {
        fn failing(labels: &[&str]) -> Self {
            Self {
                submitted: StdMutex::new(Vec::new()),
                failing: labels.iter().map(|l| l.to_string()).collect(),
            }
        }

        fn submissions(&self) -> Vec<String> {
            self.submitted.lock().unwrap().clone()
        }
    }

    impl ActionGateway for RecordingGateway {
        async fn submit(&self, action: &DoseAction) -> Result<(), DomainError> {
            let label = action.label();
            self.submitted.lock().unwrap().push(label.clone());
            if self.failing.contains(&label) {
                Err(DomainError::NetworkError("connection refused".to_string()))
            } else {
                Ok(())
            }
        }
    }

    fn queue() -> OfflineQueue {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2025, 6, 1, 22, 0, 0).unwrap(),
        ));
        let config = QueueConfig {
            max_retries: 3,
            backoff_base_seconds: 0.0,
        };
        OfflineQueue::new(clock, config)
    }

    fn event(kind: &str) -> DoseAction {
        DoseAction::LogEvent {
            kind: kind.to_string(),
            at: Utc.with_ymd_and_hms(2025, 6, 1, 22, 0, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn flush_does_nothing_while_offline() {
        let queue = queue();
        let gateway = RecordingGateway::default();

        for kind in ["a", "b", "c"] {
            queue.enqueue(event(kind)).await;
        }

        let summary = queue.flush(&|| false, &gateway).await;
        assert_eq!(summary.executed, 0);
        assert_eq!(summary.remaining, 3);
        assert_eq!(queue.len().await, 3);
        assert!(gateway.submissions().is_empty());
    }

    #[tokio::test]
    async fn flush_replays_in_enqueue_order_once_online() {
        let queue = queue();
        let gateway = RecordingGateway::default();
        let online = Arc::new(AtomicBool::new(false));
        let probe = {
            let online = online.clone();
            move || online.load(Ordering::SeqCst)
        };

        for kind in ["a", "b", "c"] {
            queue.enqueue(event(kind)).await;
        }

        queue.flush(&probe, &gateway).await;
        assert_eq!(queue.len().await, 3);

        online.store(true, Ordering::SeqCst);
        let summary = queue.flush(&probe, &gateway).await;
        assert_eq!(summary.executed, 3);
        assert!(queue.is_empty().await);
        assert_eq!(
            gateway.submissions(),
            vec!["log_event:a", "log_event:b", "log_event:c"]
        );
    }

    #[tokio::test]
    async fn failing_task_is_retried_then_dropped_without_blocking_later_tasks() {
        let queue = queue();
        let gateway = RecordingGateway::failing(&["log_event:b"]);

        for kind in ["a", "b", "c"] {
            queue.enqueue(event(kind)).await;
        }

        let summary = queue.flush(&|| true, &gateway).await;
        assert_eq!(summary.executed, 2);
        assert_eq!(summary.dropped, 1);
        assert!(queue.is_empty().await);

        let submissions = gateway.submissions();
        // Initial attempt plus max_retries for b, then c still ran.
        assert_eq!(
            submissions,
            vec![
                "log_event:a",
                "log_event:b",
                "log_event:b",
                "log_event:b",
                "log_event:b",
                "log_event:c"
            ]
        );
    }

    #[tokio::test]
    async fn concurrent_flushes_never_execute_a_task_twice() {
        let queue = queue();
        let gateway = RecordingGateway::default();

        for kind in ["a", "b", "c"] {
            queue.enqueue(event(kind)).await;
        }

        let probe = || true;
        let (first, second) = tokio::join!(
            queue.flush(&probe, &gateway),
            queue.flush(&probe, &gateway)
        );
        assert_eq!(first.executed + second.executed, 3);
        assert_eq!(gateway.submissions().len(), 3);
    }

    #[tokio::test]
    async fn pending_preserves_order() {
        let queue = queue();
        queue.enqueue(event("a")).await;
        queue.enqueue(event("b")).await;

        let pending = queue.pending().await;
        assert_eq!(pending.len(), 2);
        assert_eq!(pending[0].label(), "log_event:a");
        assert_eq!(pending[1].label(), "log_event:b");
    }
}
