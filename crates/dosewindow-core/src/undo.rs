//! Single-slot, time-boxed undo staging.
//!
//! A just-committed action can be reverted within a short grace period.
//! There is no background timer: expiry is evaluated lazily whenever the
//! buffer is touched, and the UI drives countdowns by polling
//! [`UndoBuffer::remaining_time`] and calling [`UndoBuffer::tick`].

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};

use crate::action::DoseAction;
use crate::clock::Clock;

/// Notification sink for committed/undone actions. Must not block; if
/// cross-thread delivery is needed, send over a channel instead of doing the
/// work inline.
pub type ActionHook = Arc<dyn Fn(DoseAction) + Send + Sync>;

/// The one action currently eligible for undo.
#[derive(Debug, Clone)]
pub struct PendingUndo {
    pub action: DoseAction,
    pub staged_at: DateTime<Utc>,
}

/// Result of an undo attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UndoOutcome {
    /// The pending action was reverted in time.
    Undone(DoseAction),
    /// The grace period had already lapsed; the action is committed.
    Expired,
    /// Nothing was pending.
    NoAction,
}

/// Holds at most one pending action behind a mutex (single-writer
/// discipline). Callbacks fire outside the lock.
pub struct UndoBuffer {
    clock: Arc<dyn Clock>,
    window: Duration,
    slot: Mutex<Option<PendingUndo>>,
    on_commit: Mutex<Option<ActionHook>>,
    on_undo: Mutex<Option<ActionHook>>,
}

impl UndoBuffer {
    /// Default undo grace period.
    pub const DEFAULT_WINDOW: Duration = Duration::seconds(5);

    pub fn new(clock: Arc<dyn Clock>, window: Duration) -> Self {
        Self {
            clock,
            window,
            slot: Mutex::new(None),
            on_commit: Mutex::new(None),
            on_undo: Mutex::new(None),
        }
    }

    /// Fired when a pending action becomes irreversible, either because it
    /// was superseded or because its grace period lapsed.
    pub fn set_on_commit(&self, hook: impl Fn(DoseAction) + Send + Sync + 'static) {
        *self.on_commit.lock().unwrap() = Some(Arc::new(hook));
    }

    /// Fired when a pending action is successfully reverted.
    pub fn set_on_undo(&self, hook: impl Fn(DoseAction) + Send + Sync + 'static) {
        *self.on_undo.lock().unwrap() = Some(Arc::new(hook));
    }

    /// Stage a new action, immediately committing any prior pending one.
    /// Returns the full grace period available for undoing it.
    pub fn register(&self, action: DoseAction) -> Duration {
        let staged_at = self.clock.now();
        let superseded = self.slot.lock().unwrap().replace(PendingUndo {
            action,
            staged_at,
        });
        if let Some(prior) = superseded {
            self.fire_commit(prior.action);
        }
        self.window
    }

    /// Attempt to revert the pending action. Succeeds only strictly within
    /// the grace period; a lapsed action is committed and reported as
    /// `Expired`.
    pub fn undo(&self) -> UndoOutcome {
        let now = self.clock.now();
        let taken = self.slot.lock().unwrap().take();
        match taken {
            None => UndoOutcome::NoAction,
            Some(pending) if now - pending.staged_at < self.window => {
                self.fire_undo(pending.action.clone());
                UndoOutcome::Undone(pending.action)
            }
            Some(pending) => {
                self.fire_commit(pending.action);
                UndoOutcome::Expired
            }
        }
    }

    /// Commit the pending action if its grace period has lapsed. Callers
    /// polling for a countdown should invoke this on the same cadence so a
    /// lapsed action does not linger unstaged forever.
    pub fn tick(&self) {
        let now = self.clock.now();
        let lapsed = {
            let mut slot = self.slot.lock().unwrap();
            match &*slot {
                Some(pending) if now - pending.staged_at >= self.window => slot.take(),
                _ => None,
            }
        };
        if let Some(pending) = lapsed {
            self.fire_commit(pending.action);
        }
    }

    /// Time left to undo the pending action; zero when nothing is pending or
    /// the grace period has lapsed. Read-only.
    pub fn remaining_time(&self) -> Duration {
        let now = self.clock.now();
        match &*self.slot.lock().unwrap() {
            Some(pending) => (pending.staged_at + self.window - now).max(Duration::zero()),
            None => Duration::zero(),
        }
    }

    fn fire_commit(&self, action: DoseAction) {
        let hook = self.on_commit.lock().unwrap().clone();
        if let Some(hook) = hook {
            hook(action);
        }
    }

    fn fire_undo(&self, action: DoseAction) {
        let hook = self.on_undo.lock().unwrap().clone();
        if let Some(hook) = hook {
            hook(action);
        }
    }
}
