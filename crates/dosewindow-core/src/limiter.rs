//! Per-event-kind cooldown tracking.
//!
//! Debounces rapid duplicate taps on frequent minor events ("bathroom",
//! "water") independently of the dose window. Each kind has its own cooldown
//! and its own last-fired timestamp; kinds with no configured cooldown are
//! always allowed.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};

/// Cooldown and fired-at state for one event kind.
#[derive(Debug)]
struct CooldownEntry {
    cooldown: Duration,
    last_fired: Mutex<Option<DateTime<Utc>>>,
}

/// Cooldown tracker. The lock is sharded per kind: calls for different
/// kinds never contend, while two near-simultaneous calls for the same kind
/// serialize on that kind's mutex so they cannot both observe "allowed"
/// before either registers. The kind table itself is fixed at configuration
/// time and read-only afterwards.
#[derive(Debug, Default)]
pub struct RateLimiter {
    kinds: HashMap<String, CooldownEntry>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style cooldown registration, in whole seconds.
    pub fn with_cooldown(mut self, kind: &str, seconds: i64) -> Self {
        self.kinds.insert(
            kind.to_string(),
            CooldownEntry {
                cooldown: Duration::seconds(seconds),
                last_fired: Mutex::new(None),
            },
        );
        self
    }

    /// Check-and-register in one step: returns true and records the firing
    /// iff the kind is off cooldown. Exactly-at-cooldown is allowed.
    pub fn should_allow(&self, kind: &str, now: DateTime<Utc>) -> bool {
        let Some(entry) = self.kinds.get(kind) else {
            return true;
        };
        let mut last = entry.last_fired.lock().unwrap();
        let allowed = match *last {
            Some(fired_at) => now - fired_at >= entry.cooldown,
            None => true,
        };
        if allowed {
            *last = Some(now);
        }
        allowed
    }

    /// Pure peek: would a call be allowed right now? Registers nothing.
    pub fn can_log(&self, kind: &str, now: DateTime<Utc>) -> bool {
        let Some(entry) = self.kinds.get(kind) else {
            return true;
        };
        match *entry.last_fired.lock().unwrap() {
            Some(fired_at) => now - fired_at >= entry.cooldown,
            None => true,
        }
    }

    /// Time left until the kind may fire again (zero when allowed).
    pub fn remaining_cooldown(&self, kind: &str, now: DateTime<Utc>) -> Duration {
        let Some(entry) = self.kinds.get(kind) else {
            return Duration::zero();
        };
        match *entry.last_fired.lock().unwrap() {
            Some(fired_at) => (fired_at + entry.cooldown - now).max(Duration::zero()),
            None => Duration::zero(),
        }
    }

    /// Record a firing without checking the cooldown.
    pub fn register(&self, kind: &str, now: DateTime<Utc>) {
        if let Some(entry) = self.kinds.get(kind) {
            *entry.last_fired.lock().unwrap() = Some(now);
        }
    }

    /// Clear the cooldown state for one kind.
    pub fn reset(&self, kind: &str) {
        if let Some(entry) = self.kinds.get(kind) {
            *entry.last_fired.lock().unwrap() = None;
        }
    }

    /// Clear all cooldown state.
    pub fn reset_all(&self) {
        for entry in self.kinds.values() {
            *entry.last_fired.lock().unwrap() = None;
        }
    }
}
