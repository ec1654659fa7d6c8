//! Input and output value types for the window calculator.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Raw session facts, constructed fresh from persisted state before every
/// query. The engine never mutates or retains these.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", default)]
pub struct SessionInputs {
    pub dose1_at: Option<DateTime<Utc>>,
    pub dose2_taken_at: Option<DateTime<Utc>>,
    pub dose2_skipped: bool,
    pub snooze_count: u8,
    /// Final wake-up marker for the extended (morning check-in) session.
    pub wake_final_at: Option<DateTime<Utc>>,
    pub check_in_completed: bool,
}

impl SessionInputs {
    /// Whether the second-dose cycle has been resolved one way or the other.
    pub fn dose2_resolved(&self) -> bool {
        self.dose2_taken_at.is_some() || self.dose2_skipped
    }
}

/// Where the session sits relative to the second-dose window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// No first dose recorded yet.
    NoDose1,
    /// First dose recorded, window not yet open.
    BeforeWindow,
    /// Window is open and not near its end.
    Active,
    /// Window is open but inside the trailing no-snooze band.
    NearClose,
    /// Window has closed with dose 2 neither taken nor skipped.
    Closed,
    /// Dose 2 taken or skipped; the cycle is resolved.
    Completed,
    /// Cycle resolved but the morning check-in is still outstanding.
    Finalizing,
}

/// What the primary (take-dose) button should offer right now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PrimaryAction {
    /// Window is open; taking now is legal.
    TakeNow,
    /// Window is about to close; show the countdown.
    TakeBeforeWindowEnds { remaining_secs: i64 },
    /// Window has not opened yet; show the countdown.
    WaitingUntilEarliest { remaining_secs: i64 },
    /// Window has closed but the session is not yet stale; a supervised
    /// late-log flow may still record the dose with an explicit override.
    TakeWithOverride,
    /// Taking is not legal; the reason is user-facing.
    Disabled { reason: String },
}

/// Legality of a secondary affordance (snooze, skip).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Availability {
    Enabled,
    Disabled { reason: String },
}

impl Availability {
    pub fn is_enabled(&self) -> bool {
        matches!(self, Availability::Enabled)
    }

    pub(crate) fn disabled(reason: impl Into<String>) -> Self {
        Availability::Disabled {
            reason: reason.into(),
        }
    }
}

/// Immutable snapshot of what the UI may legally offer at one instant.
///
/// Created and discarded on every query; callers persist the raw
/// [`SessionInputs`], never this derived value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Context {
    pub phase: Phase,
    pub primary_action: PrimaryAction,
    pub snooze_availability: Availability,
    pub skip_availability: Availability,
    /// Whole seconds since dose 1, if recorded. Negative when `dose1_at`
    /// lies in the future (clock skew); callers should treat that as zero.
    pub elapsed_secs: Option<i64>,
    /// Whole seconds until the window closes; zero once it has.
    pub remaining_to_max_secs: Option<i64>,
    /// Descriptive annotations, not exceptions. The caller decides UI
    /// treatment.
    pub errors: HashSet<DomainError>,
}
