//! Domain actions submitted to the remote service.
//!
//! Every user intent that must eventually reach the backend is expressed as a
//! `DoseAction`. The undo buffer stages them, the dispatcher forwards them,
//! and the offline queue replays them after a connectivity gap.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A dosing action destined for the remote service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DoseAction {
    /// Second dose was taken at the given instant.
    TakeDose { at: DateTime<Utc> },
    /// Second dose was deliberately skipped for this session.
    SkipDose { at: DateTime<Utc> },
    /// The reminder target was deferred by one snooze step.
    Snooze { at: DateTime<Utc> },
    /// A minor journal event ("bathroom", "water", ...), debounced by the
    /// rate limiter rather than the dose window.
    LogEvent { kind: String, at: DateTime<Utc> },
}

impl DoseAction {
    /// Short label for logging.
    pub fn label(&self) -> String {
        match self {
            DoseAction::TakeDose { .. } => "take_dose".to_string(),
            DoseAction::SkipDose { .. } => "skip_dose".to_string(),
            DoseAction::Snooze { .. } => "snooze".to_string(),
            DoseAction::LogEvent { kind, .. } => format!("log_event:{kind}"),
        }
    }
}
