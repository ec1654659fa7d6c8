//! Dose-window configuration.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Timing parameters for the second-dose window, in whole minutes.
///
/// The defaults encode the legal window: dose 2 may be taken between 150 and
/// 240 minutes after dose 1, with a 165-minute display target and a 15-minute
/// near-close band during which snoozing is no longer allowed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", default)]
pub struct DoseWindowConfig {
    /// Earliest legal second-dose offset from dose 1.
    pub min_interval_minutes: u32,
    /// Latest legal second-dose offset from dose 1 (window closes here).
    pub max_interval_minutes: u32,
    /// Initial reminder target, before any snoozes.
    pub default_target_minutes: u32,
    /// Width of the trailing near-close band.
    pub near_window_threshold_minutes: u32,
    /// How far one snooze shifts the reminder target.
    pub snooze_step_minutes: u32,
    /// Maximum snoozes per session.
    pub max_snoozes: u8,
    /// Slack after the window closes before a background sweep may treat the
    /// session as stale (user likely slept through).
    pub auto_expire_grace_minutes: u32,
}

impl Default for DoseWindowConfig {
    fn default() -> Self {
        Self {
            min_interval_minutes: 150,
            max_interval_minutes: 240,
            default_target_minutes: 165,
            near_window_threshold_minutes: 15,
            snooze_step_minutes: 10,
            max_snoozes: 3,
            auto_expire_grace_minutes: 30,
        }
    }
}

impl DoseWindowConfig {
    /// Check the structural invariants:
    /// `0 < min < default_target < max` and `near_threshold < max - min`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_interval_minutes == 0 {
            return Err(ConfigError::InvalidValue {
                key: "min_interval_minutes".to_string(),
                message: "must be positive".to_string(),
            });
        }
        if self.default_target_minutes <= self.min_interval_minutes {
            return Err(ConfigError::InvalidValue {
                key: "default_target_minutes".to_string(),
                message: format!(
                    "must be greater than min_interval_minutes ({})",
                    self.min_interval_minutes
                ),
            });
        }
        if self.max_interval_minutes <= self.default_target_minutes {
            return Err(ConfigError::InvalidValue {
                key: "max_interval_minutes".to_string(),
                message: format!(
                    "must be greater than default_target_minutes ({})",
                    self.default_target_minutes
                ),
            });
        }
        if self.near_window_threshold_minutes
            >= self.max_interval_minutes - self.min_interval_minutes
        {
            return Err(ConfigError::InvalidValue {
                key: "near_window_threshold_minutes".to_string(),
                message: format!(
                    "must be smaller than the window span ({} minutes)",
                    self.max_interval_minutes - self.min_interval_minutes
                ),
            });
        }
        Ok(())
    }

    // ── Derived offsets in whole seconds ─────────────────────────────

    pub(crate) fn min_secs(&self) -> i64 {
        self.min_interval_minutes as i64 * 60
    }

    pub(crate) fn max_secs(&self) -> i64 {
        self.max_interval_minutes as i64 * 60
    }

    pub(crate) fn near_close_secs(&self) -> i64 {
        self.max_secs() - self.near_window_threshold_minutes as i64 * 60
    }

    pub(crate) fn auto_expire_secs(&self) -> i64 {
        self.max_secs() + self.auto_expire_grace_minutes as i64 * 60
    }
}
