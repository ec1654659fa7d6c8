//! Window calculator.
//!
//! `evaluate()` is a pure function of (now, inputs, config). It holds no
//! state, performs no I/O, and is safe to call concurrently from any thread.
//! The UI queries it once per second with the injected clock and the latest
//! persisted session inputs.
//!
//! All comparisons operate on whole real-time seconds derived from absolute
//! instants, never on calendar arithmetic, so a DST jump or timezone change
//! moves the displayed local time but not the elapsed seconds since dose 1.
//!
//! ## Boundary policy
//!
//! - `elapsed == min_interval` -- window is open (`Active`).
//! - `elapsed == max_interval - near_threshold` -- `NearClose`.
//! - `elapsed == max_interval` -- `Closed`.

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use super::config::DoseWindowConfig;
use super::context::{Availability, Context, Phase, PrimaryAction, SessionInputs};
use crate::error::DomainError;

/// Compute the current [`Context`] for one session at one instant.
pub fn evaluate(now: DateTime<Utc>, inputs: &SessionInputs, config: &DoseWindowConfig) -> Context {
    // A resolved dose-2 cycle wins over every elapsed-time phase, even for
    // odd inputs like a dose2_taken_at in the future. Safety degrades to the
    // most conservative state rather than erroring.
    if inputs.dose2_resolved() {
        let phase = if inputs.wake_final_at.is_some() && !inputs.check_in_completed {
            Phase::Finalizing
        } else {
            Phase::Completed
        };
        return Context {
            phase,
            primary_action: PrimaryAction::Disabled {
                reason: "Completed".to_string(),
            },
            snooze_availability: Availability::disabled("Completed"),
            skip_availability: Availability::disabled("Completed"),
            elapsed_secs: inputs.dose1_at.map(|d1| (now - d1).num_seconds()),
            remaining_to_max_secs: None,
            errors: HashSet::new(),
        };
    }

    let Some(dose1_at) = inputs.dose1_at else {
        let mut errors = HashSet::new();
        errors.insert(DomainError::Dose1Required);
        return Context {
            phase: Phase::NoDose1,
            primary_action: PrimaryAction::Disabled {
                reason: "First dose not recorded".to_string(),
            },
            snooze_availability: Availability::disabled("First dose not recorded"),
            skip_availability: Availability::disabled("First dose not recorded"),
            elapsed_secs: None,
            remaining_to_max_secs: None,
            errors,
        };
    };

    let elapsed = (now - dose1_at).num_seconds();
    let remaining_to_max = (config.max_secs() - elapsed).max(0);
    let mut errors = HashSet::new();

    let (phase, primary_action, snooze_availability) = if elapsed < config.min_secs() {
        (
            Phase::BeforeWindow,
            PrimaryAction::WaitingUntilEarliest {
                remaining_secs: config.min_secs() - elapsed,
            },
            Availability::disabled("Window not open yet"),
        )
    } else if elapsed < config.near_close_secs() {
        (
            Phase::Active,
            PrimaryAction::TakeNow,
            snooze_availability(elapsed, inputs.snooze_count, config),
        )
    } else if elapsed < config.max_secs() {
        let remaining_min = (remaining_to_max + 59) / 60;
        (
            Phase::NearClose,
            PrimaryAction::TakeBeforeWindowEnds {
                remaining_secs: remaining_to_max,
            },
            Availability::disabled(format!("Window closes in {remaining_min} min")),
        )
    } else {
        errors.insert(DomainError::WindowExceeded);
        let primary = if elapsed < config.auto_expire_secs() {
            PrimaryAction::TakeWithOverride
        } else {
            PrimaryAction::Disabled {
                reason: "Window closed".to_string(),
            }
        };
        (
            Phase::Closed,
            primary,
            Availability::disabled("Window closed"),
        )
    };

    Context {
        phase,
        primary_action,
        snooze_availability,
        // Skipping dose 2 stays legal until the cycle resolves.
        skip_availability: Availability::Enabled,
        elapsed_secs: Some(elapsed),
        remaining_to_max_secs: Some(remaining_to_max),
        errors,
    }
}

/// Whether a snooze request would be legal right now.
///
/// Rejected when the window end is closer than the near-close threshold,
/// when the snooze allowance is used up, or when the shifted reminder target
/// would land past the window end.
pub fn snooze_availability(
    elapsed_secs: i64,
    snooze_count: u8,
    config: &DoseWindowConfig,
) -> Availability {
    let remaining = config.max_secs() - elapsed_secs;
    if remaining < config.near_window_threshold_minutes as i64 * 60 {
        let remaining_min = (remaining.max(0) + 59) / 60;
        return Availability::disabled(format!("Window closes in {remaining_min} min"));
    }
    if snooze_count >= config.max_snoozes {
        return Availability::disabled("Snooze limit reached");
    }
    let shifted_target = config.default_target_minutes as i64
        + (snooze_count as i64 + 1) * config.snooze_step_minutes as i64;
    if shifted_target > config.max_interval_minutes as i64 {
        return Availability::disabled("Next snooze would pass the window end");
    }
    Availability::Enabled
}

/// Whether a background sweep should treat the session as stale: dose 1
/// exists, dose 2 was neither taken nor skipped, and the window closed more
/// than the grace period ago (user likely slept through).
pub fn should_auto_expire(
    now: DateTime<Utc>,
    inputs: &SessionInputs,
    config: &DoseWindowConfig,
) -> bool {
    match inputs.dose1_at {
        Some(dose1_at) if !inputs.dose2_resolved() => {
            (now - dose1_at).num_seconds() >= config.auto_expire_secs()
        }
        _ => false,
    }
}
