//! Dose-window timing engine.
//!
//! Pure evaluation of the legal second-dose window. Callers persist
//! [`SessionInputs`], poll [`evaluate`] with the current instant, and render
//! the returned [`Context`]; the engine never schedules anything itself.

mod config;
mod context;
mod engine;

pub use config::DoseWindowConfig;
pub use context::{Availability, Context, Phase, PrimaryAction, SessionInputs};
pub use engine::{evaluate, should_auto_expire, snooze_availability};
