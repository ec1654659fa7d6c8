//! # Dosewindow Core Library
//!
//! Core business logic for the Dosewindow medication-timing companion.
//! The safety-critical center is the dose-window timing engine: given a
//! first-dose timestamp it tracks the legal window for the second dose and
//! computes which affordances (take/snooze/skip) are legal at any instant.
//! Around it sits an offline-resilient action layer so dosing actions
//! recorded without connectivity are neither lost nor duplicated.
//!
//! ## Architecture
//!
//! - **Window calculator**: a pure function of (now, session inputs, config);
//!   callers poll it on a refresh cycle with an injected clock
//! - **Rate limiter**: per-kind cooldowns for frequent minor events
//! - **Undo buffer**: single-slot, time-boxed staging with commit/undo hooks
//! - **Offline queue**: FIFO replay with bounded exponential-backoff retry
//! - **Gateway**: HTTP submission with a total status-to-error mapping
//! - **Dispatcher**: the stage -> commit -> submit -> park flow, wired once
//!
//! UI rendering, persistence, and notification scheduling are collaborators:
//! they persist [`SessionInputs`], poll [`evaluate`], and forward intents.

pub mod action;
pub mod clock;
pub mod dispatcher;
pub mod error;
pub mod gateway;
pub mod limiter;
pub mod queue;
pub mod undo;
pub mod window;

pub use action::DoseAction;
pub use clock::{Clock, ManualClock, SystemClock};
pub use dispatcher::{ActionDispatcher, DispatchSummary};
pub use error::{ConfigError, DomainError};
pub use gateway::{map_response, ActionGateway, RemoteActionGateway};
pub use limiter::RateLimiter;
pub use queue::{ConnectivityProbe, FlushSummary, OfflineQueue, QueueConfig, QueuedAction};
pub use undo::{PendingUndo, UndoBuffer, UndoOutcome};
pub use window::{
    evaluate, should_auto_expire, snooze_availability, Availability, Context, DoseWindowConfig,
    Phase, PrimaryAction, SessionInputs,
};
