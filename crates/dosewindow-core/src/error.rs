//! Error types for dosewindow-core.
//!
//! `DomainError` is the closed set shared by the window calculator (as
//! descriptive annotations on a `Context`) and the remote gateway (as mapped
//! transport/HTTP failures). Nothing in this crate panics for an
//! invalid-but-representable state; dosing safety degrades to the most
//! conservative `Context` instead.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Closed domain error set.
#[derive(Error, Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum DomainError {
    /// No first dose has been recorded for the session.
    #[error("first dose has not been recorded")]
    Dose1Required,

    /// The legal window for the second dose has closed.
    #[error("the dosing window has closed")]
    WindowExceeded,

    /// The snooze allowance for this session is used up.
    #[error("snooze limit reached")]
    SnoozeLimit,

    /// The remote service already holds a second-dose record (HTTP 409).
    #[error("second dose already recorded remotely")]
    AlreadyTaken,

    /// The device token was rejected (HTTP 401).
    #[error("device is not registered")]
    DeviceNotRegistered,

    /// The remote service throttled the request (HTTP 429).
    #[error("rate limited by the remote service")]
    RateLimit,

    /// No connectivity; the action should be queued for later replay.
    #[error("device is offline")]
    Offline,

    /// The response shape made no sense for the request (e.g. a redirect).
    #[error("unexpected response from the remote service")]
    InvalidResponse,

    /// The response body could not be read or decoded.
    #[error("failed to decode response: {0}")]
    Decoding(String),

    /// Transport-level failure (DNS, refused connection, timeout).
    #[error("network error: {0}")]
    NetworkError(String),

    /// Anything else; the detail carries the raw status for diagnosis.
    #[error("unexpected error: {0}")]
    Unknown(String),
}

/// Configuration validation errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

/// Result type alias for DomainError
pub type Result<T, E = DomainError> = std::result::Result<T, E>;
