//! Unified error types for the reflow controller.
//!
//! Each subsystem owns a small error enum; [`ControllerError`] is the one
//! the control loop returns, and every other error converts into it so
//! `tick()` and the command handlers can use `?` uniformly.

use thiserror::Error;

use crate::sensors::SensorFault;

// ---------------------------------------------------------------------------
// Profile errors
// ---------------------------------------------------------------------------

/// Errors raised while building or querying a [`Profile`](crate::profile::Profile).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProfileError {
    /// A stage carries a negative or non-finite duration.
    #[error("invalid profile '{profile}': stage '{stage}' has duration {duration}")]
    InvalidProfile {
        profile: String,
        stage: String,
        duration: f64,
    },

    /// A run-time query was made before [`Profile::start`](crate::profile::Profile::start).
    #[error("profile has not been started")]
    NotStarted,
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Errors from [`ConfigPort`](crate::app::ports::ConfigPort) operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// No stored configuration exists.
    #[error("config not found")]
    NotFound,
    /// Stored configuration could not be parsed.
    #[error("config corrupted: {0}")]
    Corrupted(String),
    /// A field failed range validation.
    #[error("validation failed: {0}")]
    ValidationFailed(&'static str),
    /// The storage backend failed.
    #[error("I/O error: {0}")]
    Io(String),
}

// ---------------------------------------------------------------------------
// Controller errors
// ---------------------------------------------------------------------------

/// Every fatal condition the control loop can report.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ControllerError {
    /// `switch_to` was asked for a state that is not in the table.
    #[error("unknown state '{0}'")]
    UnknownState(String),
    /// A profile identifier is not present in the registry.
    #[error("unknown profile '{0}'")]
    UnknownProfile(String),
    /// The sensor reported a failure that could not be classified.
    #[error("unrecoverable sensor fault: {0}")]
    Sensor(SensorFault),
    #[error("profile: {0}")]
    Profile(#[from] ProfileError),
    #[error("config: {0}")]
    Config(#[from] ConfigError),
}

/// Controller-wide `Result` alias.
pub type Result<T> = core::result::Result<T, ControllerError>;
