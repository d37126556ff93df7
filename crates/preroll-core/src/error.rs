//! Error types for Preroll Core

use thiserror::Error;

/// Result type alias for controller operations
pub type Result<T> = std::result::Result<T, Error>;

/// Controller error types
#[derive(Error, Debug)]
pub enum Error {
    // Gate errors
    #[error("Skip not permitted yet: {remaining_seconds}s of mandatory view remaining")]
    GateClosed { remaining_seconds: u32 },

    // Lifecycle errors
    #[error("Controller is not mounted")]
    NotMounted,

    #[error("Controller was already mounted")]
    AlreadyMounted,

    #[error("Mandatory-view timer already started")]
    TimerAlreadyStarted,

    // Playback errors
    #[error("Invalid playback phase transition: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },

    // Configuration errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to parse configuration: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Returns true if the host can retry the operation later
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::GateClosed { .. })
    }

    /// Returns a stable error code for host-side logging
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::GateClosed { .. } => "GATE_CLOSED",
            Error::NotMounted => "NOT_MOUNTED",
            Error::AlreadyMounted => "ALREADY_MOUNTED",
            Error::TimerAlreadyStarted => "TIMER_STARTED",
            Error::InvalidStateTransition { .. } => "INVALID_STATE",
            Error::InvalidConfig(_) => "INVALID_CONFIG",
            Error::Json(_) => "CONFIG_PARSE",
            Error::Io(_) => "IO",
        }
    }
}
