//! Error types for the bosun CLI.
//!
//! Uses thiserror for derive macros and provides user-actionable error
//! messages. Only configuration-class errors terminate the process; transient
//! store failures and malformed records are absorbed with a warning at the
//! component that detects them.

use crate::exit_codes;
use thiserror::Error;

/// Main error type for bosun operations.
///
/// Each variant maps to a specific exit code. `UserError` is reserved for
/// invalid-state failures that are neither configuration nor record-store
/// problems.
#[derive(Error, Debug)]
#[allow(dead_code)]
pub enum BosunError {
    /// User provided invalid arguments or the system is in an invalid state.
    #[error("{0}")]
    UserError(String),

    /// Configuration or environment failure: the process cannot do any
    /// meaningful work and exits before starting.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// An issue record could not be read or written back.
    #[error("Record store error: {0}")]
    RecordError(String),

    /// An internal invariant was violated.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl BosunError {
    /// Returns the appropriate exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            BosunError::UserError(_) => exit_codes::USER_ERROR,
            BosunError::ConfigError(_) => exit_codes::CONFIG_FAILURE,
            BosunError::RecordError(_) => exit_codes::RECORD_FAILURE,
            BosunError::Internal(_) => exit_codes::INTERNAL_FAILURE,
        }
    }
}

/// Result type alias for bosun operations.
pub type Result<T> = std::result::Result<T, BosunError>;
