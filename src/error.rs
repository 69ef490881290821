//! Error handling for sweepgen
//!
//! Every error carries enough context to name the parameter or condition
//! that broke the contract, plus recovery suggestions for the caller.

use thiserror::Error;

/// Result type alias for sweepgen operations
pub type Result<T> = std::result::Result<T, SignalError>;

/// Main error type for sweepgen operations
#[derive(Error, Debug)]
pub enum SignalError {
    // Request Errors
    #[error("Invalid parameter '{param}': {reason}")]
    InvalidParameter { param: String, reason: String },

    #[error("Non-finite result for {what}: {value}")]
    NonFiniteResult { what: String, value: f64 },

    #[error("Unsupported MLS order: {order} (supported: 10..=18)")]
    UnsupportedOrder { order: u32 },

    // Buffer Errors
    #[error("Channel length mismatch: expected {expected} samples, got {actual}")]
    ChannelMismatch { expected: usize, actual: usize },

    // Container Errors
    #[error("Invalid container: {reason}")]
    InvalidContainer {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    // I/O Errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization Errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SignalError {
    /// Shorthand for an `InvalidParameter` error
    pub fn invalid(param: impl Into<String>, reason: impl Into<String>) -> Self {
        SignalError::InvalidParameter {
            param: param.into(),
            reason: reason.into(),
        }
    }

    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            SignalError::InvalidParameter { .. } => "INVALID_PARAMETER",
            SignalError::NonFiniteResult { .. } => "NON_FINITE_RESULT",
            SignalError::UnsupportedOrder { .. } => "UNSUPPORTED_ORDER",
            SignalError::ChannelMismatch { .. } => "CHANNEL_MISMATCH",
            SignalError::InvalidContainer { .. } => "INVALID_CONTAINER",
            SignalError::Io(_) => "IO_ERROR",
            SignalError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Check if the caller can recover by changing its input.
    ///
    /// Generation is deterministic, so nothing here is worth retrying as-is.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            SignalError::InvalidParameter { .. }
                | SignalError::NonFiniteResult { .. }
                | SignalError::UnsupportedOrder { .. }
                | SignalError::Serialization(_)
        )
    }

    /// Get recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            SignalError::InvalidParameter { .. } => vec![
                "Check that the start frequency is below the end frequency",
                "Durations and silences must be zero or positive",
                "Supported formats: 16-bit PCM, 24-bit PCM, 32-bit float",
            ],
            SignalError::NonFiniteResult { .. } => vec![
                "Reduce the duration, repetition count or sample rate",
                "Check for zero or negative frequencies",
            ],
            SignalError::UnsupportedOrder { .. } => {
                vec!["Choose an MLS order between 10 and 18"]
            }
            SignalError::InvalidContainer { .. } => vec![
                "The file is not a RIFF/WAVE container or is truncated",
                "Regenerate the file and try again",
            ],
            SignalError::Serialization(_) => vec![
                "Check the request JSON against `sweepgen-cli example-request`",
            ],
            _ => vec![],
        }
    }
}
