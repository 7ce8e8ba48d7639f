//! Error types for snooping configuration passes.
//!
//! The taxonomy follows the per-device failure model: transport and
//! malformed-input errors are fatal to the device being processed, batch
//! errors are recorded and processing continues, and nothing here is ever
//! fatal to the fleet. All errors implement `std::error::Error` via
//! `thiserror`.

use std::io;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for snooping operations.
pub type SnoopResult<T> = Result<T, SnoopError>;

/// Failure reported by a transport collaborator (connect, send, save).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{operation} failed: {cause}")]
pub struct TransportError {
    /// The transport operation that failed (e.g. "connect", "send_config_set").
    pub operation: String,
    /// Human-readable cause from the underlying session.
    pub cause: String,
}

impl TransportError {
    /// Creates a transport error for an operation.
    pub fn new(operation: impl Into<String>, cause: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            cause: cause.into(),
        }
    }

    /// Creates a connect failure.
    pub fn connect(cause: impl Into<String>) -> Self {
        Self::new("connect", cause)
    }
}

/// Errors that can occur while configuring a device.
#[derive(Debug, Error)]
pub enum SnoopError {
    /// Connect or send failure on the device session.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Interface status text too short to contain the table header.
    #[error("Malformed interface status: expected at least 2 lines, got {lines}")]
    MalformedInput {
        /// Number of lines actually received.
        lines: usize,
    },

    /// A single configuration batch could not be sent.
    #[error("Batch for {scope} failed: {source}")]
    BatchApply {
        /// The batch scope (interface name or "global").
        scope: String,
        /// The underlying transport error.
        #[source]
        source: TransportError,
    },

    /// The device pass exceeded its time budget.
    #[error("Device pass timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    /// Configuration validation error.
    #[error("Invalid configuration for {field}: {message}")]
    InvalidConfig {
        /// The field that failed validation.
        field: String,
        /// Error message.
        message: String,
    },

    /// The inventory could not be read.
    #[error("Inventory error: {message}")]
    Inventory {
        /// Error message.
        message: String,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl SnoopError {
    /// Creates a malformed input error.
    pub fn malformed_input(lines: usize) -> Self {
        Self::MalformedInput { lines }
    }

    /// Creates a batch apply error.
    pub fn batch_apply(scope: impl Into<String>, source: TransportError) -> Self {
        Self::BatchApply {
            scope: scope.into(),
            source,
        }
    }

    /// Creates an invalid configuration error.
    pub fn invalid_config(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Creates an inventory error.
    pub fn inventory(message: impl Into<String>) -> Self {
        Self::Inventory {
            message: message.into(),
        }
    }

    /// Returns true if this error ends the current device's pass.
    ///
    /// Batch failures are recorded and the pass continues.
    pub fn is_device_fatal(&self) -> bool {
        matches!(
            self,
            SnoopError::Transport(_) | SnoopError::MalformedInput { .. } | SnoopError::Timeout(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SnoopError::malformed_input(1);
        assert_eq!(
            err.to_string(),
            "Malformed interface status: expected at least 2 lines, got 1"
        );
    }

    #[test]
    fn test_transport_error_display() {
        let err = SnoopError::from(TransportError::connect("Connection refused"));
        assert_eq!(
            err.to_string(),
            "Transport error: connect failed: Connection refused"
        );
    }

    #[test]
    fn test_batch_apply_error() {
        let err = SnoopError::batch_apply(
            "Gi1/0/2",
            TransportError::new("send_config_set", "channel closed"),
        );
        assert!(err.to_string().contains("Gi1/0/2"));
        assert!(err.to_string().contains("channel closed"));
    }

    #[test]
    fn test_timeout_display() {
        let err = SnoopError::Timeout(Duration::from_secs(30));
        assert_eq!(err.to_string(), "Device pass timed out after 30s");
    }

    #[test]
    fn test_is_device_fatal() {
        assert!(SnoopError::malformed_input(0).is_device_fatal());
        assert!(SnoopError::from(TransportError::connect("refused")).is_device_fatal());
        assert!(SnoopError::Timeout(Duration::from_secs(1)).is_device_fatal());
        assert!(!SnoopError::batch_apply("global", TransportError::connect("x")).is_device_fatal());
        assert!(!SnoopError::invalid_config("vlans", "empty").is_device_fatal());
    }
}
