//! Verification helpers for testing device passes
//!
//! Checks what a [`MockTransport`] actually received.

use thiserror::Error;

use crate::mock_transport::{CallKind, MockTransport};

/// Verification error types
#[derive(Error, Debug, PartialEq, Eq)]
pub enum VerificationError {
    #[error("Expected config sets {expected:?} on {host}, got {actual:?}")]
    ConfigOrderMismatch {
        host: String,
        expected: Vec<String>,
        actual: Vec<String>,
    },

    #[error("Expected save command '{command}' after the last config set on {host}")]
    NotSaved { host: String, command: String },

    #[error("Expected no session traffic on {host}, found {calls} calls")]
    UnexpectedTraffic { host: String, calls: usize },
}

/// Result type for verification operations
pub type VerifyResult<T> = Result<T, VerificationError>;

/// Transcript verification helper
pub struct TranscriptVerifier<'a> {
    transport: &'a MockTransport,
}

impl<'a> TranscriptVerifier<'a> {
    /// Create a new transcript verifier
    pub fn new(transport: &'a MockTransport) -> Self {
        Self { transport }
    }

    /// Verify the first line of every config set sent to `host`, in order
    pub fn assert_config_order(&self, host: &str, expected: &[&str]) -> VerifyResult<()> {
        let actual: Vec<String> = self
            .transport
            .config_sets_for(host)
            .into_iter()
            .map(|set| set.first().cloned().unwrap_or_default())
            .collect();

        if actual != expected {
            return Err(VerificationError::ConfigOrderMismatch {
                host: host.to_string(),
                expected: expected.iter().map(|s| s.to_string()).collect(),
                actual,
            });
        }
        Ok(())
    }

    /// Verify `command` was sent after the last config set on `host`
    pub fn assert_saved(&self, host: &str, command: &str) -> VerifyResult<()> {
        let calls = self.transport.calls_for(host);
        let last_config = calls
            .iter()
            .rposition(|c| matches!(c, CallKind::ConfigSet(_)));
        let save = calls
            .iter()
            .rposition(|c| matches!(c, CallKind::Command(cmd) if cmd == command));

        match (last_config, save) {
            (Some(cfg), Some(save)) if save > cfg => Ok(()),
            (None, Some(_)) => Ok(()),
            _ => Err(VerificationError::NotSaved {
                host: host.to_string(),
                command: command.to_string(),
            }),
        }
    }

    /// Verify nothing beyond the connect attempt reached `host`
    pub fn assert_no_session(&self, host: &str) -> VerifyResult<()> {
        let calls = self
            .transport
            .calls_for(host)
            .into_iter()
            .filter(|c| *c != CallKind::Connect)
            .count();
        if calls > 0 {
            return Err(VerificationError::UnexpectedTraffic {
                host: host.to_string(),
                calls,
            });
        }
        Ok(())
    }
}
