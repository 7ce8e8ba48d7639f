//! Transport collaborator traits.
//!
//! The engine never establishes sessions itself. A [`Transport`] opens one
//! [`Session`] per device, and the session carries show commands, config sets
//! and the save command. Implementations own authentication, channel handling
//! and prompt detection.
//!
//! # Example
//!
//! ```ignore
//! use snoop_common::{Device, Transport};
//!
//! async fn hostname(transport: &dyn Transport, device: &Device) -> String {
//!     let mut session = transport.connect(device).await?;
//!     session.enable().await?;
//!     session.find_prompt().await?
//! }
//! ```

use async_trait::async_trait;

use crate::device::Device;
use crate::error::TransportError;

/// Opens sessions to devices.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Connects to a device and returns an authenticated session.
    async fn connect(&self, device: &Device) -> Result<Box<dyn Session>, TransportError>;
}

/// An open command session on one device.
#[async_trait]
pub trait Session: Send {
    /// Sends an exec-mode command and returns its output.
    async fn send_command(&mut self, command: &str) -> Result<String, TransportError>;

    /// Enters configuration mode, sends each line in order, exits, and
    /// returns the echoed session text.
    async fn send_config_set(&mut self, commands: &[String]) -> Result<String, TransportError>;

    /// Escalates to privileged exec mode.
    async fn enable(&mut self) -> Result<(), TransportError> {
        Ok(())
    }

    /// Returns the current CLI prompt (e.g. `sw-core-1#`).
    async fn find_prompt(&mut self) -> Result<String, TransportError>;

    /// Closes the session.
    async fn disconnect(&mut self) -> Result<(), TransportError> {
        Ok(())
    }
}

/// Strips the privilege marker from a prompt to get the device hostname.
///
/// Returns `None` when nothing is left.
pub fn hostname_from_prompt(prompt: &str) -> Option<String> {
    let name = prompt.trim().trim_end_matches(['#', '>']).trim();
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}
