//! Device identity as supplied by the inventory.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A switch to configure during one orchestration pass.
///
/// Devices are read-only once handed out by an [`Inventory`](crate::Inventory).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Device {
    /// Host name or management address.
    pub host: String,
    /// Opaque reference to the credentials the transport should use.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials: Option<String>,
}

impl Device {
    /// Creates a device with no credentials reference.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            credentials: None,
        }
    }

    /// Attaches a credentials reference.
    pub fn with_credentials(mut self, credentials: impl Into<String>) -> Self {
        self.credentials = Some(credentials.into());
        self
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.host)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_new() {
        let device = Device::new("10.0.0.1");
        assert_eq!(device.host, "10.0.0.1");
        assert!(device.credentials.is_none());
        assert_eq!(device.to_string(), "10.0.0.1");
    }

    #[test]
    fn test_device_with_credentials() {
        let device = Device::new("sw-core-1").with_credentials("netops");
        assert_eq!(device.credentials.as_deref(), Some("netops"));
    }
}
