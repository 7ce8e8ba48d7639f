//! Inventory collaborator: the ordered list of devices to configure.

use std::fs;
use std::path::{Path, PathBuf};

use crate::device::Device;
use crate::error::{SnoopError, SnoopResult};

/// Supplies the devices for one orchestration pass, in order.
pub trait Inventory {
    /// Returns the devices to process.
    fn devices(&self) -> SnoopResult<Vec<Device>>;
}

/// Inventory held in memory.
#[derive(Debug, Clone, Default)]
pub struct StaticInventory {
    devices: Vec<Device>,
}

impl StaticInventory {
    /// Creates an inventory from a device list.
    pub fn new(devices: Vec<Device>) -> Self {
        Self { devices }
    }

    /// Creates an inventory from bare host names.
    pub fn from_hosts<I, S>(hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(hosts.into_iter().map(Device::new).collect())
    }
}

impl Inventory for StaticInventory {
    fn devices(&self) -> SnoopResult<Vec<Device>> {
        Ok(self.devices.clone())
    }
}

/// Line-oriented inventory file.
///
/// One device per line: `<host> [credentials-ref]`. Blank lines and lines
/// starting with `#` are skipped.
#[derive(Debug, Clone)]
pub struct FileInventory {
    path: PathBuf,
}

impl FileInventory {
    /// Creates an inventory backed by `path`.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Parses inventory text.
    pub fn parse(content: &str) -> Vec<Device> {
        content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .filter_map(|line| {
                let mut tokens = line.split_whitespace();
                let host = tokens.next()?;
                let device = Device::new(host);
                Some(match tokens.next() {
                    Some(creds) => device.with_credentials(creds),
                    None => device,
                })
            })
            .collect()
    }
}

impl Inventory for FileInventory {
    fn devices(&self) -> SnoopResult<Vec<Device>> {
        let content = fs::read_to_string(&self.path).map_err(|e| {
            SnoopError::inventory(format!(
                "Failed to read inventory {}: {}",
                self.path.display(),
                e
            ))
        })?;
        Ok(Self::parse(&content))
    }
}
