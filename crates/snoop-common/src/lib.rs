//! Shared collaborators for the DHCP snooping fleet configurator.
//!
//! The engine in `snoopmgr` decides what to configure; this crate defines the
//! pieces it talks to:
//!
//! - [`transport`]: [`Transport`] and [`Session`] traits for remote command sessions
//! - [`inventory`]: the ordered device list ([`Inventory`])
//! - [`log_sink`]: the append-only audit log ([`LogSink`], [`FileLogSink`])
//! - [`error`]: error taxonomy shared by every stage
//!
//! # Example
//!
//! ```ignore
//! use snoop_common::{FileInventory, FileLogSink, Inventory, LogEntry, LogSink};
//!
//! let devices = FileInventory::new("hosts.txt").devices()?;
//! let sink = FileLogSink::open("dhcp_snooping.log").await?;
//! for device in &devices {
//!     sink.append(LogEntry::DeviceHeader { hostname: device.host.clone() });
//! }
//! sink.close().await;
//! ```

pub mod device;
pub mod error;
pub mod inventory;
pub mod log_sink;
pub mod transport;

// Re-export commonly used items at crate root
pub use device::Device;
pub use error::{SnoopError, SnoopResult, TransportError};
pub use inventory::{FileInventory, Inventory, StaticInventory};
pub use log_sink::{FileLogSink, LogEntry, LogSink, TracingLogSink};
pub use transport::{hostname_from_prompt, Session, Transport};
