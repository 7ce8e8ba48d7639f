//! Test infrastructure for the DHCP snooping fleet configurator
//!
//! Provides:
//! - Scripted transport with per-host failures ([`MockTransport`])
//! - In-memory audit log ([`MemoryLogSink`])
//! - Interface status fixtures
//! - Session transcript verification helpers

pub mod fixtures;
mod memory_sink;
mod mock_transport;
mod verification;

pub use fixtures::*;
pub use memory_sink::MemoryLogSink;
pub use mock_transport::{CallKind, DeviceScript, MockTransport, SessionCall};
pub use verification::*;
