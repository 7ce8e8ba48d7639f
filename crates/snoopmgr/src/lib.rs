//! snoopmgr - DHCP snooping configuration manager for switch fleets
//!
//! Reads interface status from each switch, classifies ports as trunk or
//! access, and pushes snooping trust, rate limits and the global snooping
//! settings through a [`snoop_common::Transport`].
//!
//! Parsing, classification and planning are pure; all side effects (session
//! traffic and the audit log) live in [`Applicator`] and [`FleetOrchestrator`].

mod applicator;
mod classifier;
mod commands;
mod config;
mod dry_run;
mod orchestrator;
mod parser;
mod planner;
mod types;

pub use applicator::Applicator;
pub use classifier::*;
pub use commands::*;
pub use config::*;
pub use dry_run::DryRunTransport;
pub use orchestrator::{FleetOrchestrator, OrchestratorSettings};
pub use parser::*;
pub use planner::Planner;
pub use types::*;
