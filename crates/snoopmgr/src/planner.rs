//! Configuration planner.
//!
//! Turns classified ports into the ordered batch sequence for one device:
//! every trunk batch, then every access batch, then the single global batch.
//! Trust has to be in place on uplinks before snooping is enabled globally,
//! so the order is part of the contract.

use snoop_common::{SnoopError, SnoopResult};

use crate::commands::{build_rate_limit_cmds, build_trust_cmds};
use crate::types::{BatchScope, ClassifiedPort, ConfigBatch, Role};

/// Plans snooping batches for a device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Planner {
    access_rate_limit: u32,
    global_commands: Vec<String>,
}

impl Planner {
    /// Creates a planner.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` if the rate limit is zero or the global set is empty.
    pub fn new(access_rate_limit: u32, global_commands: Vec<String>) -> SnoopResult<Self> {
        if access_rate_limit == 0 {
            return Err(SnoopError::invalid_config(
                "access_rate_limit",
                "must be > 0",
            ));
        }
        if global_commands.is_empty() {
            return Err(SnoopError::invalid_config(
                "global_commands",
                "must contain at least one command",
            ));
        }
        Ok(Self {
            access_rate_limit,
            global_commands,
        })
    }

    /// Rate limit applied to access ports.
    pub fn access_rate_limit(&self) -> u32 {
        self.access_rate_limit
    }

    /// Commands of the global batch.
    pub fn global_commands(&self) -> &[String] {
        &self.global_commands
    }

    /// Produces the batch sequence. Ignored ports yield nothing.
    pub fn plan(&self, ports: &[ClassifiedPort]) -> Vec<ConfigBatch> {
        let trunk = ports.iter().filter(|p| p.role == Role::Trunk).map(|p| {
            ConfigBatch::from_builder(
                BatchScope::Interface {
                    port: p.name().to_string(),
                    role: Role::Trunk,
                },
                build_trust_cmds(p.name()),
            )
        });

        let access = ports.iter().filter(|p| p.role == Role::Access).map(|p| {
            ConfigBatch::from_builder(
                BatchScope::Interface {
                    port: p.name().to_string(),
                    role: Role::Access,
                },
                build_rate_limit_cmds(p.name(), self.access_rate_limit),
            )
        });

        let global = ConfigBatch::from_builder(BatchScope::Global, self.global_commands.clone());

        trunk.chain(access).chain(std::iter::once(global)).collect()
    }
}
