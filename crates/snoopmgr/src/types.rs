//! Type definitions for snoopmgr

use serde::{Deserialize, Serialize};
use std::fmt;

/// Snooping role of an interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Uplink carrying tagged traffic; gets snooping trust.
    Trunk,
    /// Host-facing port; gets a DHCP rate limit.
    Access,
    /// Not configured.
    Ignored,
}

impl Role {
    /// Convert to string
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Trunk => "Trunk",
            Role::Access => "Access",
            Role::Ignored => "Ignored",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of interface status output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortRecord {
    /// Interface name, always non-empty.
    pub name: String,
    /// The untouched status line.
    pub raw_line: String,
}

/// A port record with its role assigned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedPort {
    /// The parsed record.
    pub record: PortRecord,
    /// Role assigned by the classifier.
    pub role: Role,
}

impl ClassifiedPort {
    /// Interface name.
    pub fn name(&self) -> &str {
        &self.record.name
    }
}

/// Target of a configuration batch.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BatchScope {
    /// A single interface.
    Interface {
        /// Interface name.
        port: String,
        /// Role the batch configures (Trunk or Access).
        role: Role,
    },
    /// Device-wide snooping settings.
    Global,
    /// Persisting the running configuration.
    Save,
}

impl fmt::Display for BatchScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchScope::Interface { port, .. } => f.write_str(port),
            BatchScope::Global => f.write_str("global"),
            BatchScope::Save => f.write_str("save"),
        }
    }
}

/// Ordered, non-empty command sequence for one scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigBatch {
    scope: BatchScope,
    commands: Vec<String>,
}

impl ConfigBatch {
    /// Creates a batch, or `None` if `commands` is empty.
    pub fn new(scope: BatchScope, commands: Vec<String>) -> Option<Self> {
        if commands.is_empty() {
            None
        } else {
            Some(Self { scope, commands })
        }
    }

    /// Builds a batch from a command builder that always yields lines.
    pub(crate) fn from_builder(scope: BatchScope, commands: Vec<String>) -> Self {
        debug_assert!(!commands.is_empty(), "batch for {} is empty", scope);
        Self { scope, commands }
    }

    /// Batch scope.
    pub fn scope(&self) -> &BatchScope {
        &self.scope
    }

    /// Commands in send order.
    pub fn commands(&self) -> &[String] {
        &self.commands
    }

    /// Role of the interface this batch targets, if any.
    pub fn role(&self) -> Option<Role> {
        match &self.scope {
            BatchScope::Interface { role, .. } => Some(*role),
            _ => None,
        }
    }
}

/// Outcome of sending one batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyResult {
    /// The batch that was sent.
    pub batch: ConfigBatch,
    /// Session output on success, error text on failure.
    pub output: String,
    /// True when the transport call returned without error.
    pub success: bool,
}

impl ApplyResult {
    /// Creates a successful result.
    pub fn succeeded(batch: ConfigBatch, output: impl Into<String>) -> Self {
        Self {
            batch,
            output: output.into(),
            success: true,
        }
    }

    /// Creates a failed result.
    pub fn failed(batch: ConfigBatch, error: impl Into<String>) -> Self {
        Self {
            batch,
            output: error.into(),
            success: false,
        }
    }
}

/// How per-interface batch failures affect the device outcome.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PortFailurePolicy {
    /// Record interface failures; only global and save decide success.
    #[default]
    BestEffort,
    /// Any failed batch marks the device unsuccessful.
    Strict,
}

/// Per-device pipeline state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceState {
    Idle,
    Connecting,
    Parsing,
    Classifying,
    Planning,
    Applying,
    /// Save command succeeded.
    Saved,
    /// The pass ended on a fatal error or the save failed.
    Failed,
}

impl DeviceState {
    /// Convert to string
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceState::Idle => "idle",
            DeviceState::Connecting => "connecting",
            DeviceState::Parsing => "parsing",
            DeviceState::Classifying => "classifying",
            DeviceState::Planning => "planning",
            DeviceState::Applying => "applying",
            DeviceState::Saved => "saved",
            DeviceState::Failed => "failed",
        }
    }

    /// Returns true for `Saved` and `Failed`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, DeviceState::Saved | DeviceState::Failed)
    }
}

impl fmt::Display for DeviceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one device pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceReport {
    /// Inventory host.
    pub device: String,
    /// Hostname read from the device prompt.
    pub hostname: Option<String>,
    /// Current or terminal state.
    pub state: DeviceState,
    /// Number of trunk ports.
    pub trunk_ports: usize,
    /// Number of access ports.
    pub access_ports: usize,
    /// Number of ignored ports.
    pub ignored_ports: usize,
    /// One result per batch sent, in send order.
    pub results: Vec<ApplyResult>,
    /// Result of the save command, if it was attempted.
    pub save: Option<ApplyResult>,
    /// Stage at which a fatal error stopped the pass.
    pub failed_at: Option<DeviceState>,
    /// Cause of a fatal error.
    pub failure: Option<String>,
    /// Overall success flag.
    pub success: bool,
}

impl DeviceReport {
    /// Creates an idle report for a device.
    pub fn new(device: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            hostname: None,
            state: DeviceState::Idle,
            trunk_ports: 0,
            access_ports: 0,
            ignored_ports: 0,
            results: Vec::new(),
            save: None,
            failed_at: None,
            failure: None,
            success: false,
        }
    }

    /// Name used in logs: the prompt hostname if known, else the host.
    pub fn display_name(&self) -> &str {
        self.hostname.as_deref().unwrap_or(&self.device)
    }

    /// Records a fatal error at the current stage.
    pub fn fail(&mut self, cause: impl fmt::Display) {
        if !self.state.is_terminal() {
            self.failed_at = Some(self.state);
        }
        self.state = DeviceState::Failed;
        self.failure = Some(cause.to_string());
        self.success = false;
    }

    /// Returns true if the global batch was sent successfully.
    pub fn global_succeeded(&self) -> bool {
        self.results
            .iter()
            .any(|r| r.batch.scope() == &BatchScope::Global && r.success)
    }

    /// Returns true if the save command succeeded.
    pub fn save_succeeded(&self) -> bool {
        self.save.as_ref().is_some_and(|s| s.success)
    }

    /// Results of batches that failed, in send order.
    pub fn failed_batches(&self) -> impl Iterator<Item = &ApplyResult> {
        self.results.iter().filter(|r| !r.success)
    }

    /// Returns true if the device was saved but some batch failed.
    pub fn is_partial(&self) -> bool {
        self.state == DeviceState::Saved && self.failed_batches().next().is_some()
    }

    /// Settles state and success once all batches and the save were sent.
    pub fn finish(&mut self, policy: PortFailurePolicy) {
        self.state = if self.save_succeeded() {
            DeviceState::Saved
        } else {
            DeviceState::Failed
        };

        let ports_ok = match policy {
            PortFailurePolicy::BestEffort => true,
            PortFailurePolicy::Strict => self.failed_batches().next().is_none(),
        };
        self.success = self.global_succeeded() && self.save_succeeded() && ports_ok;
    }
}

/// Aggregate counts across a fleet run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FleetSummary {
    /// Devices processed.
    pub total: usize,
    /// Devices whose configuration was saved.
    pub saved: usize,
    /// Saved devices with at least one failed batch.
    pub partial: usize,
    /// Devices that ended in `Failed`.
    pub failed: usize,
    /// Devices with the overall success flag set.
    pub succeeded: usize,
}

impl FleetSummary {
    /// Summarizes a set of reports.
    pub fn from_reports(reports: &[DeviceReport]) -> Self {
        let mut summary = Self {
            total: reports.len(),
            ..Self::default()
        };
        for report in reports {
            match report.state {
                DeviceState::Saved => summary.saved += 1,
                DeviceState::Failed => summary.failed += 1,
                _ => {}
            }
            if report.is_partial() {
                summary.partial += 1;
            }
            if report.success {
                summary.succeeded += 1;
            }
        }
        summary
    }

    /// Returns true if every device succeeded.
    pub fn all_succeeded(&self) -> bool {
        self.succeeded == self.total
    }
}

impl fmt::Display for FleetSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} devices: {} saved ({} partial), {} failed",
            self.total, self.saved, self.partial, self.failed
        )
    }
}
