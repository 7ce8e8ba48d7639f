//! Applicator - pushes planned batches through a device session.
//!
//! Batches are sent strictly in plan order. A failed batch is recorded and
//! the next one is still sent; only the session itself failing ends the pass.
//! Every result goes to the audit log as soon as it is known.

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use snoop_common::{Device, LogEntry, LogSink, Session, SnoopError, Transport};

use crate::commands::DEFAULT_SAVE_CMD;
use crate::types::{
    ApplyResult, BatchScope, ConfigBatch, DeviceReport, DeviceState, PortFailurePolicy, Role,
};

/// Sends configuration batches and the save command to devices.
pub struct Applicator {
    transport: Arc<dyn Transport>,
    sink: Arc<dyn LogSink>,
    save_command: String,
    failure_policy: PortFailurePolicy,
}

impl Applicator {
    /// Creates an applicator using `write memory` and best-effort port failures.
    pub fn new(transport: Arc<dyn Transport>, sink: Arc<dyn LogSink>) -> Self {
        Self {
            transport,
            sink,
            save_command: DEFAULT_SAVE_CMD.to_string(),
            failure_policy: PortFailurePolicy::default(),
        }
    }

    /// Sets the command that persists the running configuration.
    pub fn with_save_command(mut self, command: impl Into<String>) -> Self {
        self.save_command = command.into();
        self
    }

    /// Sets how interface batch failures affect the device outcome.
    pub fn with_failure_policy(mut self, policy: PortFailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    pub(crate) fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    pub(crate) fn sink(&self) -> &dyn LogSink {
        self.sink.as_ref()
    }

    /// Connects to `device`, applies `batches`, saves, and reports.
    ///
    /// Standalone entry point for a plan built ahead of time. It neither
    /// enters privileged mode nor reads the prompt; [`FleetOrchestrator`]
    /// opens its own session because status must be read before planning,
    /// and hands that session to [`Applicator::apply_session`].
    ///
    /// A connect failure yields a `Failed` report with no results.
    ///
    /// [`FleetOrchestrator`]: crate::FleetOrchestrator
    #[instrument(
        skip(self, device, batches),
        fields(device = %device.host, batches = batches.len())
    )]
    pub async fn apply(&self, device: &Device, batches: &[ConfigBatch]) -> DeviceReport {
        let mut report = DeviceReport::new(device.host.clone());
        report.trunk_ports = count_role(batches, Role::Trunk);
        report.access_ports = count_role(batches, Role::Access);
        report.state = DeviceState::Connecting;

        let mut session = match self.transport.connect(device).await {
            Ok(session) => session,
            Err(e) => {
                let err = SnoopError::from(e);
                warn!("Connection to {} failed: {}", device.host, err);
                self.sink.append(LogEntry::DeviceFailed {
                    host: device.host.clone(),
                    cause: err.to_string(),
                });
                report.fail(err);
                return report;
            }
        };

        self.apply_session(session.as_mut(), batches, &mut report)
            .await;
        close_session(session.as_mut(), &device.host).await;
        report
    }

    /// Applies `batches` and the save command on an open session.
    ///
    /// Appends one result per batch to `report`, records the save result,
    /// and settles the report's state and success flag.
    pub async fn apply_session(
        &self,
        session: &mut dyn Session,
        batches: &[ConfigBatch],
        report: &mut DeviceReport,
    ) {
        report.state = DeviceState::Applying;

        for batch in batches {
            let result = match session.send_config_set(batch.commands()).await {
                Ok(output) => {
                    debug!(scope = %batch.scope(), "Batch applied");
                    ApplyResult::succeeded(batch.clone(), output)
                }
                Err(e) => {
                    let err = SnoopError::batch_apply(batch.scope().to_string(), e);
                    warn!("{} on {}", err, report.device);
                    ApplyResult::failed(batch.clone(), err.to_string())
                }
            };
            self.log_result(&report.device, &result);
            report.results.push(result);
        }

        let save_batch =
            ConfigBatch::from_builder(BatchScope::Save, vec![self.save_command.clone()]);
        let save = match session.send_command(&self.save_command).await {
            Ok(output) => ApplyResult::succeeded(save_batch, output),
            Err(e) => {
                warn!("Save on {} failed: {}", report.device, e);
                ApplyResult::failed(save_batch, e.to_string())
            }
        };
        self.log_result(&report.device, &save);
        report.save = Some(save);

        report.finish(self.failure_policy);
        info!(
            device = %report.device,
            state = %report.state,
            failed_batches = report.failed_batches().count(),
            "Configuration applied"
        );
    }

    fn log_result(&self, host: &str, result: &ApplyResult) {
        let host = host.to_string();
        let output = result.output.clone();
        let success = result.success;
        let entry = match result.batch.scope() {
            BatchScope::Interface { port, role } => LogEntry::PortResult {
                host,
                role: role.as_str().to_string(),
                port: port.clone(),
                output,
                success,
            },
            BatchScope::Global => LogEntry::GlobalResult {
                host,
                output,
                success,
            },
            BatchScope::Save => LogEntry::SaveResult {
                host,
                output,
                success,
            },
        };
        self.sink.append(entry);
    }
}

fn count_role(batches: &[ConfigBatch], role: Role) -> usize {
    batches.iter().filter(|b| b.role() == Some(role)).count()
}

/// Disconnects a session; errors are only logged.
pub(crate) async fn close_session(session: &mut dyn Session, host: &str) {
    if let Err(e) = session.disconnect().await {
        debug!("Disconnect from {} failed: {}", host, e);
    }
}
