//! FleetOrchestrator - runs the snooping pipeline across the inventory
//!
//! Per device flow:
//! 1. Connect, enter privileged mode, read the hostname from the prompt
//! 2. Fetch interface status and parse it
//! 3. Classify ports and plan batches
//! 4. Apply batches and save (see [`Applicator`])
//!
//! Devices are independent. A failed device never stops the run, and reports
//! come back in inventory order whatever the concurrency limit.

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use tracing::{debug, info, instrument, warn};

use snoop_common::{
    hostname_from_prompt, Device, LogEntry, LogSink, Session, SnoopError, SnoopResult, Transport,
};

use crate::applicator::{close_session, Applicator};
use crate::classifier::{classify_all, ClassifierPolicy};
use crate::commands::DEFAULT_STATUS_CMD;
use crate::config::SnoopConfig;
use crate::parser::parse_status;
use crate::planner::Planner;
use crate::types::{DeviceReport, DeviceState, Role};

/// Orchestrator settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestratorSettings {
    /// Interface status query.
    pub status_command: String,
    /// Enter privileged mode after connecting.
    pub enable: bool,
    /// Time budget for one device pass.
    pub device_timeout: Duration,
    /// Devices processed at once.
    pub max_concurrent_devices: usize,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            status_command: DEFAULT_STATUS_CMD.to_string(),
            enable: true,
            device_timeout: Duration::from_secs(120),
            max_concurrent_devices: 1,
        }
    }
}

impl From<&SnoopConfig> for OrchestratorSettings {
    fn from(config: &SnoopConfig) -> Self {
        Self {
            status_command: config.device.status_command.clone(),
            enable: config.device.enable,
            device_timeout: config.device_timeout(),
            max_concurrent_devices: config.fleet.max_concurrent_devices,
        }
    }
}

/// Runs independent per-device passes over a device list.
pub struct FleetOrchestrator {
    applicator: Applicator,
    classifier: Arc<dyn ClassifierPolicy>,
    planner: Planner,
    settings: OrchestratorSettings,
}

impl FleetOrchestrator {
    /// Creates an orchestrator.
    pub fn new(
        applicator: Applicator,
        classifier: Arc<dyn ClassifierPolicy>,
        planner: Planner,
        settings: OrchestratorSettings,
    ) -> Self {
        Self {
            applicator,
            classifier,
            planner,
            settings,
        }
    }

    /// Builds an orchestrator from a validated configuration.
    pub fn from_config(
        config: &SnoopConfig,
        transport: Arc<dyn Transport>,
        sink: Arc<dyn LogSink>,
    ) -> SnoopResult<Self> {
        let applicator = Applicator::new(transport, sink)
            .with_save_command(config.device.save_command.clone())
            .with_failure_policy(config.fleet.port_failure_policy);

        Ok(Self::new(
            applicator,
            Arc::new(config.classifier()),
            config.planner()?,
            OrchestratorSettings::from(config),
        ))
    }

    /// Returns the settings.
    pub fn settings(&self) -> &OrchestratorSettings {
        &self.settings
    }

    /// Processes every device and returns one report each, in input order.
    pub async fn run(&self, devices: Vec<Device>) -> Vec<DeviceReport> {
        let limit = self.settings.max_concurrent_devices.max(1);
        info!(devices = devices.len(), concurrency = limit, "Starting fleet run");

        stream::iter(devices)
            .map(|device| self.process_device(device))
            .buffered(limit)
            .collect()
            .await
    }

    /// Runs the full pipeline for one device under the device timeout.
    ///
    /// The timeout covers connect through save. Disconnect runs afterwards
    /// under its own timeout and cannot change the outcome.
    #[instrument(skip(self, device), fields(device = %device.host))]
    pub async fn process_device(&self, device: Device) -> DeviceReport {
        let mut report = DeviceReport::new(device.host.clone());
        let mut session = None;
        let timeout = self.settings.device_timeout;

        let outcome = tokio::time::timeout(
            timeout,
            self.run_pipeline(&device, &mut report, &mut session),
        )
        .await;
        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(e)) => self.record_failure(&device, &mut report, e),
            Err(_) => self.record_failure(&device, &mut report, SnoopError::Timeout(timeout)),
        }

        if let Some(mut session) = session {
            let closed =
                tokio::time::timeout(timeout, close_session(session.as_mut(), &device.host)).await;
            if closed.is_err() {
                warn!("Disconnect from {} timed out", device.host);
            }
        }

        info!(
            state = %report.state,
            success = report.success,
            results = report.results.len(),
            "Device pass finished"
        );
        report
    }

    async fn run_pipeline(
        &self,
        device: &Device,
        report: &mut DeviceReport,
        slot: &mut Option<Box<dyn Session>>,
    ) -> SnoopResult<()> {
        report.state = DeviceState::Connecting;
        let session = slot.insert(self.applicator.transport().connect(device).await?);
        self.configure(session.as_mut(), report).await
    }

    async fn configure(
        &self,
        session: &mut dyn Session,
        report: &mut DeviceReport,
    ) -> SnoopResult<()> {
        if self.settings.enable {
            session.enable().await?;
        }

        match session.find_prompt().await {
            Ok(prompt) => report.hostname = hostname_from_prompt(&prompt),
            Err(e) => debug!("Prompt unavailable on {}: {}", report.device, e),
        }
        let sink = self.applicator.sink();
        sink.append(LogEntry::DeviceHeader {
            hostname: report.display_name().to_string(),
        });

        report.state = DeviceState::Parsing;
        let raw = session.send_command(&self.settings.status_command).await?;
        let records = parse_status(&raw)?;

        report.state = DeviceState::Classifying;
        let ports = classify_all(self.classifier.as_ref(), records);
        let names = |role: Role| -> Vec<String> {
            ports
                .iter()
                .filter(|p| p.role == role)
                .map(|p| p.name().to_string())
                .collect()
        };
        let trunk = names(Role::Trunk);
        let access = names(Role::Access);
        report.trunk_ports = trunk.len();
        report.access_ports = access.len();
        report.ignored_ports = ports.len() - trunk.len() - access.len();
        debug!(
            trunk = report.trunk_ports,
            access = report.access_ports,
            ignored = report.ignored_ports,
            "Ports classified"
        );
        sink.append(LogEntry::PortsDetected { trunk, access });

        report.state = DeviceState::Planning;
        let batches = self.planner.plan(&ports);

        sink.append(LogEntry::ConfigStarted);
        self.applicator.apply_session(session, &batches, report).await;
        Ok(())
    }

    fn record_failure(&self, device: &Device, report: &mut DeviceReport, err: SnoopError) {
        warn!("Device {} failed during {}: {}", device.host, report.state, err);
        self.applicator.sink().append(LogEntry::DeviceFailed {
            host: device.host.clone(),
            cause: err.to_string(),
        });
        report.fail(err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::SubstringPolicy;
    use crate::commands::{build_global_cmds, DEFAULT_SNOOPING_VLANS};
    use snoop_test::{
        access_ports, truncated_status, CallKind, DeviceScript, MemoryLogSink, MockTransport,
        TranscriptVerifier, SAMPLE_STATUS,
    };

    fn orchestrator(
        transport: &Arc<MockTransport>,
        sink: &Arc<MemoryLogSink>,
        settings: OrchestratorSettings,
    ) -> FleetOrchestrator {
        let planner =
            Planner::new(64, build_global_cmds(DEFAULT_SNOOPING_VLANS, true, false)).unwrap();
        FleetOrchestrator::new(
            Applicator::new(transport.clone(), sink.clone()),
            Arc::new(SubstringPolicy::default()),
            planner,
            settings,
        )
    }

    #[tokio::test]
    async fn test_process_sample_device() {
        let transport = Arc::new(MockTransport::new().with_device(
            "10.0.0.1",
            DeviceScript::with_status(SAMPLE_STATUS).prompt("core-sw1#"),
        ));
        let sink = Arc::new(MemoryLogSink::new());
        let orch = orchestrator(&transport, &sink, OrchestratorSettings::default());

        let report = orch.process_device(Device::new("10.0.0.1")).await;

        assert_eq!(report.state, DeviceState::Saved);
        assert!(report.success);
        assert_eq!(report.hostname.as_deref(), Some("core-sw1"));
        assert_eq!(report.trunk_ports, 1);
        assert_eq!(report.access_ports, 2);
        assert_eq!(report.ignored_ports, 0);
        assert_eq!(report.results.len(), 4);

        TranscriptVerifier::new(&transport)
            .assert_config_order(
                "10.0.0.1",
                &[
                    "interface Gi1/0/2",
                    "interface Gi1/0/1",
                    "interface Fa1/0/3",
                    "ip dhcp snooping vlan 10,26-47,51,61,67",
                ],
            )
            .unwrap();

        let calls = transport.calls_for("10.0.0.1");
        assert_eq!(calls[0], CallKind::Connect);
        assert_eq!(calls[1], CallKind::Enable);
        assert_eq!(calls[2], CallKind::FindPrompt);
        assert_eq!(calls.last(), Some(&CallKind::Disconnect));

        let entries = sink.entries();
        assert_eq!(
            entries[0],
            LogEntry::DeviceHeader {
                hostname: "core-sw1".to_string()
            }
        );
        assert_eq!(
            entries[1],
            LogEntry::PortsDetected {
                trunk: vec!["Gi1/0/2".to_string()],
                access: vec!["Gi1/0/1".to_string(), "Fa1/0/3".to_string()],
            }
        );
        assert_eq!(entries[2], LogEntry::ConfigStarted);
    }

    #[tokio::test]
    async fn test_enable_skipped_when_disabled() {
        let transport = Arc::new(
            MockTransport::new().with_device("sw1", DeviceScript::with_status(access_ports(1))),
        );
        let sink = Arc::new(MemoryLogSink::new());
        let settings = OrchestratorSettings {
            enable: false,
            ..OrchestratorSettings::default()
        };
        let orch = orchestrator(&transport, &sink, settings);

        let report = orch.process_device(Device::new("sw1")).await;

        assert!(report.success);
        assert!(!transport.calls_for("sw1").contains(&CallKind::Enable));
    }

    #[tokio::test]
    async fn test_malformed_status_fails_before_config() {
        let transport = Arc::new(
            MockTransport::new().with_device("sw1", DeviceScript::with_status(truncated_status())),
        );
        let sink = Arc::new(MemoryLogSink::new());
        let orch = orchestrator(&transport, &sink, OrchestratorSettings::default());

        let report = orch.process_device(Device::new("sw1")).await;

        assert_eq!(report.state, DeviceState::Failed);
        assert_eq!(report.failed_at, Some(DeviceState::Parsing));
        assert!(report.failure.as_deref().unwrap().contains("Malformed"));
        assert!(transport.config_sets_for("sw1").is_empty());
        assert_eq!(transport.calls_for("sw1").last(), Some(&CallKind::Disconnect));
    }

    #[tokio::test]
    async fn test_status_query_failure() {
        let transport = Arc::new(MockTransport::new().with_device(
            "sw1",
            DeviceScript::with_status(SAMPLE_STATUS).fail_status(),
        ));
        let sink = Arc::new(MemoryLogSink::new());
        let orch = orchestrator(&transport, &sink, OrchestratorSettings::default());

        let report = orch.process_device(Device::new("sw1")).await;

        assert_eq!(report.failed_at, Some(DeviceState::Parsing));
        assert!(!report.success);
        assert_eq!(
            sink.count(|e| matches!(e, LogEntry::DeviceFailed { .. })),
            1
        );
    }

    #[tokio::test]
    async fn test_enable_failure() {
        let transport = Arc::new(MockTransport::new().with_device(
            "sw1",
            DeviceScript::with_status(SAMPLE_STATUS).fail_enable(),
        ));
        let sink = Arc::new(MemoryLogSink::new());
        let orch = orchestrator(&transport, &sink, OrchestratorSettings::default());

        let report = orch.process_device(Device::new("sw1")).await;

        assert_eq!(report.failed_at, Some(DeviceState::Connecting));
        assert!(report.failure.as_deref().unwrap().contains("bad secret"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_keeps_partial_results() {
        let transport = Arc::new(MockTransport::new().with_device(
            "slow",
            DeviceScript::with_status(access_ports(10)).delay(Duration::from_secs(1)),
        ));
        let sink = Arc::new(MemoryLogSink::new());
        let settings = OrchestratorSettings {
            device_timeout: Duration::from_millis(7500),
            ..OrchestratorSettings::default()
        };
        let orch = orchestrator(&transport, &sink, settings);

        let report = orch.process_device(Device::new("slow")).await;

        assert_eq!(report.state, DeviceState::Failed);
        assert_eq!(report.failed_at, Some(DeviceState::Applying));
        assert!(report.failure.as_deref().unwrap().contains("timed out"));
        assert!(!report.results.is_empty());
        assert!(report.results.len() < 11);
        assert!(report.save.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_disconnect_keeps_saved_outcome() {
        let transport = Arc::new(MockTransport::new().with_device(
            "sw1",
            DeviceScript::with_status(SAMPLE_STATUS).slow_disconnect(Duration::from_secs(3600)),
        ));
        let sink = Arc::new(MemoryLogSink::new());
        let settings = OrchestratorSettings {
            device_timeout: Duration::from_secs(10),
            ..OrchestratorSettings::default()
        };
        let orch = orchestrator(&transport, &sink, settings);

        let report = orch.process_device(Device::new("sw1")).await;

        assert!(report.save_succeeded());
        assert_eq!(report.state, DeviceState::Saved);
        assert!(report.success);
        assert_eq!(report.failed_at, None);
        assert!(report.failure.is_none());
        assert_eq!(transport.calls_for("sw1").last(), Some(&CallKind::Disconnect));
        assert_eq!(
            sink.count(|e| matches!(e, LogEntry::DeviceFailed { .. })),
            0
        );
    }

    #[tokio::test]
    async fn test_run_preserves_inventory_order() {
        let transport = Arc::new(
            MockTransport::new()
                .with_device(
                    "a",
                    DeviceScript::with_status(access_ports(1)).delay(Duration::from_millis(30)),
                )
                .with_device("b", DeviceScript::unreachable("refused"))
                .with_device("c", DeviceScript::with_status(access_ports(2))),
        );
        let sink = Arc::new(MemoryLogSink::new());
        let settings = OrchestratorSettings {
            max_concurrent_devices: 3,
            ..OrchestratorSettings::default()
        };
        let orch = orchestrator(&transport, &sink, settings);

        let reports = orch
            .run(vec![Device::new("a"), Device::new("b"), Device::new("c")])
            .await;

        let hosts: Vec<&str> = reports.iter().map(|r| r.device.as_str()).collect();
        assert_eq!(hosts, vec!["a", "b", "c"]);
        assert!(reports[0].success);
        assert_eq!(reports[1].failed_at, Some(DeviceState::Connecting));
        assert!(reports[2].success);
        assert_eq!(reports[2].access_ports, 2);
    }

    #[test]
    fn test_settings_from_config() {
        let mut config = SnoopConfig::default();
        config.device.timeout_secs = 30;
        config.fleet.max_concurrent_devices = 4;
        config.device.enable = false;

        let settings = OrchestratorSettings::from(&config);
        assert_eq!(settings.device_timeout, Duration::from_secs(30));
        assert_eq!(settings.max_concurrent_devices, 4);
        assert!(!settings.enable);
        assert_eq!(settings.status_command, DEFAULT_STATUS_CMD);
    }
}
