//! Configuration file support for snoopmgr
//!
//! Loads and validates snoopmgr configuration from TOML files.
//! Default location: /etc/snoopmgr/snoopmgr.toml

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use snoop_common::{SnoopError, SnoopResult};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use crate::classifier::{SubstringPolicy, DEFAULT_ACCESS_MARKERS, DEFAULT_TRUNK_MARKER};
use crate::commands::{
    build_global_cmds, DEFAULT_ACCESS_RATE_LIMIT, DEFAULT_SAVE_CMD, DEFAULT_SNOOPING_VLANS,
    DEFAULT_STATUS_CMD,
};
use crate::planner::Planner;
use crate::types::PortFailurePolicy;

/// Default configuration file location.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/snoopmgr/snoopmgr.toml";

/// Default audit log, relative to the working directory.
pub const DEFAULT_LOG_FILE: &str = "dhcp_snooping.log";

/// VLAN list: comma-separated IDs or ranges, e.g. `10,26-47,51`.
static VLAN_LIST_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+(-\d+)?(,\d+(-\d+)?)*$").expect("Invalid regex pattern"));

/// Snooping constants pushed to every device
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnoopingConfig {
    /// VLANs snooping is enabled on
    #[serde(default = "default_vlans")]
    pub vlans: String,

    /// DHCP packets per second accepted on access ports
    #[serde(default = "default_access_rate_limit")]
    pub access_rate_limit: u32,

    /// Insert option 82 into relayed requests
    #[serde(default)]
    pub option82: bool,

    /// Accept option 82 packets on untrusted ports
    #[serde(default = "default_true")]
    pub allow_untrusted_option82: bool,

    /// Explicit global command set, replacing the derived one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_commands: Option<Vec<String>>,
}

/// Port classification markers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Substring of a status line that marks a trunk
    #[serde(default = "default_trunk_marker")]
    pub trunk_marker: String,

    /// Substrings of a port name that mark an access port
    #[serde(default = "default_access_markers")]
    pub access_markers: Vec<String>,
}

/// Per-device session settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Interface status query
    #[serde(default = "default_status_command")]
    pub status_command: String,

    /// Command that persists the running configuration
    #[serde(default = "default_save_command")]
    pub save_command: String,

    /// Enter privileged mode after connecting
    #[serde(default = "default_true")]
    pub enable: bool,

    /// Time budget for a whole device pass in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Fleet run settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FleetConfig {
    /// Devices processed at once (1 = sequential)
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_devices: usize,

    /// How interface batch failures affect device success
    #[serde(default)]
    pub port_failure_policy: PortFailurePolicy,
}

/// Audit log settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Append-only audit log; an empty path sends audit entries to tracing
    #[serde(default = "default_log_file", skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

/// Complete snoopmgr configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SnoopConfig {
    /// Snooping constants
    #[serde(default)]
    pub snooping: SnoopingConfig,

    /// Classification markers
    #[serde(default)]
    pub classifier: ClassifierConfig,

    /// Device session settings
    #[serde(default)]
    pub device: DeviceConfig,

    /// Fleet settings
    #[serde(default)]
    pub fleet: FleetConfig,

    /// Audit log settings
    #[serde(default)]
    pub log: LogConfig,
}

// Default functions
fn default_vlans() -> String {
    DEFAULT_SNOOPING_VLANS.to_string()
}

fn default_access_rate_limit() -> u32 {
    DEFAULT_ACCESS_RATE_LIMIT
}

fn default_true() -> bool {
    true
}

fn default_trunk_marker() -> String {
    DEFAULT_TRUNK_MARKER.to_string()
}

fn default_access_markers() -> Vec<String> {
    DEFAULT_ACCESS_MARKERS.iter().map(|m| m.to_string()).collect()
}

fn default_status_command() -> String {
    DEFAULT_STATUS_CMD.to_string()
}

fn default_save_command() -> String {
    DEFAULT_SAVE_CMD.to_string()
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_max_concurrent() -> usize {
    1
}

fn default_log_file() -> Option<PathBuf> {
    Some(PathBuf::from(DEFAULT_LOG_FILE))
}

// Default implementations
impl Default for SnoopingConfig {
    fn default() -> Self {
        Self {
            vlans: default_vlans(),
            access_rate_limit: default_access_rate_limit(),
            option82: false,
            allow_untrusted_option82: default_true(),
            global_commands: None,
        }
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            trunk_marker: default_trunk_marker(),
            access_markers: default_access_markers(),
        }
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            status_command: default_status_command(),
            save_command: default_save_command(),
            enable: default_true(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            max_concurrent_devices: default_max_concurrent(),
            port_failure_policy: PortFailurePolicy::default(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            file: default_log_file(),
        }
    }
}

impl LogConfig {
    /// Audit log file, or `None` when the log goes to tracing
    pub fn audit_file(&self) -> Option<&Path> {
        self.file
            .as_deref()
            .filter(|path| !path.as_os_str().is_empty())
    }
}

impl SnoopingConfig {
    /// Global batch commands: the explicit override or the derived set
    pub fn global_commands(&self) -> Vec<String> {
        match &self.global_commands {
            Some(cmds) => cmds
                .iter()
                .map(|c| c.trim())
                .filter(|c| !c.is_empty())
                .map(str::to_string)
                .collect(),
            None => build_global_cmds(&self.vlans, self.allow_untrusted_option82, self.option82),
        }
    }
}

impl SnoopConfig {
    /// Load configuration from file, falling back to defaults if file not found
    pub fn load_or_default(path: impl AsRef<Path>) -> SnoopResult<Self> {
        let path = path.as_ref();

        let config: Self = match fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| {
                SnoopError::invalid_config(
                    path.display().to_string(),
                    format!("failed to parse: {}", e),
                )
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), "Config file not found, using defaults");
                Self::default()
            }
            Err(e) => return Err(SnoopError::Io(e)),
        };

        config.validate()?;
        Ok(config)
    }

    /// Load from default location or defaults
    pub fn load() -> SnoopResult<Self> {
        Self::load_or_default(DEFAULT_CONFIG_PATH)
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> SnoopResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| {
            SnoopError::invalid_config("config", format!("failed to serialize: {}", e))
        })?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Get device pass timeout as Duration
    pub fn device_timeout(&self) -> Duration {
        Duration::from_secs(self.device.timeout_secs)
    }

    /// Build the planner for these settings
    pub fn planner(&self) -> SnoopResult<Planner> {
        Planner::new(
            self.snooping.access_rate_limit,
            self.snooping.global_commands(),
        )
    }

    /// Build the classifier policy for these settings
    pub fn classifier(&self) -> SubstringPolicy {
        SubstringPolicy::new(
            self.classifier.trunk_marker.clone(),
            self.classifier.access_markers.clone(),
        )
    }

    /// Validate configuration
    pub fn validate(&self) -> SnoopResult<()> {
        if self.snooping.access_rate_limit == 0 {
            return Err(SnoopError::invalid_config(
                "snooping.access_rate_limit",
                "must be > 0",
            ));
        }

        if !VLAN_LIST_RE.is_match(self.snooping.vlans.trim()) {
            return Err(SnoopError::invalid_config(
                "snooping.vlans",
                format!("'{}' is not a VLAN list", self.snooping.vlans),
            ));
        }

        if let Some(cmds) = &self.snooping.global_commands {
            if cmds.iter().all(|c| c.trim().is_empty()) {
                return Err(SnoopError::invalid_config(
                    "snooping.global_commands",
                    "must contain at least one command",
                ));
            }
        }

        if self.classifier.trunk_marker.is_empty() {
            return Err(SnoopError::invalid_config(
                "classifier.trunk_marker",
                "must not be empty",
            ));
        }

        if self.classifier.access_markers.is_empty()
            || self.classifier.access_markers.iter().any(String::is_empty)
        {
            return Err(SnoopError::invalid_config(
                "classifier.access_markers",
                "must be a non-empty list of non-empty markers",
            ));
        }

        if self.device.status_command.trim().is_empty() {
            return Err(SnoopError::invalid_config(
                "device.status_command",
                "must not be empty",
            ));
        }

        if self.device.save_command.trim().is_empty() {
            return Err(SnoopError::invalid_config(
                "device.save_command",
                "must not be empty",
            ));
        }

        if self.device.timeout_secs == 0 {
            return Err(SnoopError::invalid_config(
                "device.timeout_secs",
                "must be > 0",
            ));
        }

        if self.fleet.max_concurrent_devices == 0 {
            return Err(SnoopError::invalid_config(
                "fleet.max_concurrent_devices",
                "must be >= 1",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SnoopConfig::default();
        assert_eq!(config.snooping.vlans, "10,26-47,51,61,67");
        assert_eq!(config.snooping.access_rate_limit, 64);
        assert!(!config.snooping.option82);
        assert_eq!(config.device.status_command, "show interface status");
        assert_eq!(config.device.save_command, "write memory");
        assert_eq!(config.fleet.max_concurrent_devices, 1);
        assert_eq!(config.fleet.port_failure_policy, PortFailurePolicy::BestEffort);
        assert_eq!(config.log.file.as_deref(), Some(Path::new("dhcp_snooping.log")));
        assert_eq!(config.log.audit_file(), Some(Path::new(DEFAULT_LOG_FILE)));
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(SnoopConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_invalid_vlans() {
        let mut config = SnoopConfig::default();
        config.snooping.vlans = "10,abc".to_string();
        assert!(config.validate().is_err());

        config.snooping.vlans = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_invalid_rate() {
        let mut config = SnoopConfig::default();
        config.snooping.access_rate_limit = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_empty_global_override() {
        let mut config = SnoopConfig::default();
        config.snooping.global_commands = Some(vec![" ".to_string()]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_invalid_concurrency() {
        let mut config = SnoopConfig::default();
        config.fleet.max_concurrent_devices = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_empty_markers() {
        let mut config = SnoopConfig::default();
        config.classifier.access_markers.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_global_commands_derived() {
        let mut config = SnoopConfig::default();
        config.snooping.option82 = true;
        config.snooping.allow_untrusted_option82 = false;
        let cmds = config.snooping.global_commands();
        assert_eq!(
            cmds,
            vec![
                "ip dhcp snooping vlan 10,26-47,51,61,67",
                "ip dhcp snooping information option",
                "ip dhcp snooping",
            ]
        );
    }

    #[test]
    fn test_global_commands_override() {
        let mut config = SnoopConfig::default();
        config.snooping.global_commands = Some(vec!["ip dhcp snooping".to_string()]);
        assert_eq!(config.snooping.global_commands(), vec!["ip dhcp snooping"]);
    }

    #[test]
    fn test_device_timeout_duration() {
        let config = SnoopConfig::default();
        assert_eq!(config.device_timeout(), Duration::from_secs(120));
    }

    #[test]
    fn test_toml_deserialization() {
        let toml_str = r#"
[snooping]
vlans = "100-110"
access_rate_limit = 15

[fleet]
max_concurrent_devices = 4
port_failure_policy = "strict"

[log]
file = "/var/log/dhcp_snooping.log"
"#;
        let config: SnoopConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.snooping.vlans, "100-110");
        assert_eq!(config.snooping.access_rate_limit, 15);
        assert_eq!(config.fleet.max_concurrent_devices, 4);
        assert_eq!(config.fleet.port_failure_policy, PortFailurePolicy::Strict);
        assert_eq!(
            config.log.file.as_deref(),
            Some(Path::new("/var/log/dhcp_snooping.log"))
        );
        // Unspecified values should use defaults
        assert!(config.snooping.allow_untrusted_option82);
        assert_eq!(config.device.save_command, "write memory");
    }

    #[test]
    fn test_save_and_load_roundtrip_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snoopmgr.toml");

        let mut config = SnoopConfig::default();
        config.snooping.access_rate_limit = 32;
        config.save(&path).unwrap();

        let loaded = SnoopConfig::load_or_default(&path).unwrap();
        assert_eq!(loaded.snooping.access_rate_limit, 32);
    }

    #[test]
    fn test_load_rejects_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snoopmgr.toml");
        std::fs::write(&path, "[snooping]\naccess_rate_limit = 0\n").unwrap();

        assert!(SnoopConfig::load_or_default(&path).is_err());
    }

    #[test]
    fn test_load_nonexistent_file_defaults() {
        let config = SnoopConfig::load_or_default("/nonexistent/snoopmgr.toml").unwrap();
        assert_eq!(config.snooping.access_rate_limit, 64);
    }

    #[test]
    fn test_log_file_defaults_when_section_missing() {
        let config: SnoopConfig = toml::from_str("[fleet]\nmax_concurrent_devices = 2\n").unwrap();
        assert_eq!(config.log.audit_file(), Some(Path::new("dhcp_snooping.log")));

        let config: SnoopConfig = toml::from_str("[log]\n").unwrap();
        assert_eq!(config.log.audit_file(), Some(Path::new("dhcp_snooping.log")));
    }

    #[test]
    fn test_empty_log_file_disables_file_sink() {
        let config: SnoopConfig = toml::from_str("[log]\nfile = \"\"\n").unwrap();
        assert!(config.log.audit_file().is_none());
    }

    #[test]
    fn test_planner_from_config() {
        let planner = SnoopConfig::default().planner().unwrap();
        assert_eq!(planner.access_rate_limit(), 64);
        assert_eq!(planner.global_commands().len(), 4);
    }
}
