//! Scripted transport for exercising device passes without a network.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use snoop_common::{Device, Session, Transport, TransportError};

/// Scripted behavior of one device.
#[derive(Debug, Clone, Default)]
pub struct DeviceScript {
    /// Output returned for `show ...` commands
    pub status: String,
    /// Prompt returned by `find_prompt`; defaults to `<host>#`
    pub prompt: Option<String>,
    /// Connect fails with this cause
    pub connect_error: Option<String>,
    /// 1-based indices of `send_config_set` calls that fail
    pub failing_config_sets: HashSet<usize>,
    /// The status command fails
    pub fail_status: bool,
    /// The save command fails
    pub fail_save: bool,
    /// `enable` fails
    pub fail_enable: bool,
    /// Sleep before every session call
    pub delay: Option<Duration>,
    /// Extra sleep inside `disconnect`
    pub disconnect_delay: Option<Duration>,
}

impl DeviceScript {
    /// A device that answers the status query with `status`
    pub fn with_status(status: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            ..Self::default()
        }
    }

    /// A device that refuses connections
    pub fn unreachable(cause: impl Into<String>) -> Self {
        Self {
            connect_error: Some(cause.into()),
            ..Self::default()
        }
    }

    /// Sets the prompt
    pub fn prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    /// Fails the n-th (1-based) config set
    pub fn fail_config_set(mut self, n: usize) -> Self {
        self.failing_config_sets.insert(n);
        self
    }

    /// Fails the status command
    pub fn fail_status(mut self) -> Self {
        self.fail_status = true;
        self
    }

    /// Fails the save command
    pub fn fail_save(mut self) -> Self {
        self.fail_save = true;
        self
    }

    /// Fails privilege escalation
    pub fn fail_enable(mut self) -> Self {
        self.fail_enable = true;
        self
    }

    /// Delays every session call
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Stalls `disconnect` for `delay`
    pub fn slow_disconnect(mut self, delay: Duration) -> Self {
        self.disconnect_delay = Some(delay);
        self
    }
}

/// Kind of a recorded transport call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallKind {
    Connect,
    Enable,
    FindPrompt,
    Command(String),
    ConfigSet(Vec<String>),
    Disconnect,
}

/// A recorded transport call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCall {
    /// Device host
    pub host: String,
    /// What was called
    pub kind: CallKind,
}

/// Transport that plays back [`DeviceScript`]s and records every call.
///
/// Hosts without a script refuse connections.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    scripts: HashMap<String, DeviceScript>,
    calls: Arc<Mutex<Vec<SessionCall>>>,
}

impl MockTransport {
    /// Creates an empty transport
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a scripted device
    pub fn with_device(mut self, host: impl Into<String>, script: DeviceScript) -> Self {
        self.scripts.insert(host.into(), script);
        self
    }

    /// All calls in order
    pub fn calls(&self) -> Vec<SessionCall> {
        self.calls.lock().clone()
    }

    /// Calls made for one host
    pub fn calls_for(&self, host: &str) -> Vec<CallKind> {
        self.calls
            .lock()
            .iter()
            .filter(|c| c.host == host)
            .map(|c| c.kind.clone())
            .collect()
    }

    /// Config sets sent to one host, in order
    pub fn config_sets_for(&self, host: &str) -> Vec<Vec<String>> {
        self.calls_for(host)
            .into_iter()
            .filter_map(|kind| match kind {
                CallKind::ConfigSet(lines) => Some(lines),
                _ => None,
            })
            .collect()
    }

    /// Exec commands sent to one host, in order
    pub fn commands_for(&self, host: &str) -> Vec<String> {
        self.calls_for(host)
            .into_iter()
            .filter_map(|kind| match kind {
                CallKind::Command(cmd) => Some(cmd),
                _ => None,
            })
            .collect()
    }

    fn record(calls: &Mutex<Vec<SessionCall>>, host: &str, kind: CallKind) {
        calls.lock().push(SessionCall {
            host: host.to_string(),
            kind,
        });
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn connect(&self, device: &Device) -> Result<Box<dyn Session>, TransportError> {
        Self::record(&self.calls, &device.host, CallKind::Connect);

        let script = self
            .scripts
            .get(&device.host)
            .ok_or_else(|| TransportError::connect(format!("unknown host {}", device.host)))?;
        if let Some(delay) = script.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(cause) = &script.connect_error {
            return Err(TransportError::connect(cause.clone()));
        }

        Ok(Box::new(MockSession {
            host: device.host.clone(),
            script: script.clone(),
            config_sets_sent: 0,
            calls: Arc::clone(&self.calls),
        }))
    }
}

struct MockSession {
    host: String,
    script: DeviceScript,
    config_sets_sent: usize,
    calls: Arc<Mutex<Vec<SessionCall>>>,
}

impl MockSession {
    async fn enter(&self, kind: CallKind) {
        MockTransport::record(&self.calls, &self.host, kind);
        if let Some(delay) = self.script.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl Session for MockSession {
    async fn send_command(&mut self, command: &str) -> Result<String, TransportError> {
        self.enter(CallKind::Command(command.to_string())).await;

        if command.starts_with("show") {
            if self.script.fail_status {
                return Err(TransportError::new("send_command", "status query timed out"));
            }
            Ok(self.script.status.clone())
        } else if self.script.fail_save {
            Err(TransportError::new("send_command", "save rejected"))
        } else {
            Ok("Building configuration...\n[OK]".to_string())
        }
    }

    async fn send_config_set(&mut self, commands: &[String]) -> Result<String, TransportError> {
        self.enter(CallKind::ConfigSet(commands.to_vec())).await;
        self.config_sets_sent += 1;

        if self.script.failing_config_sets.contains(&self.config_sets_sent) {
            return Err(TransportError::new(
                "send_config_set",
                format!("pattern not detected in config set {}", self.config_sets_sent),
            ));
        }
        Ok(commands.join("\n"))
    }

    async fn enable(&mut self) -> Result<(), TransportError> {
        self.enter(CallKind::Enable).await;
        if self.script.fail_enable {
            return Err(TransportError::new("enable", "bad secret"));
        }
        Ok(())
    }

    async fn find_prompt(&mut self) -> Result<String, TransportError> {
        self.enter(CallKind::FindPrompt).await;
        Ok(self
            .script
            .prompt
            .clone()
            .unwrap_or_else(|| format!("{}#", self.host)))
    }

    async fn disconnect(&mut self) -> Result<(), TransportError> {
        self.enter(CallKind::Disconnect).await;
        if let Some(delay) = self.script.disconnect_delay {
            tokio::time::sleep(delay).await;
        }
        Ok(())
    }
}
