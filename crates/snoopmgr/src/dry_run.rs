//! Offline transport for rehearsing a fleet run.
//!
//! Status output is read from `<capture_dir>/<host>.txt` (captured earlier
//! with `show interface status`). Config sets and the save are not sent
//! anywhere; the session echoes them back the way an IOS console would and
//! keeps a transcript.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use snoop_common::{Device, Session, Transport, TransportError};

/// Transport that replays captured status output.
#[derive(Debug, Clone)]
pub struct DryRunTransport {
    capture_dir: PathBuf,
    transcript: Arc<Mutex<Vec<String>>>,
}

impl DryRunTransport {
    /// Creates a transport reading captures from `capture_dir`.
    pub fn new(capture_dir: impl AsRef<Path>) -> Self {
        Self {
            capture_dir: capture_dir.as_ref().to_path_buf(),
            transcript: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Path of the capture file for a host.
    pub fn capture_path(&self, host: &str) -> PathBuf {
        self.capture_dir.join(format!("{}.txt", host))
    }

    /// Every line the sessions would have sent, prefixed with the host.
    pub async fn transcript(&self) -> Vec<String> {
        self.transcript.lock().await.clone()
    }
}

#[async_trait]
impl Transport for DryRunTransport {
    async fn connect(&self, device: &Device) -> Result<Box<dyn Session>, TransportError> {
        let path = self.capture_path(&device.host);
        let status = tokio::fs::read_to_string(&path).await.map_err(|e| {
            TransportError::connect(format!("no capture at {}: {}", path.display(), e))
        })?;
        debug!(host = %device.host, path = %path.display(), "Loaded status capture");

        Ok(Box::new(DryRunSession {
            host: device.host.clone(),
            status,
            transcript: Arc::clone(&self.transcript),
        }))
    }
}

struct DryRunSession {
    host: String,
    status: String,
    transcript: Arc<Mutex<Vec<String>>>,
}

impl DryRunSession {
    async fn record(&self, line: &str) {
        self.transcript
            .lock()
            .await
            .push(format!("{}: {}", self.host, line));
    }
}

#[async_trait]
impl Session for DryRunSession {
    async fn send_command(&mut self, command: &str) -> Result<String, TransportError> {
        self.record(command).await;
        if command.starts_with("show interface") {
            Ok(self.status.clone())
        } else if command.starts_with("write") || command.starts_with("copy") {
            Ok("Building configuration...\n[OK]".to_string())
        } else {
            Ok(String::new())
        }
    }

    async fn send_config_set(&mut self, commands: &[String]) -> Result<String, TransportError> {
        let mut echo = vec![
            "configure terminal".to_string(),
            "Enter configuration commands, one per line.  End with CNTL/Z.".to_string(),
        ];
        for command in commands {
            self.record(command).await;
            echo.push(format!("{}(config)#{}", self.host, command));
        }
        echo.push(format!("{}(config)#end", self.host));
        Ok(echo.join("\n"))
    }

    async fn find_prompt(&mut self) -> Result<String, TransportError> {
        Ok(format!("{}#", self.host))
    }
}
