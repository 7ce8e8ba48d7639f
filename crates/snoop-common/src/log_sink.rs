//! Append-only audit log of configuration passes.
//!
//! The engine emits one [`LogEntry`] per significant event. Sinks accept
//! entries without blocking the caller; [`FileLogSink`] hands them to a single
//! writer task so entries from concurrently processed devices are never
//! interleaved within a line.

use std::fmt;
use std::path::{Path, PathBuf};

use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

/// Width of the banner around a device header.
const BANNER_WIDTH: usize = 40;

/// A single audit log event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogEntry {
    /// Start of a device pass.
    DeviceHeader {
        /// Hostname from the prompt, or the inventory host.
        hostname: String,
    },
    /// Port lists after classification.
    PortsDetected {
        /// Trunk ports in discovery order.
        trunk: Vec<String>,
        /// Access ports in discovery order.
        access: Vec<String>,
    },
    /// Marker written before the first batch is sent.
    ConfigStarted,
    /// Result of one per-interface batch.
    PortResult {
        /// Inventory host.
        host: String,
        /// Port role label ("Trunk" or "Access").
        role: String,
        /// Interface name.
        port: String,
        /// Session output or error text.
        output: String,
        /// Whether the transport call succeeded.
        success: bool,
    },
    /// Result of the global batch.
    GlobalResult {
        /// Inventory host.
        host: String,
        /// Session output or error text.
        output: String,
        /// Whether the transport call succeeded.
        success: bool,
    },
    /// Result of the save command.
    SaveResult {
        /// Inventory host.
        host: String,
        /// Session output or error text.
        output: String,
        /// Whether the transport call succeeded.
        success: bool,
    },
    /// A device pass ended early.
    DeviceFailed {
        /// Inventory host.
        host: String,
        /// Failure cause.
        cause: String,
    },
}

fn status_suffix(success: bool) -> &'static str {
    if success {
        ""
    } else {
        " (FAILED)"
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogEntry::DeviceHeader { hostname } => {
                let banner = "=".repeat(BANNER_WIDTH);
                write!(
                    f,
                    "\n\n{banner}\nConfiguring {hostname}\n{banner}\n{}\n",
                    chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
                )
            }
            LogEntry::PortsDetected { trunk, access } => write!(
                f,
                "Trunk Ports Detected:\n{:?}\n\nAccess Ports Detected:\n{:?}\n",
                trunk, access
            ),
            LogEntry::ConfigStarted => write!(f, "Starting configuration..."),
            LogEntry::PortResult {
                host,
                role,
                port,
                output,
                success,
            } => write!(
                f,
                "[{}] {} Port {} Config{}:\n{}\n",
                host,
                role,
                port,
                status_suffix(*success),
                output
            ),
            LogEntry::GlobalResult {
                host,
                output,
                success,
            } => write!(
                f,
                "[{}] Global Configuration Result{}:\n{}\n",
                host,
                status_suffix(*success),
                output
            ),
            LogEntry::SaveResult {
                host,
                output,
                success,
            } => write!(
                f,
                "[{}] Configuration Saved{}:\n{}\n",
                host,
                status_suffix(*success),
                output
            ),
            LogEntry::DeviceFailed { host, cause } => {
                writeln!(f, "Configuration of {} FAILED: {}", host, cause)
            }
        }
    }
}

/// Append-only sink for audit entries.
///
/// `append` must not block on durability.
pub trait LogSink: Send + Sync {
    /// Queues an entry for writing.
    fn append(&self, entry: LogEntry);
}

/// Sink that forwards entries to `tracing` at INFO level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogSink;

impl LogSink for TracingLogSink {
    fn append(&self, entry: LogEntry) {
        info!(target: "snoop_audit", "{}", entry.to_string().trim());
    }
}

enum WriterMsg {
    Entry(String),
    Close(oneshot::Sender<()>),
}

/// File-backed sink with a dedicated writer task.
///
/// Must be created inside a tokio runtime.
pub struct FileLogSink {
    path: PathBuf,
    tx: mpsc::UnboundedSender<WriterMsg>,
}

impl FileLogSink {
    /// Opens `path` for appending and starts the writer task.
    pub async fn open(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;

        let (tx, mut rx) = mpsc::unbounded_channel::<WriterMsg>();
        let writer_path = path.clone();

        tokio::spawn(async move {
            while let Some(msg) = rx.recv().await {
                match msg {
                    WriterMsg::Entry(text) => {
                        let line = format!("{}\n", text);
                        if let Err(e) = file.write_all(line.as_bytes()).await {
                            warn!(
                                path = %writer_path.display(),
                                error = %e,
                                "Audit log write failed"
                            );
                        }
                    }
                    WriterMsg::Close(ack) => {
                        if let Err(e) = file.flush().await {
                            warn!(
                                path = %writer_path.display(),
                                error = %e,
                                "Audit log flush failed"
                            );
                        }
                        let _ = ack.send(());
                        break;
                    }
                }
            }
            debug!(path = %writer_path.display(), "Audit log writer stopped");
        });

        Ok(Self { path, tx })
    }

    /// Returns the log file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Drains queued entries, flushes and stops the writer task.
    ///
    /// Entries appended afterwards are dropped.
    pub async fn close(&self) {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self.tx.send(WriterMsg::Close(ack_tx)).is_ok() {
            let _ = ack_rx.await;
        }
    }
}

impl LogSink for FileLogSink {
    fn append(&self, entry: LogEntry) {
        if self.tx.send(WriterMsg::Entry(entry.to_string())).is_err() {
            debug!(path = %self.path.display(), "Audit log closed, entry dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_header_banner() {
        let text = LogEntry::DeviceHeader {
            hostname: "sw-core-1".to_string(),
        }
        .to_string();
        assert!(text.contains("Configuring sw-core-1"));
        assert!(text.contains(&"=".repeat(BANNER_WIDTH)));
    }

    #[test]
    fn test_ports_detected_lists() {
        let text = LogEntry::PortsDetected {
            trunk: vec!["Gi1/0/2".to_string()],
            access: vec!["Gi1/0/1".to_string(), "Fa1/0/3".to_string()],
        }
        .to_string();
        assert!(text.contains("Trunk Ports Detected:\n[\"Gi1/0/2\"]"));
        assert!(text.contains("Access Ports Detected:\n[\"Gi1/0/1\", \"Fa1/0/3\"]"));
    }

    #[test]
    fn test_port_result_marks_failure() {
        let ok = LogEntry::PortResult {
            host: "10.0.0.1".to_string(),
            role: "Access".to_string(),
            port: "Gi1/0/1".to_string(),
            output: "done".to_string(),
            success: true,
        };
        assert!(ok
            .to_string()
            .starts_with("[10.0.0.1] Access Port Gi1/0/1 Config:\n"));

        let failed = LogEntry::PortResult {
            host: "10.0.0.1".to_string(),
            role: "Trunk".to_string(),
            port: "Gi1/0/2".to_string(),
            output: "timeout".to_string(),
            success: false,
        };
        assert!(failed.to_string().contains("Config (FAILED):"));
    }

    #[test]
    fn test_save_result_display() {
        let text = LogEntry::SaveResult {
            host: "sw1".to_string(),
            output: "[OK]".to_string(),
            success: true,
        }
        .to_string();
        assert_eq!(text, "[sw1] Configuration Saved:\n[OK]\n");
    }

    #[tokio::test]
    async fn test_file_sink_appends_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dhcp_snooping.log");

        let sink = FileLogSink::open(&path).await.unwrap();
        sink.append(LogEntry::ConfigStarted);
        sink.append(LogEntry::GlobalResult {
            host: "sw1".to_string(),
            output: "ip dhcp snooping".to_string(),
            success: true,
        });
        sink.close().await;

        let content = std::fs::read_to_string(&path).unwrap();
        let started = content.find("Starting configuration...").unwrap();
        let global = content.find("Global Configuration Result:").unwrap();
        assert!(started < global);
    }

    #[tokio::test]
    async fn test_file_sink_appends_to_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.log");
        std::fs::write(&path, "previous run\n").unwrap();

        let sink = FileLogSink::open(&path).await.unwrap();
        sink.append(LogEntry::ConfigStarted);
        sink.close().await;

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("previous run\n"));
        assert!(content.contains("Starting configuration..."));
    }

    #[tokio::test]
    async fn test_file_sink_drops_after_close() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.log");

        let sink = FileLogSink::open(&path).await.unwrap();
        sink.close().await;
        sink.append(LogEntry::ConfigStarted);

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.is_empty());
    }
}
