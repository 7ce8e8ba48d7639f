//! In-memory audit log for assertions.

use parking_lot::Mutex;

use snoop_common::{LogEntry, LogSink};

/// Sink that keeps every entry in memory.
#[derive(Debug, Default)]
pub struct MemoryLogSink {
    entries: Mutex<Vec<LogEntry>>,
}

impl MemoryLogSink {
    /// Creates an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// All entries in append order
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().clone()
    }

    /// Rendered entries in append order
    pub fn texts(&self) -> Vec<String> {
        self.entries.lock().iter().map(ToString::to_string).collect()
    }

    /// Number of entries matching a predicate
    pub fn count(&self, predicate: impl Fn(&LogEntry) -> bool) -> usize {
        self.entries.lock().iter().filter(|e| predicate(e)).count()
    }
}

impl LogSink for MemoryLogSink {
    fn append(&self, entry: LogEntry) {
        self.entries.lock().push(entry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_sink_records_in_order() {
        let sink = MemoryLogSink::new();
        sink.append(LogEntry::ConfigStarted);
        sink.append(LogEntry::SaveResult {
            host: "sw1".to_string(),
            output: "[OK]".to_string(),
            success: true,
        });

        let entries = sink.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0], LogEntry::ConfigStarted);
        assert_eq!(
            sink.count(|e| matches!(e, LogEntry::SaveResult { .. })),
            1
        );
        assert_eq!(sink.texts()[0], "Starting configuration...");
    }
}
