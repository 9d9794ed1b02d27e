use crate::rig_interface::{LogEntry, Severity};
use crate::series::bounded::Bounded;
use crate::telemetry::LogManager;

pub const DEFAULT_LOG_CAPACITY: usize = 100;

/// Append-only activity feed bounded to the most recent entries.
#[derive(Debug, Clone)]
pub struct LogFeed {
    entries: Bounded<LogEntry>,
    logger: LogManager,
}

impl LogFeed {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Bounded::with_capacity(capacity),
            logger: LogManager::new(),
        }
    }

    pub fn push(&mut self, entry: LogEntry) {
        self.logger.record(&entry);
        self.entries.push(entry);
    }

    pub fn append(&mut self, timestamp: String, message: impl Into<String>, severity: Severity) {
        self.push(LogEntry::new(timestamp, message, severity));
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.to_vec()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &LogEntry> + ExactSizeIterator {
        self.entries.iter()
    }

    pub fn last(&self) -> Option<&LogEntry> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for LogFeed {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_LOG_CAPACITY)
    }
}

impl PartialEq for LogFeed {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}
