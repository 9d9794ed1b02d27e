use crate::rig_interface::{LogEntry, Severity};
use log::{error, info, warn};

/// Mirrors activity-feed entries onto the `log` facade.
#[derive(Debug, Clone, Copy)]
pub struct LogManager;

impl LogManager {
    pub fn new() -> Self {
        Self
    }

    pub fn record(&self, entry: &LogEntry) {
        match entry.severity {
            Severity::Error => error!("[{}] {}", entry.timestamp, entry.message),
            Severity::Warning => warn!("[{}] {}", entry.timestamp, entry.message),
            Severity::Info | Severity::Success => {
                info!("[{}] {}", entry.timestamp, entry.message)
            }
        }
    }
}

impl Default for LogManager {
    fn default() -> Self {
        Self::new()
    }
}
