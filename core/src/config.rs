use crate::series::{DEFAULT_LOG_CAPACITY, DEFAULT_SERIES_CAPACITY};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("reading dashboard config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("parsing dashboard config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },
}

/// Dashboard settings. Every field has a default, so a partial YAML file is fine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub backend_url: String,
    pub push_url: String,
    pub poll_interval_secs: u64,
    pub request_timeout_secs: u64,
    pub reconnect_delay_secs: u64,
    pub smoke_threshold: f64,
    pub temp_threshold: f64,
    pub series_capacity: usize,
    pub log_capacity: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            backend_url: "http://127.0.0.1:5000".into(),
            push_url: "ws://127.0.0.1:5000/socket".into(),
            poll_interval_secs: 30,
            request_timeout_secs: 15,
            reconnect_delay_secs: 3,
            smoke_threshold: 2600.0,
            temp_threshold: 60.0,
            series_capacity: DEFAULT_SERIES_CAPACITY,
            log_capacity: DEFAULT_LOG_CAPACITY,
        }
    }
}

impl DashboardConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref).map_err(|source| ConfigError::Io {
            path: path_ref.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path_ref.to_path_buf(),
            source,
        })
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.reconnect_delay_secs)
    }
}
