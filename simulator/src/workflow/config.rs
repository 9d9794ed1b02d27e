use anyhow::Context;
use firecore::rig_interface::RigSettings;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Script for one simulated rig: sensor behaviour, camera outcome and timings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    pub esp_ip: String,
    pub esp_online: bool,
    pub smoke_threshold: f64,
    pub temp_threshold: f64,
    pub smoke_baseline: f64,
    pub smoke_noise: f64,
    pub smoke_spike: f64,
    /// Smoke ticks before the spike; `None` keeps readings at baseline forever.
    pub spike_after_ticks: Option<u32>,
    pub smoke_interval_ms: u64,
    pub camera_frames: u32,
    pub camera_confirms: bool,
    pub frame_interval_ms: u64,
    pub temp_ambient: f64,
    pub temp_ramp: f64,
    pub temp_checks: u32,
    pub temp_interval_ms: u64,
    pub cooldown_ms: u64,
    pub seed: u64,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            esp_ip: "192.168.2.131".into(),
            esp_online: true,
            smoke_threshold: 2600.0,
            temp_threshold: 60.0,
            smoke_baseline: 1800.0,
            smoke_noise: 150.0,
            smoke_spike: 3200.0,
            spike_after_ticks: Some(12),
            smoke_interval_ms: 5000,
            camera_frames: 40,
            camera_confirms: true,
            frame_interval_ms: 100,
            temp_ambient: 24.0,
            temp_ramp: 2.5,
            temp_checks: 20,
            temp_interval_ms: 1000,
            cooldown_ms: 5000,
            seed: 0,
        }
    }
}

impl ScenarioConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading scenario {}", path_ref.display()))?;
        let config: ScenarioConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing scenario {}", path_ref.display()))?;
        Ok(config)
    }

    pub fn initial_settings(&self) -> RigSettings {
        RigSettings {
            esp_ip: self.esp_ip.clone(),
            smoke_threshold: self.smoke_threshold,
            temp_threshold: self.temp_threshold,
        }
    }

    pub fn smoke_interval(&self) -> Duration {
        Duration::from_millis(self.smoke_interval_ms)
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }

    pub fn temp_interval(&self) -> Duration {
        Duration::from_millis(self.temp_interval_ms)
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn defaults_produce_initial_settings() {
        let cfg = ScenarioConfig::default();
        let settings = cfg.initial_settings();
        assert_eq!(settings.smoke_threshold, 2600.0);
        assert_eq!(cfg.smoke_interval(), Duration::from_secs(5));
    }

    #[test]
    fn scenario_load_reads_yaml() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(b"camera_confirms: false\nspike_after_ticks: 3\nseed: 7\n")
            .unwrap();
        let path = temp.into_temp_path();
        let cfg = ScenarioConfig::load(&path).unwrap();
        assert!(!cfg.camera_confirms);
        assert_eq!(cfg.spike_after_ticks, Some(3));
        assert_eq!(cfg.seed, 7);
        assert_eq!(cfg.temp_checks, 20);
    }
}
