use firecore::rig_interface::{PipelineStage, PushEnvelope, RawSnapshot, RigSettings, Severity};
use serde::Deserialize;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::broadcast;

const EVENT_BACKLOG: usize = 256;

/// Backend-side status, mirroring what `/api/status` serves.
#[derive(Debug, Clone)]
pub struct RigModel {
    pub smoke_level: f64,
    pub temperature: f64,
    pub fire_detected: bool,
    pub alarm_active: bool,
    pub last_update: Option<String>,
    pub camera_online: bool,
    pub esp32_online: bool,
    pub stage: PipelineStage,
    pub stage_description: String,
    pub monitoring: bool,
    pub run_id: u64,
    pub settings: RigSettings,
}

impl RigModel {
    pub fn new(settings: RigSettings) -> Self {
        Self {
            smoke_level: 0.0,
            temperature: 0.0,
            fire_detected: false,
            alarm_active: false,
            last_update: None,
            camera_online: false,
            esp32_online: false,
            stage: PipelineStage::Idle,
            stage_description: "System is idle".into(),
            monitoring: false,
            run_id: 0,
            settings,
        }
    }

    pub fn to_wire(&self) -> RawSnapshot {
        let link = |online: bool| if online { "online" } else { "offline" };
        RawSnapshot {
            smoke_level: Some(self.smoke_level),
            temperature: Some(self.temperature),
            esp32_status: Some(link(self.esp32_online).into()),
            camera_status: Some(link(self.camera_online).into()),
            monitoring_stage: Some(self.stage.as_str().into()),
            stage_description: Some(self.stage_description.clone()),
            fire_detected: Some(self.fire_detected),
            alarm_active: Some(self.alarm_active),
            last_update: self.last_update.clone(),
        }
    }

    pub fn set_stage(&mut self, stage: PipelineStage, description: &str) {
        self.stage = stage;
        self.stage_description = description.into();
    }
}

/// Partial settings update; absent fields keep their current value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingsPatch {
    pub esp_ip: Option<String>,
    pub smoke_threshold: Option<f64>,
    pub temp_threshold: Option<f64>,
}

impl SettingsPatch {
    pub fn apply(self, settings: &mut RigSettings) {
        if let Some(esp_ip) = self.esp_ip {
            settings.esp_ip = esp_ip;
        }
        if let Some(smoke) = self.smoke_threshold {
            settings.smoke_threshold = smoke;
        }
        if let Some(temp) = self.temp_threshold {
            settings.temp_threshold = temp;
        }
    }
}

/// Shared handle on the simulated rig: status model plus push fan-out.
#[derive(Clone)]
pub struct RigHandle {
    model: Arc<RwLock<RigModel>>,
    events: broadcast::Sender<String>,
}

impl RigHandle {
    pub fn new(settings: RigSettings) -> Self {
        let (events, _) = broadcast::channel(EVENT_BACKLOG);
        Self {
            model: Arc::new(RwLock::new(RigModel::new(settings))),
            events,
        }
    }

    pub fn read<R>(&self, f: impl FnOnce(&RigModel) -> R) -> R {
        let guard = self.model.read().unwrap_or_else(PoisonError::into_inner);
        f(&guard)
    }

    pub fn update<R>(&self, f: impl FnOnce(&mut RigModel) -> R) -> R {
        let mut guard = self.model.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.events.subscribe()
    }

    /// Pushes an envelope to every connected dashboard; no listeners is fine.
    pub fn emit(&self, envelope: PushEnvelope) {
        let _ = self.events.send(envelope.to_text());
    }

    pub fn emit_status(&self) {
        let wire = self.read(RigModel::to_wire);
        self.emit(PushEnvelope::status(&wire));
    }

    pub fn log(&self, message: &str, severity: Severity) {
        log::info!("[rig] {message}");
        self.emit(PushEnvelope::log(message, severity));
    }

    pub fn is_current(&self, run_id: u64) -> bool {
        self.read(|m| m.monitoring && m.run_id == run_id)
    }

    pub fn settings(&self) -> RigSettings {
        self.read(|m| m.settings.clone())
    }
}
