use serde::{Deserialize, Serialize};

/// Reachability of a rig peripheral as reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkStatus {
    Online,
    #[default]
    Offline,
}

impl LinkStatus {
    /// Anything other than `online` (including a missing field) reads as offline.
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some(raw) if raw.eq_ignore_ascii_case("online") => LinkStatus::Online,
            _ => LinkStatus::Offline,
        }
    }

    pub fn is_online(self) -> bool {
        matches!(self, LinkStatus::Online)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LinkStatus::Online => "online",
            LinkStatus::Offline => "offline",
        }
    }
}

/// Phase of the backend's fire-confirmation sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    #[default]
    Idle,
    SmokeMonitoring,
    CameraVerification,
    TempFallback,
    FireConfirmed,
}

impl PipelineStage {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "idle" => Some(PipelineStage::Idle),
            "smoke_monitoring" => Some(PipelineStage::SmokeMonitoring),
            "camera_verification" => Some(PipelineStage::CameraVerification),
            "temp_fallback" => Some(PipelineStage::TempFallback),
            "fire_confirmed" => Some(PipelineStage::FireConfirmed),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PipelineStage::Idle => "idle",
            PipelineStage::SmokeMonitoring => "smoke_monitoring",
            PipelineStage::CameraVerification => "camera_verification",
            PipelineStage::TempFallback => "temp_fallback",
            PipelineStage::FireConfirmed => "fire_confirmed",
        }
    }
}

/// Status payload exactly as it travels over the wire; every field may be absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub smoke_level: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub esp32_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub camera_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monitoring_stage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fire_detected: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alarm_active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_update: Option<String>,
}

/// A full sensor/status reading with defaults applied.
///
/// `monitoring_stage` stays `None` when the payload did not carry a stage the
/// client understands; the reconciler then keeps the stage it already shows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SensorSnapshot {
    pub smoke_level: f64,
    pub temperature: f64,
    pub esp32_status: LinkStatus,
    pub camera_status: LinkStatus,
    pub monitoring_stage: Option<PipelineStage>,
    pub stage_description: Option<String>,
    pub fire_detected: bool,
}

impl From<RawSnapshot> for SensorSnapshot {
    fn from(raw: RawSnapshot) -> Self {
        Self {
            smoke_level: raw.smoke_level.filter(|v| v.is_finite()).unwrap_or(0.0),
            temperature: raw.temperature.filter(|v| v.is_finite()).unwrap_or(0.0),
            esp32_status: LinkStatus::parse(raw.esp32_status.as_deref()),
            camera_status: LinkStatus::parse(raw.camera_status.as_deref()),
            monitoring_stage: raw.monitoring_stage.as_deref().and_then(PipelineStage::parse),
            stage_description: raw.stage_description.filter(|d| !d.trim().is_empty()),
            fire_detected: raw.fire_detected.unwrap_or(false),
        }
    }
}

impl SensorSnapshot {
    pub fn from_json(value: serde_json::Value) -> serde_json::Result<Self> {
        serde_json::from_value::<RawSnapshot>(value).map(Self::from)
    }
}
