use crate::config::DashboardConfig;
use crate::rig_interface::{CommandKind, PipelineStage, RigSettings, SensorSnapshot, VideoFrame};
use crate::series::{LogFeed, RollingSeries};
use crate::telemetry::EventCounters;

pub const DEFAULT_STAGE_DESCRIPTION: &str = "System idle";
pub const SYSTEM_ONLINE: &str = "System Online - Monitoring Active";
pub const SYSTEM_OFFLINE: &str = "System Offline";
pub const CONNECTION_LOST: &str = "Connection Lost";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlertState {
    pub active: bool,
    pub message: String,
}

/// Session flags derived from confirmed commands, never from snapshots.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub running: bool,
    pub alarm_armed: bool,
    pub pending: Vec<CommandKind>,
}

impl SessionState {
    pub fn is_pending(&self, kind: CommandKind) -> bool {
        self.pending.contains(&kind)
    }

    pub fn start_stop_pending(&self) -> bool {
        self.is_pending(CommandKind::StartMonitoring) || self.is_pending(CommandKind::StopMonitoring)
    }

    pub(crate) fn mark_pending(&mut self, kind: CommandKind) {
        if !self.is_pending(kind) {
            self.pending.push(kind);
        }
    }

    pub(crate) fn clear_pending(&mut self, kind: CommandKind) {
        self.pending.retain(|k| *k != kind);
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub smoke: f64,
    pub temperature: f64,
}

impl Thresholds {
    /// Strict `>` comparison, recomputed from scratch for each snapshot.
    pub fn evaluate(&self, snapshot: &SensorSnapshot) -> ThresholdFlags {
        ThresholdFlags {
            smoke_exceeded: snapshot.smoke_level > self.smoke,
            temperature_exceeded: snapshot.temperature > self.temperature,
        }
    }
}

impl From<&RigSettings> for Thresholds {
    fn from(settings: &RigSettings) -> Self {
        Self {
            smoke: settings.smoke_threshold,
            temperature: settings.temp_threshold,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ThresholdFlags {
    pub smoke_exceeded: bool,
    pub temperature_exceeded: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemStatus {
    pub online: bool,
    pub text: String,
}

impl SystemStatus {
    pub fn online() -> Self {
        Self {
            online: true,
            text: SYSTEM_ONLINE.into(),
        }
    }

    pub fn offline(text: &str) -> Self {
        Self {
            online: false,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ChannelStatus {
    #[default]
    Connecting,
    Connected,
    Lost,
}

/// Everything the dashboard shows, owned by the reconciler.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardState {
    pub snapshot: SensorSnapshot,
    pub stage: PipelineStage,
    pub stage_description: String,
    pub thresholds: Thresholds,
    pub flags: ThresholdFlags,
    pub alert: AlertState,
    pub session: SessionState,
    pub system: SystemStatus,
    pub channel: ChannelStatus,
    pub series: RollingSeries,
    pub log: LogFeed,
    pub frame: Option<VideoFrame>,
    pub settings: Option<RigSettings>,
    pub counters: EventCounters,
    pub revision: u64,
}

impl DashboardState {
    pub fn new(config: &DashboardConfig) -> Self {
        Self {
            snapshot: SensorSnapshot::default(),
            stage: PipelineStage::Idle,
            stage_description: DEFAULT_STAGE_DESCRIPTION.into(),
            thresholds: Thresholds {
                smoke: config.smoke_threshold,
                temperature: config.temp_threshold,
            },
            flags: ThresholdFlags::default(),
            alert: AlertState::default(),
            session: SessionState::default(),
            system: SystemStatus::offline(SYSTEM_OFFLINE),
            channel: ChannelStatus::default(),
            series: RollingSeries::with_capacity(config.series_capacity),
            log: LogFeed::with_capacity(config.log_capacity),
            frame: None,
            settings: None,
            counters: EventCounters::new(),
            revision: 0,
        }
    }
}

impl Default for DashboardState {
    fn default() -> Self {
        Self::new(&DashboardConfig::default())
    }
}
