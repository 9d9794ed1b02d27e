use crate::config::DashboardConfig;
use crate::prelude::{Clock, GuardRejection, SystemClock, TransportError, TransportResult};
use crate::reconciler::state::{
    AlertState, ChannelStatus, DashboardState, SystemStatus, Thresholds, CONNECTION_LOST,
    DEFAULT_STAGE_DESCRIPTION, SYSTEM_OFFLINE,
};
use crate::rig_interface::{
    Command, CommandKind, CommandReply, PushEvent, RigSettings, SensorSnapshot, Severity,
    VideoFrame,
};
use crate::series::SeriesPoint;

pub const SNAPSHOT_FIRE_MESSAGE: &str = "Fire detected by sensors and camera!";
pub const FRAME_FIRE_MESSAGE: &str = "Fire detected in camera feed";
pub const ALARM_TRIGGERED_MESSAGE: &str = "Alarm system activated";

/// Everything that can change the dashboard state.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Push(PushEvent),
    PushFailed(TransportError),
    Resolved {
        command: CommandKind,
        outcome: TransportResult<CommandReply>,
    },
}

/// Single writer of [`DashboardState`].
///
/// Transitions are synchronous and never touch the network. Commands go
/// through [`Reconciler::begin`] first, and their outcome comes back as
/// [`Inbound::Resolved`]; nothing is flipped before the backend confirms.
pub struct Reconciler<C: Clock = SystemClock> {
    state: DashboardState,
    clock: C,
    submitted_settings: Option<RigSettings>,
    status_loaded: bool,
}

impl Reconciler<SystemClock> {
    pub fn new(config: &DashboardConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }
}

impl<C: Clock> Reconciler<C> {
    pub fn with_clock(config: &DashboardConfig, clock: C) -> Self {
        let mut reconciler = Self {
            state: DashboardState::new(config),
            clock,
            submitted_settings: None,
            status_loaded: false,
        };
        reconciler.log("Fire Detection System initialized", Severity::Success);
        reconciler
    }

    pub fn state(&self) -> &DashboardState {
        &self.state
    }

    /// Periodic status refresh only runs while a monitoring session is active.
    pub fn should_poll(&self) -> bool {
        self.state.session.running && !self.state.session.is_pending(CommandKind::FetchStatus)
    }

    /// Client-side guard. On success the command is marked in flight and may be sent.
    pub fn begin(&mut self, command: &Command) -> Result<(), GuardRejection> {
        let kind = command.kind();
        let session = &self.state.session;
        let verdict = match kind {
            CommandKind::StartMonitoring if session.running => Err(GuardRejection::AlreadyRunning),
            CommandKind::StopMonitoring if !session.running => Err(GuardRejection::NotRunning),
            CommandKind::StartMonitoring | CommandKind::StopMonitoring
                if session.start_stop_pending() =>
            {
                Err(GuardRejection::Pending(kind))
            }
            CommandKind::StopAlarm if !session.alarm_armed => Err(GuardRejection::AlarmNotArmed),
            _ if session.is_pending(kind) => Err(GuardRejection::Pending(kind)),
            _ => Ok(()),
        };

        match verdict {
            Ok(()) => {
                if let Command::UpdateSettings(settings) = command {
                    self.submitted_settings = Some(settings.clone());
                }
                self.state.session.mark_pending(kind);
                self.state.counters.record_command();
                self.touch();
                Ok(())
            }
            Err(rejection) => {
                if kind != CommandKind::FetchStatus {
                    let message = format!("Cannot {}: {}", kind.describe(), rejection);
                    self.log(message, Severity::Warning);
                    self.touch();
                }
                Err(rejection)
            }
        }
    }

    /// Applies one inbound item and reports whether the state changed.
    pub fn apply(&mut self, inbound: Inbound) -> bool {
        let before = self.state.revision;
        match inbound {
            Inbound::Push(event) => self.apply_push(event),
            Inbound::PushFailed(TransportError::ChannelLost(reason)) => {
                log::warn!("push channel lost: {reason}");
                self.apply_push(PushEvent::Disconnected);
            }
            Inbound::PushFailed(err) => {
                self.state.counters.record_error();
                self.log(format!("Push channel error: {err}"), Severity::Error);
            }
            Inbound::Resolved { command, outcome } => self.resolve(command, outcome),
        }
        self.state.revision != before
    }

    fn apply_push(&mut self, event: PushEvent) {
        match event {
            PushEvent::Connected => {
                self.state.channel = ChannelStatus::Connected;
                self.log("Connected to server", Severity::Success);
            }
            PushEvent::Disconnected => {
                if self.state.channel == ChannelStatus::Lost {
                    return;
                }
                self.state.channel = ChannelStatus::Lost;
                self.state.system = SystemStatus::offline(CONNECTION_LOST);
                self.log("Disconnected from server", Severity::Error);
            }
            PushEvent::Snapshot(snapshot) => self.ingest_snapshot(snapshot),
            PushEvent::Frame(frame) => self.ingest_frame(frame),
            PushEvent::AlarmTriggered => {
                self.raise_alert(ALARM_TRIGGERED_MESSAGE, "🚨 ALARM TRIGGERED!")
            }
            PushEvent::AlarmStopped => {
                self.clear_alert("Alarm stopped");
            }
            PushEvent::Log { message, severity } => self.log(message, severity),
        }
    }

    /// Replaces the displayed reading wholesale; last write wins.
    fn ingest_snapshot(&mut self, snapshot: SensorSnapshot) {
        let stamp = self.clock.now_label();
        self.state.flags = self.state.thresholds.evaluate(&snapshot);
        // The caption follows the stage; without a stage both stay as they were.
        if let Some(stage) = snapshot.monitoring_stage {
            self.state.stage = stage;
            self.state.stage_description = snapshot
                .stage_description
                .clone()
                .unwrap_or_else(|| DEFAULT_STAGE_DESCRIPTION.to_string());
        }
        self.state.series.push(SeriesPoint::new(
            stamp,
            snapshot.smoke_level,
            snapshot.temperature,
        ));
        let fire = snapshot.fire_detected;
        self.state.snapshot = snapshot;
        self.state.counters.record_snapshot();
        self.touch();

        if fire {
            self.raise_alert(SNAPSHOT_FIRE_MESSAGE, "🚨 FIRE DETECTED! Alarm triggered!");
        }
    }

    fn ingest_frame(&mut self, frame: VideoFrame) {
        let fire = frame.fire_detected;
        self.state.frame = Some(frame);
        self.state.counters.record_frame();
        self.touch();

        if fire {
            self.raise_alert(FRAME_FIRE_MESSAGE, FRAME_FIRE_MESSAGE);
        }
    }

    /// Inactive → Active. Re-raising an active alert only re-arms stop-alarm.
    fn raise_alert(&mut self, message: &str, log_line: &str) {
        if self.state.alert.active {
            if !self.state.session.alarm_armed {
                self.state.session.alarm_armed = true;
                self.touch();
            }
            return;
        }
        self.state.alert = AlertState {
            active: true,
            message: message.to_string(),
        };
        self.state.session.alarm_armed = true;
        self.log(log_line, Severity::Error);
    }

    /// Active → Inactive. The stop-alarm control is disarmed either way.
    fn clear_alert(&mut self, log_line: &str) {
        if self.state.session.alarm_armed {
            self.state.session.alarm_armed = false;
            self.touch();
        }
        if !self.state.alert.active {
            return;
        }
        self.state.alert = AlertState::default();
        self.log(log_line, Severity::Warning);
    }

    fn resolve(&mut self, command: CommandKind, outcome: TransportResult<CommandReply>) {
        self.state.session.clear_pending(command);
        self.touch();
        let submitted = if command == CommandKind::UpdateSettings {
            self.submitted_settings.take()
        } else {
            None
        };

        let first_status = command == CommandKind::FetchStatus && !self.status_loaded;
        if command == CommandKind::FetchStatus {
            self.status_loaded = true;
        }

        let reply = match outcome {
            Ok(reply) => reply,
            Err(err) if first_status => {
                self.state.counters.record_error();
                return self.log(
                    format!("Failed to load initial status: {err}"),
                    Severity::Error,
                );
            }
            Err(err) => return self.command_failed(command, &err),
        };

        match (command, reply) {
            (CommandKind::StartMonitoring, CommandReply::Started) => {
                self.state.session.running = true;
                self.state.system = SystemStatus::online();
                self.log("System started monitoring", Severity::Success);
            }
            (CommandKind::StopMonitoring, CommandReply::Stopped) => {
                self.state.session.running = false;
                self.state.session.alarm_armed = false;
                self.state.frame = None;
                self.state.system = SystemStatus::offline(SYSTEM_OFFLINE);
                self.log("System stopped monitoring", Severity::Warning);
            }
            (CommandKind::StopAlarm, CommandReply::AlarmStop { success: true }) => {
                self.clear_alert("Alarm manually stopped");
            }
            (CommandKind::StopAlarm, CommandReply::AlarmStop { success: false }) => {
                self.log("Alarm could not be stopped by the rig", Severity::Warning);
            }
            (CommandKind::LoadSettings, CommandReply::Settings(settings)) => {
                self.adopt_settings(settings);
            }
            (CommandKind::UpdateSettings, CommandReply::SettingsUpdated) => {
                if let Some(settings) = submitted {
                    self.adopt_settings(settings);
                }
                self.log("Settings updated successfully", Severity::Success);
            }
            (CommandKind::FetchStatus, CommandReply::Status(snapshot)) => {
                self.ingest_snapshot(snapshot);
            }
            (command, reply) => {
                let err = TransportError::Protocol(format!("unexpected reply {reply:?}"));
                self.command_failed(command, &err);
            }
        }
    }

    fn adopt_settings(&mut self, settings: RigSettings) {
        self.state.thresholds = Thresholds::from(&settings);
        self.state.flags = self.state.thresholds.evaluate(&self.state.snapshot);
        self.state.settings = Some(settings);
        self.touch();
    }

    fn command_failed(&mut self, command: CommandKind, err: &TransportError) {
        self.state.counters.record_error();
        self.log(
            format!("Failed to {}: {}", command.describe(), err),
            Severity::Error,
        );
    }

    fn log(&mut self, message: impl Into<String>, severity: Severity) {
        let stamp = self.clock.now_label();
        self.state.log.append(stamp, message, severity);
        self.touch();
    }

    fn touch(&mut self) {
        self.state.revision += 1;
    }
}
