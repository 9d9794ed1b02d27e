//! Pure projection from reconciled state to what the dashboard draws.
//!
//! Nothing here holds state or performs I/O; the GUI renders a
//! [`DashboardView`] and sends intents back to the driver.

use crate::reconciler::DashboardState;
use crate::rig_interface::{CommandKind, LinkStatus, PipelineStage, Severity};
use std::sync::Arc;

pub const NO_ALERTS: &str = "No Alerts";
pub const FIRE_HEADLINE: &str = "🚨 FIRE DETECTED!";

#[derive(Debug, Clone, PartialEq)]
pub struct Indicator {
    pub online: bool,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StageLamp {
    pub label: &'static str,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AlertPanel {
    pub firing: bool,
    pub headline: String,
    pub details: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Controls {
    pub start_enabled: bool,
    pub stop_enabled: bool,
    pub stop_alarm_enabled: bool,
    pub settings_enabled: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum VideoSurface {
    Placeholder,
    Frame { image: Arc<[u8]>, highlighted: bool },
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChartSeries {
    pub labels: Vec<String>,
    pub smoke: Vec<f64>,
    pub temperature: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogLine {
    pub time: String,
    pub message: String,
    pub severity: Severity,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardView {
    pub system: Indicator,
    pub smoke_text: String,
    pub temperature_text: String,
    pub smoke_exceeded: bool,
    pub temperature_exceeded: bool,
    pub esp32: Indicator,
    pub camera: Indicator,
    pub stages: [StageLamp; 3],
    pub stage_description: String,
    pub alert: AlertPanel,
    pub controls: Controls,
    pub video: VideoSurface,
    pub chart: ChartSeries,
    pub log: Vec<LogLine>,
    pub footer: String,
}

impl DashboardView {
    pub fn project(state: &DashboardState) -> Self {
        let snapshot = &state.snapshot;
        let session = &state.session;

        Self {
            system: Indicator {
                online: state.system.online,
                text: state.system.text.clone(),
            },
            smoke_text: format_reading(snapshot.smoke_level),
            temperature_text: format_reading(snapshot.temperature),
            smoke_exceeded: state.flags.smoke_exceeded,
            temperature_exceeded: state.flags.temperature_exceeded,
            esp32: link_indicator(snapshot.esp32_status),
            camera: link_indicator(snapshot.camera_status),
            stages: stage_lamps(state.stage),
            stage_description: state.stage_description.clone(),
            alert: if state.alert.active {
                AlertPanel {
                    firing: true,
                    headline: FIRE_HEADLINE.into(),
                    details: vec![
                        "IMMEDIATE ACTION REQUIRED!".into(),
                        state.alert.message.clone(),
                    ],
                }
            } else {
                AlertPanel {
                    firing: false,
                    headline: NO_ALERTS.into(),
                    details: vec!["System monitoring for fire hazards...".into()],
                }
            },
            controls: Controls {
                start_enabled: !session.running && !session.start_stop_pending(),
                stop_enabled: session.running && !session.start_stop_pending(),
                stop_alarm_enabled: session.alarm_armed
                    && !session.is_pending(CommandKind::StopAlarm),
                settings_enabled: !session.is_pending(CommandKind::UpdateSettings),
            },
            video: match &state.frame {
                Some(frame) => VideoSurface::Frame {
                    image: frame.jpeg.clone(),
                    highlighted: frame.fire_detected,
                },
                None => VideoSurface::Placeholder,
            },
            chart: ChartSeries {
                labels: state.series.labels(),
                smoke: state.series.smoke(),
                temperature: state.series.temperature(),
            },
            log: state
                .log
                .iter()
                .map(|entry| LogLine {
                    time: format!("[{}]", entry.timestamp),
                    message: entry.message.clone(),
                    severity: entry.severity,
                })
                .collect(),
            footer: {
                let (snapshots, frames, commands, errors) = state.counters.snapshot();
                format!(
                    "{snapshots} snapshots · {frames} frames · {commands} commands · {errors} errors"
                )
            },
        }
    }
}

/// `fire_confirmed` lights every lamp; `idle` lights none.
fn stage_lamps(stage: PipelineStage) -> [StageLamp; 3] {
    let all = stage == PipelineStage::FireConfirmed;
    [
        StageLamp {
            label: "Smoke",
            active: all || stage == PipelineStage::SmokeMonitoring,
        },
        StageLamp {
            label: "Camera",
            active: all || stage == PipelineStage::CameraVerification,
        },
        StageLamp {
            label: "Temperature",
            active: all || stage == PipelineStage::TempFallback,
        },
    ]
}

fn link_indicator(status: LinkStatus) -> Indicator {
    Indicator {
        online: status.is_online(),
        text: match status {
            LinkStatus::Online => "Online".into(),
            LinkStatus::Offline => "Offline".into(),
        },
    }
}

fn format_reading(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.1}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DashboardConfig;
    use crate::prelude::Clock;
    use crate::reconciler::{Inbound, Reconciler};
    use crate::rig_interface::{Command, CommandReply, PushEvent, SensorSnapshot, VideoFrame};

    struct FixedClock;

    impl Clock for FixedClock {
        fn now_label(&self) -> String {
            "08:30:00".into()
        }
    }

    fn reconciler() -> Reconciler<FixedClock> {
        Reconciler::with_clock(&DashboardConfig::default(), FixedClock)
    }

    #[test]
    fn fresh_state_projects_safe_defaults() {
        let view = DashboardView::project(&DashboardState::default());
        assert_eq!(view.smoke_text, "0");
        assert_eq!(view.esp32.text, "Offline");
        assert_eq!(view.camera.text, "Offline");
        assert_eq!(view.alert.headline, NO_ALERTS);
        assert_eq!(view.video, VideoSurface::Placeholder);
        assert!(view.stages.iter().all(|lamp| !lamp.active));
        assert!(view.controls.start_enabled);
        assert!(!view.controls.stop_enabled);
        assert!(!view.controls.stop_alarm_enabled);
    }

    #[test]
    fn fire_confirmed_lights_every_stage() {
        let lamps = stage_lamps(PipelineStage::FireConfirmed);
        assert!(lamps.iter().all(|lamp| lamp.active));
        let lamps = stage_lamps(PipelineStage::CameraVerification);
        assert_eq!(
            lamps.iter().filter(|lamp| lamp.active).count(),
            1
        );
        assert!(lamps[1].active);
    }

    #[test]
    fn active_alert_enables_stop_alarm_until_stopped() {
        let mut r = reconciler();
        r.apply(Inbound::Push(PushEvent::Snapshot(SensorSnapshot {
            smoke_level: 3000.0,
            temperature: 70.5,
            fire_detected: true,
            ..Default::default()
        })));
        let view = DashboardView::project(r.state());
        assert!(view.alert.firing);
        assert_eq!(view.alert.headline, FIRE_HEADLINE);
        assert!(view.controls.stop_alarm_enabled);
        assert!(view.smoke_exceeded && view.temperature_exceeded);
        assert_eq!(view.temperature_text, "70.5");

        r.apply(Inbound::Push(PushEvent::AlarmStopped));
        let view = DashboardView::project(r.state());
        assert!(!view.alert.firing);
        assert!(!view.controls.stop_alarm_enabled);
    }

    #[test]
    fn pending_start_disables_both_session_buttons() {
        let mut r = reconciler();
        r.begin(&Command::StartMonitoring).unwrap();
        let view = DashboardView::project(r.state());
        assert!(!view.controls.start_enabled);
        assert!(!view.controls.stop_enabled);

        r.apply(Inbound::Resolved {
            command: CommandKind::StartMonitoring,
            outcome: Ok(CommandReply::Started),
        });
        let view = DashboardView::project(r.state());
        assert!(!view.controls.start_enabled);
        assert!(view.controls.stop_enabled);
        assert!(view.system.online);
    }

    #[test]
    fn frames_and_series_flow_through() {
        let mut r = reconciler();
        r.apply(Inbound::Push(PushEvent::Frame(VideoFrame {
            jpeg: Arc::from(vec![9u8; 4]),
            fire_detected: false,
        })));
        r.apply(Inbound::Push(PushEvent::Snapshot(SensorSnapshot {
            smoke_level: 120.0,
            temperature: 22.0,
            ..Default::default()
        })));
        let view = DashboardView::project(r.state());
        match view.video {
            VideoSurface::Frame { image, highlighted } => {
                assert_eq!(image.len(), 4);
                assert!(!highlighted);
            }
            VideoSurface::Placeholder => panic!("expected a frame"),
        }
        assert_eq!(view.chart.labels, vec!["08:30:00"]);
        assert_eq!(view.chart.smoke, vec![120.0]);
        assert_eq!(view.log[0].time, "[08:30:00]");
        assert!(view.footer.starts_with("1 snapshots · 1 frames"));
    }
}
