use crate::generator::profile::ReadingProfile;
use crate::generator::template::render_frame;
use crate::gui_bridge::model::RigHandle;
use crate::workflow::config::ScenarioConfig;
use firecore::rig_interface::events::ALARM_TRIGGERED;
use firecore::rig_interface::{PipelineStage, PushEnvelope, Severity};
use log::info;
use std::time::Duration;
use tokio::time::sleep;

const FRAME_WIDTH: u32 = 160;
const FRAME_HEIGHT: u32 = 120;

/// How a monitoring episode ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpisodeOutcome {
    ConfirmedByCamera,
    ConfirmedByTemperature,
    FalseAlarm,
    Cancelled,
}

/// Drives the scripted smoke → camera → temperature pipeline for one session.
#[derive(Clone)]
pub struct Runner {
    config: ScenarioConfig,
    rig: RigHandle,
}

impl Runner {
    pub fn new(config: ScenarioConfig, rig: RigHandle) -> Self {
        Self { config, rig }
    }

    pub fn rig(&self) -> &RigHandle {
        &self.rig
    }

    pub fn scenario(&self) -> &ScenarioConfig {
        &self.config
    }

    /// Loops episodes until monitoring stops or a newer session replaces `run_id`.
    pub async fn execute(&self, run_id: u64) {
        let mut profile = ReadingProfile::new(&self.config);
        self.rig
            .log("Starting sequential fire detection pipeline...", Severity::Success);

        while self.rig.is_current(run_id) {
            let outcome = self.episode(run_id, &mut profile).await;
            info!("episode finished: {outcome:?}");
            profile.reset_episode();
            if outcome == EpisodeOutcome::FalseAlarm {
                self.pause(run_id, self.config.cooldown()).await;
            }
        }
        info!("session {run_id} ended");
    }

    pub async fn episode(&self, run_id: u64, profile: &mut ReadingProfile) -> EpisodeOutcome {
        if !self.watch_smoke(run_id, profile).await {
            return EpisodeOutcome::Cancelled;
        }

        self.rig.update(|m| {
            m.set_stage(
                PipelineStage::CameraVerification,
                "Camera verifying fire detection (smoke sensor OFF)",
            );
            m.camera_online = true;
        });
        self.rig.emit_status();
        self.rig.log(
            "Stage 2: Starting camera verification. Smoke sensor OFF.",
            Severity::Warning,
        );

        let camera = self.verify_with_camera(run_id).await;
        self.rig.update(|m| m.camera_online = false);
        match camera {
            None => return EpisodeOutcome::Cancelled,
            Some(true) => {
                self.confirm(run_id, "camera").await;
                return EpisodeOutcome::ConfirmedByCamera;
            }
            Some(false) => {}
        }

        self.rig.update(|m| {
            m.set_stage(
                PipelineStage::TempFallback,
                "Camera verification failed. Using temperature fallback.",
            );
        });
        self.rig.emit_status();
        self.rig.log(
            "Stage 3: Camera failed to detect fire. Starting temperature fallback monitoring.",
            Severity::Warning,
        );

        match self.temperature_fallback(run_id, profile).await {
            None => EpisodeOutcome::Cancelled,
            Some(true) => {
                self.confirm(run_id, "temperature").await;
                EpisodeOutcome::ConfirmedByTemperature
            }
            Some(false) => {
                self.rig.log(
                    "No fire confirmed by temperature fallback. Returning to smoke monitoring.",
                    Severity::Info,
                );
                self.rig.update(|m| {
                    m.set_stage(
                        PipelineStage::Idle,
                        "False alarm cleared. Returning to smoke monitoring.",
                    )
                });
                self.rig.emit_status();
                EpisodeOutcome::FalseAlarm
            }
        }
    }

    /// Stage 1. Returns false if monitoring stopped before smoke crossed the threshold.
    async fn watch_smoke(&self, run_id: u64, profile: &mut ReadingProfile) -> bool {
        self.rig.update(|m| {
            m.set_stage(
                PipelineStage::SmokeMonitoring,
                "Monitoring smoke levels (camera and temperature sensors OFF)",
            );
            m.camera_online = false;
        });
        self.rig.emit_status();
        self.rig.log(
            "Stage 1: Smoke monitoring active. Camera and temperature sensors OFF.",
            Severity::Info,
        );

        while self.rig.is_current(run_id) {
            if self.config.esp_online {
                let smoke = profile.next_smoke();
                let threshold = self.rig.settings().smoke_threshold;
                self.rig.update(|m| {
                    m.esp32_online = true;
                    m.smoke_level = smoke;
                    m.last_update = Some(stamp());
                });
                self.rig.emit_status();

                if smoke > threshold {
                    self.rig.log(
                        &format!(
                            "🚨 SMOKE THRESHOLD EXCEEDED! Level: {smoke} ppm (Threshold: {threshold} ppm)"
                        ),
                        Severity::Warning,
                    );
                    return true;
                }
                self.rig
                    .log(&format!("Smoke level normal: {smoke} ppm"), Severity::Info);
            } else {
                self.rig.update(|m| m.esp32_online = false);
            }
            sleep(self.config.smoke_interval()).await;
        }
        false
    }

    /// Stage 2. `None` when cancelled, otherwise whether a frame showed fire.
    async fn verify_with_camera(&self, run_id: u64) -> Option<bool> {
        let frames = self.config.camera_frames.max(1);
        let fire_from = if self.config.camera_confirms {
            frames / 2
        } else {
            u32::MAX
        };

        for index in 0..frames {
            if !self.rig.is_current(run_id) {
                return None;
            }
            let fire = index >= fire_from;
            let frame = render_frame(FRAME_WIDTH, FRAME_HEIGHT, fire, index);
            self.rig.emit(PushEnvelope::frame(&frame, fire));
            if fire {
                self.rig.log(
                    &format!("Fire confirmed by camera on frame {}", index + 1),
                    Severity::Error,
                );
                return Some(true);
            }
            sleep(self.config.frame_interval()).await;
        }
        Some(false)
    }

    /// Stage 3. `None` when cancelled, otherwise whether temperature crossed the threshold.
    async fn temperature_fallback(&self, run_id: u64, profile: &mut ReadingProfile) -> Option<bool> {
        self.rig.log(
            "Camera verification failed. Starting temperature monitoring as fallback...",
            Severity::Warning,
        );
        let attempts = self.config.temp_checks;

        for attempt in 1..=attempts {
            if !self.rig.is_current(run_id) {
                self.rig
                    .log("Temperature monitoring stopped by user", Severity::Warning);
                return None;
            }
            self.rig.log(
                &format!("Temperature check {attempt}/{attempts}: Requesting reading..."),
                Severity::Info,
            );

            if self.config.esp_online {
                let temp = profile.next_temperature();
                let threshold = self.rig.settings().temp_threshold;
                self.rig.update(|m| {
                    m.temperature = temp;
                    m.last_update = Some(stamp());
                });
                self.rig.emit_status();
                self.rig.log(
                    &format!("Temperature reading received: {temp}°C"),
                    Severity::Success,
                );
                if temp > threshold {
                    self.rig.log(
                        &format!("🚨 Temperature threshold exceeded! {temp}°C > {threshold}°C"),
                        Severity::Error,
                    );
                    return Some(true);
                }
            } else {
                self.rig.log(
                    "Failed to get temperature reading (ESP32 connection issue)",
                    Severity::Error,
                );
            }
            sleep(self.config.temp_interval()).await;
        }

        self.rig.log(
            "Temperature monitoring completed. No sustained temperature rise detected.",
            Severity::Info,
        );
        Some(false)
    }

    /// Marks fire confirmed, raises the alarm and holds until it is stopped.
    async fn confirm(&self, run_id: u64, source: &str) {
        self.rig.update(|m| {
            m.fire_detected = true;
            m.set_stage(
                PipelineStage::FireConfirmed,
                &format!("FIRE CONFIRMED by {source}! Alarm triggered."),
            );
        });
        self.rig.emit_status();
        self.rig.log(
            &format!(
                "🔥 FIRE CONFIRMED BY {}! Triggering alarm system!",
                source.to_uppercase()
            ),
            Severity::Error,
        );

        if self.config.esp_online {
            self.rig.update(|m| m.alarm_active = true);
            self.rig.emit(PushEnvelope::new(
                ALARM_TRIGGERED,
                serde_json::json!({ "status": "active" }),
            ));
        }

        while self.rig.is_current(run_id) && self.rig.read(|m| m.alarm_active) {
            sleep(Duration::from_millis(50)).await;
        }

        self.rig.update(|m| {
            m.fire_detected = false;
            m.set_stage(
                PipelineStage::Idle,
                "Alarm stopped. Returning to smoke monitoring.",
            );
        });
        self.rig.emit_status();
    }

    async fn pause(&self, run_id: u64, total: Duration) {
        let step = Duration::from_millis(50);
        let mut waited = Duration::ZERO;
        while waited < total && self.rig.is_current(run_id) {
            sleep(step.min(total - waited)).await;
            waited += step;
        }
    }
}

fn stamp() -> String {
    chrono::Local::now().to_rfc3339()
}
