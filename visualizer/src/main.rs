use chart::SensorChart;
use clap::Parser;
use firecore::presentation::{Indicator, StageLamp, VideoSurface};
use firecore::rig_interface::{Command, Severity};
use firecore::{DashboardConfig, DashboardState, DashboardView};
use iced::{
    futures::{channel::mpsc, SinkExt, Stream},
    stream,
    widget::{
        button, canvas::Canvas, column, image, row, scrollable, text, text_input, Column,
        Container, Row,
    },
    Alignment, Color, Element, Length, Subscription, Task, Theme,
};
use settings_form::{SettingsField, SettingsForm};
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};
use tokio::sync::mpsc::UnboundedSender;

mod chart;
mod settings_form;

static CONFIG: OnceLock<DashboardConfig> = OnceLock::new();

const ONLINE: Color = Color::from_rgb(0.3, 0.8, 0.4);
const OFFLINE: Color = Color::from_rgb(0.85, 0.3, 0.3);
const DIM: Color = Color::from_rgb(0.45, 0.45, 0.5);
const ALERT: Color = Color::from_rgb(1.0, 0.25, 0.2);

#[derive(Parser)]
#[command(author, version, about = "Fire-detection rig dashboard")]
struct Args {
    /// Load dashboard settings from YAML
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> iced::Result {
    env_logger::init();
    let args = Args::parse();

    let config = match args.config {
        Some(path) => DashboardConfig::load(&path).unwrap_or_else(|err| {
            log::error!("{err}; falling back to defaults");
            DashboardConfig::default()
        }),
        None => DashboardConfig::default(),
    };
    log::info!(
        "dashboard using backend {} and push channel {}",
        config.backend_url,
        config.push_url
    );
    let _ = CONFIG.set(config);

    iced::application(Dashboard::boot, Dashboard::update, Dashboard::view)
        .title(application_title)
        .subscription(application_subscription)
        .theme(application_theme)
        .run()
}

fn application_title(_: &Dashboard) -> String {
    "Fire Detection Dashboard".into()
}

fn application_subscription(_: &Dashboard) -> Subscription<Message> {
    Subscription::run(driver_events)
}

fn application_theme(_: &Dashboard) -> Theme {
    Theme::Dark
}

fn config() -> DashboardConfig {
    CONFIG.get().cloned().unwrap_or_default()
}

/// Starts the state driver and relays every published state into the GUI.
fn driver_events() -> impl Stream<Item = Message> {
    stream::channel(32, |mut output: mpsc::Sender<Message>| async move {
        let (mut handle, run) = firecore::connect(&config());
        tokio::spawn(run);

        if output
            .send(Message::Ready(handle.intents.clone()))
            .await
            .is_err()
        {
            return;
        }

        while handle.state.changed().await.is_ok() {
            let state = handle.state.borrow_and_update().clone();
            if output
                .send(Message::StateChanged(Box::new(state)))
                .await
                .is_err()
            {
                return;
            }
        }
        log::warn!("dashboard driver stopped publishing");
    })
}

struct Dashboard {
    intents: Option<UnboundedSender<Command>>,
    state: DashboardState,
    projection: DashboardView,
    frame: Option<(Arc<[u8]>, image::Handle)>,
    settings: SettingsForm,
}

#[derive(Debug, Clone)]
enum Message {
    Ready(UnboundedSender<Command>),
    StateChanged(Box<DashboardState>),
    Intent(Command),
    ToggleSettings,
    SettingsFieldChanged(SettingsField, String),
    SaveSettings,
}

impl Dashboard {
    fn boot() -> (Self, Task<Message>) {
        let state = DashboardState::new(&config());
        (
            Dashboard {
                intents: None,
                projection: DashboardView::project(&state),
                state,
                frame: None,
                settings: SettingsForm::default(),
            },
            Task::none(),
        )
    }

    fn update(state: &mut Self, message: Message) -> Task<Message> {
        match message {
            Message::Ready(intents) => {
                state.intents = Some(intents);
            }
            Message::StateChanged(next) => state.absorb(*next),
            Message::Intent(command) => state.send(command),
            Message::ToggleSettings => {
                state.settings.open = !state.settings.open;
                state.settings.error = None;
                if state.settings.open {
                    state.send(Command::LoadSettings);
                }
            }
            Message::SettingsFieldChanged(field, value) => {
                state.settings.update_field(field, value);
            }
            Message::SaveSettings => match state.settings.to_settings() {
                Ok(settings) => {
                    state.send(Command::UpdateSettings(settings));
                    state.settings.open = false;
                }
                Err(err) => state.settings.error = Some(err),
            },
        }
        Task::none()
    }

    fn absorb(&mut self, next: DashboardState) {
        self.projection = DashboardView::project(&next);
        self.frame = match &self.projection.video {
            VideoSurface::Frame { image: bytes, .. } => match self.frame.take() {
                Some((current, handle)) if Arc::ptr_eq(&current, bytes) => Some((current, handle)),
                _ => Some((
                    bytes.clone(),
                    image::Handle::from_bytes(bytes.to_vec()),
                )),
            },
            VideoSurface::Placeholder => None,
        };
        if let Some(settings) = &next.settings {
            self.settings.prefill(settings);
        }
        self.state = next;
    }

    fn send(&self, command: Command) {
        match &self.intents {
            Some(intents) => {
                if intents.send(command).is_err() {
                    log::error!("dashboard driver is gone; command dropped");
                }
            }
            None => log::warn!("dashboard driver not ready yet"),
        }
    }

    fn view(state: &Self) -> Element<'_, Message> {
        let view = &state.projection;

        let header = row![
            text("Fire Detection System").size(28),
            indicator_text(&view.system, 16),
        ]
        .spacing(20)
        .align_y(Alignment::Center);

        let controls = view.controls;
        let control_row = row![
            button("Start Monitoring")
                .on_press_maybe(
                    controls
                        .start_enabled
                        .then_some(Message::Intent(Command::StartMonitoring))
                )
                .padding(10),
            button("Stop Monitoring")
                .on_press_maybe(
                    controls
                        .stop_enabled
                        .then_some(Message::Intent(Command::StopMonitoring))
                )
                .padding(10),
            button("Stop Alarm")
                .on_press_maybe(
                    controls
                        .stop_alarm_enabled
                        .then_some(Message::Intent(Command::StopAlarm))
                )
                .padding(10),
            button("Settings")
                .on_press_maybe(controls.settings_enabled.then_some(Message::ToggleSettings))
                .padding(10),
        ]
        .spacing(10);

        let readings = column![
            text("Sensor Readings").size(20),
            reading("Smoke", &view.smoke_text, "ppm", view.smoke_exceeded),
            reading(
                "Temperature",
                &view.temperature_text,
                "°C",
                view.temperature_exceeded
            ),
            row![
                text("ESP32:").size(14),
                indicator_text(&view.esp32, 14),
                text("Camera:").size(14),
                indicator_text(&view.camera, 14),
            ]
            .spacing(8),
        ]
        .spacing(8);

        let stages = column![
            text("Detection Pipeline").size(20),
            view.stages
                .iter()
                .fold(Row::new().spacing(14), |row, lamp| row.push(stage_lamp(lamp))),
            text(&view.stage_description).size(14),
        ]
        .spacing(8);

        let alert_color = if view.alert.firing { ALERT } else { ONLINE };
        let alert = view.alert.details.iter().fold(
            Column::new()
                .spacing(4)
                .push(text(&view.alert.headline).size(22).color(alert_color)),
            |col, line| col.push(text(line).size(14)),
        );

        let video: Element<'_, Message> = match &state.frame {
            Some((_, handle)) => {
                let caption = match &view.video {
                    VideoSurface::Frame {
                        highlighted: true, ..
                    } => text("Fire detected in frame").color(ALERT),
                    _ => text("Live camera feed").color(DIM),
                };
                column![
                    image(handle.clone())
                        .width(Length::Fill)
                        .height(Length::Fixed(240.0)),
                    caption.size(12),
                ]
                .spacing(4)
                .into()
            }
            None => Container::new(text("Camera inactive").color(DIM))
                .width(Length::Fill)
                .height(Length::Fixed(240.0))
                .center_x(Length::Fill)
                .center_y(Length::Fixed(240.0))
                .into(),
        };

        let chart = Canvas::new(SensorChart {
            smoke: view.chart.smoke.clone(),
            temperature: view.chart.temperature.clone(),
            smoke_threshold: state.state.thresholds.smoke,
            temperature_threshold: state.state.thresholds.temperature,
        })
        .width(Length::Fill)
        .height(Length::Fixed(220.0));

        let chart_span = match (view.chart.labels.first(), view.chart.labels.last()) {
            (Some(first), Some(last)) => format!("{first} to {last}"),
            _ => "No readings yet".into(),
        };

        let log_list = if view.log.is_empty() {
            Column::new().push(text("No activity yet").size(12))
        } else {
            view.log
                .iter()
                .rev()
                .fold(Column::new().spacing(4), |col, line| {
                    col.push(
                        row![
                            text(&line.time).size(12).color(DIM),
                            text(&line.message)
                                .size(12)
                                .color(severity_color(line.severity)),
                        ]
                        .spacing(6),
                    )
                })
        };

        let left = column![
            readings,
            stages,
            text("Alerts").size(20),
            Container::new(alert).padding(8),
            text("Activity Log").size(20),
            Container::new(scrollable(log_list).height(Length::Fixed(260.0))).padding(6),
        ]
        .spacing(14)
        .width(Length::Fixed(420.0));

        let mut right = column![
            text("Camera").size(20),
            video,
            row![
                text("Sensor History").size(20),
                text("smoke").size(12).color(SensorChart::smoke_color()),
                text("temperature")
                    .size(12)
                    .color(SensorChart::temperature_color()),
            ]
            .spacing(10)
            .align_y(Alignment::Center),
            chart,
            text(chart_span).size(12).color(DIM),
        ]
        .spacing(10)
        .width(Length::Fill);

        if state.settings.open {
            right = right.push(settings_panel(&state.settings));
        }

        let layout = column![
            header,
            control_row,
            row![left, right].spacing(20).align_y(Alignment::Start),
            text(&view.footer).size(11).color(DIM),
        ]
        .spacing(16)
        .padding(20);

        Container::new(scrollable(layout))
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }
}

fn settings_panel(form: &SettingsForm) -> Element<'_, Message> {
    let mut panel = column![
        text("Settings").size(20),
        text_input("ESP32 IP address", &form.esp_ip)
            .on_input(|value| Message::SettingsFieldChanged(SettingsField::EspIp, value))
            .padding(6),
        text_input("Smoke threshold (ppm)", &form.smoke_threshold)
            .on_input(|value| Message::SettingsFieldChanged(SettingsField::SmokeThreshold, value))
            .padding(6),
        text_input("Temperature threshold (°C)", &form.temp_threshold)
            .on_input(|value| Message::SettingsFieldChanged(SettingsField::TempThreshold, value))
            .padding(6),
        row![
            button("Save").on_press(Message::SaveSettings).padding(8),
            button("Cancel").on_press(Message::ToggleSettings).padding(8),
        ]
        .spacing(10),
    ]
    .spacing(8)
    .padding(10);

    if let Some(err) = &form.error {
        panel = panel.push(text(err).size(12).color(OFFLINE));
    }
    panel.into()
}

fn indicator_text(indicator: &Indicator, size: u16) -> Element<'_, Message> {
    let color = if indicator.online { ONLINE } else { OFFLINE };
    text(format!("● {}", indicator.text))
        .size(u32::from(size))
        .color(color)
        .into()
}

fn reading<'a>(label: &str, value: &str, unit: &str, exceeded: bool) -> Element<'a, Message> {
    let color = if exceeded { ALERT } else { Color::WHITE };
    text(format!("{label}: {value} {unit}"))
        .size(18)
        .color(color)
        .into()
}

fn stage_lamp(lamp: &StageLamp) -> Element<'_, Message> {
    let color = if lamp.active { ALERT } else { DIM };
    text(format!("● {}", lamp.label))
        .size(14)
        .color(color)
        .into()
}

fn severity_color(severity: Severity) -> Color {
    match severity {
        Severity::Info => Color::from_rgb(0.8, 0.8, 0.85),
        Severity::Success => ONLINE,
        Severity::Warning => Color::from_rgb(0.95, 0.75, 0.2),
        Severity::Error => ALERT,
    }
}
