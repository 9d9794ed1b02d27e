use crate::prelude::{TransportError, TransportResult};
use crate::rig_interface::snapshot::{RawSnapshot, SensorSnapshot};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

pub const STATUS_UPDATE: &str = "status_update";
pub const VIDEO_FRAME: &str = "video_frame";
pub const ALARM_TRIGGERED: &str = "alarm_triggered";
pub const ALARM_STOPPED: &str = "alarm_stopped";
pub const LOG_MESSAGE: &str = "log_message";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Info,
    Success,
    Warning,
    Error,
}

impl Severity {
    /// Unknown or missing severities are shown as plain info lines.
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(str::to_ascii_lowercase).as_deref() {
            Some("success") => Severity::Success,
            Some("warning") => Severity::Warning,
            Some("error") => Severity::Error,
            _ => Severity::Info,
        }
    }
}

/// One line of the activity feed. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    pub timestamp: String,
    pub message: String,
    pub severity: Severity,
}

impl LogEntry {
    pub fn new(timestamp: impl Into<String>, message: impl Into<String>, severity: Severity) -> Self {
        Self {
            timestamp: timestamp.into(),
            message: message.into(),
            severity,
        }
    }
}

/// Decoded camera frame. The bytes are shared so state clones stay cheap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoFrame {
    pub jpeg: Arc<[u8]>,
    pub fire_detected: bool,
}

/// Typed inbound push events.
#[derive(Debug, Clone, PartialEq)]
pub enum PushEvent {
    Connected,
    Disconnected,
    Snapshot(SensorSnapshot),
    Frame(VideoFrame),
    AlarmTriggered,
    AlarmStopped,
    Log { message: String, severity: Severity },
}

/// `{"event": ..., "data": ...}` envelope carried by the push channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushEnvelope {
    pub event: String,
    #[serde(default)]
    pub data: Value,
}

#[derive(Debug, Deserialize)]
struct WireFrame {
    frame: String,
    #[serde(default)]
    fire_detected: bool,
}

#[derive(Debug, Deserialize)]
struct WireLog {
    #[serde(default)]
    message: String,
    #[serde(default, rename = "type")]
    kind: Option<String>,
}

impl PushEnvelope {
    pub fn new(event: &str, data: Value) -> Self {
        Self {
            event: event.to_string(),
            data,
        }
    }

    pub fn status(snapshot: &RawSnapshot) -> Self {
        Self::new(
            STATUS_UPDATE,
            serde_json::to_value(snapshot).unwrap_or(Value::Null),
        )
    }

    pub fn frame(bytes: &[u8], fire_detected: bool) -> Self {
        Self::new(
            VIDEO_FRAME,
            serde_json::json!({ "frame": STANDARD.encode(bytes), "fire_detected": fire_detected }),
        )
    }

    pub fn log(message: &str, severity: Severity) -> Self {
        Self::new(
            LOG_MESSAGE,
            serde_json::json!({ "message": message, "type": severity }),
        )
    }

    /// Parses a text frame. Events this client does not know yield `Ok(None)`.
    pub fn decode(text: &str) -> TransportResult<Option<PushEvent>> {
        let envelope: PushEnvelope = serde_json::from_str(text)
            .map_err(|e| TransportError::Protocol(format!("malformed push envelope: {e}")))?;
        envelope.into_event()
    }

    pub fn into_event(self) -> TransportResult<Option<PushEvent>> {
        let event = match self.event.as_str() {
            STATUS_UPDATE => PushEvent::Snapshot(
                SensorSnapshot::from_json(self.data)
                    .map_err(|e| protocol(STATUS_UPDATE, e))?,
            ),
            VIDEO_FRAME => {
                let wire: WireFrame =
                    serde_json::from_value(self.data).map_err(|e| protocol(VIDEO_FRAME, e))?;
                let bytes = STANDARD
                    .decode(wire.frame.trim())
                    .map_err(|e| protocol(VIDEO_FRAME, e))?;
                PushEvent::Frame(VideoFrame {
                    jpeg: bytes.into(),
                    fire_detected: wire.fire_detected,
                })
            }
            ALARM_TRIGGERED => PushEvent::AlarmTriggered,
            ALARM_STOPPED => PushEvent::AlarmStopped,
            LOG_MESSAGE => {
                let wire: WireLog =
                    serde_json::from_value(self.data).map_err(|e| protocol(LOG_MESSAGE, e))?;
                PushEvent::Log {
                    message: wire.message,
                    severity: Severity::parse(wire.kind.as_deref()),
                }
            }
            other => {
                log::debug!("ignoring push event {other}");
                return Ok(None);
            }
        };
        Ok(Some(event))
    }

    pub fn to_text(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

fn protocol(event: &str, err: impl std::fmt::Display) -> TransportError {
    TransportError::Protocol(format!("bad {event} payload: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_update_decodes_to_snapshot() {
        let text = r#"{"event":"status_update","data":{"smoke_level":3000,"fire_detected":true}}"#;
        match PushEnvelope::decode(text).unwrap() {
            Some(PushEvent::Snapshot(snapshot)) => {
                assert_eq!(snapshot.smoke_level, 3000.0);
                assert!(snapshot.fire_detected);
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn video_frame_base64_is_decoded() {
        let text = PushEnvelope::frame(&[0xff, 0xd8, 0xff], true).to_text();
        match PushEnvelope::decode(&text).unwrap() {
            Some(PushEvent::Frame(frame)) => {
                assert_eq!(&*frame.jpeg, &[0xff, 0xd8, 0xff]);
                assert!(frame.fire_detected);
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn invalid_base64_is_a_protocol_error() {
        let text = r#"{"event":"video_frame","data":{"frame":"***","fire_detected":false}}"#;
        assert!(matches!(
            PushEnvelope::decode(text),
            Err(TransportError::Protocol(_))
        ));
    }

    #[test]
    fn alarm_events_ignore_their_payload() {
        let text = r#"{"event":"alarm_triggered","data":{"status":"active"}}"#;
        assert_eq!(
            PushEnvelope::decode(text).unwrap(),
            Some(PushEvent::AlarmTriggered)
        );
        let text = r#"{"event":"alarm_stopped"}"#;
        assert_eq!(
            PushEnvelope::decode(text).unwrap(),
            Some(PushEvent::AlarmStopped)
        );
    }

    #[test]
    fn log_message_type_maps_to_severity() {
        let text = r#"{"event":"log_message","data":{"message":"Stage 2","type":"warning"}}"#;
        assert_eq!(
            PushEnvelope::decode(text).unwrap(),
            Some(PushEvent::Log {
                message: "Stage 2".into(),
                severity: Severity::Warning
            })
        );
        assert_eq!(Severity::parse(Some("verbose")), Severity::Info);
    }

    #[test]
    fn unknown_events_are_skipped_and_garbage_rejected() {
        assert_eq!(
            PushEnvelope::decode(r#"{"event":"heartbeat"}"#).unwrap(),
            None
        );
        assert!(PushEnvelope::decode("not json").is_err());
    }
}
