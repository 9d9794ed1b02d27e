use crate::prelude::{TransportError, TransportResult};
use crate::rig_interface::snapshot::SensorSnapshot;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Settings exposed by `/api/settings`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RigSettings {
    pub esp_ip: String,
    pub smoke_threshold: f64,
    pub temp_threshold: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    StartMonitoring,
    StopMonitoring,
    StopAlarm,
    LoadSettings,
    UpdateSettings,
    FetchStatus,
}

impl CommandKind {
    pub fn describe(self) -> &'static str {
        match self {
            CommandKind::StartMonitoring => "start monitoring",
            CommandKind::StopMonitoring => "stop monitoring",
            CommandKind::StopAlarm => "stop alarm",
            CommandKind::LoadSettings => "load settings",
            CommandKind::UpdateSettings => "save settings",
            CommandKind::FetchStatus => "refresh status",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// Request/response call against the backend.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    StartMonitoring,
    StopMonitoring,
    StopAlarm,
    LoadSettings,
    UpdateSettings(RigSettings),
    FetchStatus,
}

impl Command {
    pub fn kind(&self) -> CommandKind {
        match self {
            Command::StartMonitoring => CommandKind::StartMonitoring,
            Command::StopMonitoring => CommandKind::StopMonitoring,
            Command::StopAlarm => CommandKind::StopAlarm,
            Command::LoadSettings => CommandKind::LoadSettings,
            Command::UpdateSettings(_) => CommandKind::UpdateSettings,
            Command::FetchStatus => CommandKind::FetchStatus,
        }
    }

    pub fn endpoint(&self) -> (Method, &'static str) {
        match self {
            Command::StartMonitoring => (Method::Post, "/api/start_monitoring"),
            Command::StopMonitoring => (Method::Post, "/api/stop_monitoring"),
            Command::StopAlarm => (Method::Post, "/api/stop_alarm"),
            Command::LoadSettings => (Method::Get, "/api/settings"),
            Command::UpdateSettings(_) => (Method::Post, "/api/settings"),
            Command::FetchStatus => (Method::Get, "/api/status"),
        }
    }
}

/// Well-formed backend replies.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandReply {
    Started,
    Stopped,
    AlarmStop { success: bool },
    Settings(RigSettings),
    SettingsUpdated,
    Status(SensorSnapshot),
}

#[derive(Deserialize)]
struct StatusReply {
    status: String,
}

#[derive(Deserialize)]
struct SuccessReply {
    success: bool,
}

impl CommandReply {
    /// Validates a response body against the shape expected for `kind`.
    pub fn decode(kind: CommandKind, body: &[u8]) -> TransportResult<Self> {
        let value: Value = serde_json::from_slice(body)
            .map_err(|e| TransportError::Protocol(format!("response is not JSON: {e}")))?;
        let shape = |e: serde_json::Error| {
            TransportError::Protocol(format!("unexpected {} reply: {e}", kind.describe()))
        };

        match kind {
            CommandKind::StartMonitoring => expect_status(value, "started").map(|_| Self::Started),
            CommandKind::StopMonitoring => expect_status(value, "stopped").map(|_| Self::Stopped),
            CommandKind::UpdateSettings => {
                expect_status(value, "updated").map(|_| Self::SettingsUpdated)
            }
            CommandKind::StopAlarm => serde_json::from_value::<SuccessReply>(value)
                .map(|reply| Self::AlarmStop {
                    success: reply.success,
                })
                .map_err(shape),
            CommandKind::LoadSettings => serde_json::from_value::<RigSettings>(value)
                .map(Self::Settings)
                .map_err(shape),
            CommandKind::FetchStatus => {
                if !value.is_object() {
                    return Err(TransportError::Protocol(
                        "status reply is not an object".into(),
                    ));
                }
                SensorSnapshot::from_json(value)
                    .map(Self::Status)
                    .map_err(shape)
            }
        }
    }
}

fn expect_status(value: Value, expected: &str) -> TransportResult<()> {
    let reply: StatusReply = serde_json::from_value(value)
        .map_err(|e| TransportError::Protocol(format!("missing status field: {e}")))?;
    if reply.status == expected {
        Ok(())
    } else {
        Err(TransportError::Protocol(format!(
            "expected status {expected:?}, got {:?}",
            reply.status
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_reply_requires_started_status() {
        assert_eq!(
            CommandReply::decode(CommandKind::StartMonitoring, br#"{"status":"started"}"#),
            Ok(CommandReply::Started)
        );
        assert!(matches!(
            CommandReply::decode(CommandKind::StartMonitoring, br#"{"status":"busy"}"#),
            Err(TransportError::Protocol(_))
        ));
    }

    #[test]
    fn stop_alarm_reply_carries_success_flag() {
        assert_eq!(
            CommandReply::decode(CommandKind::StopAlarm, br#"{"success":false}"#),
            Ok(CommandReply::AlarmStop { success: false })
        );
        assert!(CommandReply::decode(CommandKind::StopAlarm, br#"{"status":"ok"}"#).is_err());
    }

    #[test]
    fn settings_reply_parses_integer_thresholds() {
        let reply = CommandReply::decode(
            CommandKind::LoadSettings,
            br#"{"esp_ip":"192.168.2.131","smoke_threshold":2600,"temp_threshold":20}"#,
        )
        .unwrap();
        assert_eq!(
            reply,
            CommandReply::Settings(RigSettings {
                esp_ip: "192.168.2.131".into(),
                smoke_threshold: 2600.0,
                temp_threshold: 20.0,
            })
        );
    }

    #[test]
    fn html_error_page_is_a_protocol_error() {
        assert!(matches!(
            CommandReply::decode(CommandKind::FetchStatus, b"<html>502</html>"),
            Err(TransportError::Protocol(_))
        ));
        assert!(CommandReply::decode(CommandKind::FetchStatus, b"[1,2]").is_err());
    }

    #[test]
    fn endpoints_follow_the_backend_routes() {
        assert_eq!(
            Command::StopAlarm.endpoint(),
            (Method::Post, "/api/stop_alarm")
        );
        assert_eq!(Command::LoadSettings.endpoint().0, Method::Get);
        let update = Command::UpdateSettings(RigSettings {
            esp_ip: "10.0.0.2".into(),
            smoke_threshold: 1.0,
            temp_threshold: 2.0,
        });
        assert_eq!(update.endpoint(), (Method::Post, "/api/settings"));
        assert_eq!(update.kind(), CommandKind::UpdateSettings);
    }
}
