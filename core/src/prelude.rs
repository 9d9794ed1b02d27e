use crate::rig_interface::CommandKind;

/// Failures raised by the request/response and push transports.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("network error: {0}")]
    Network(String),
    #[error("protocol error: {0}")]
    Protocol(String),
    #[error("push channel lost: {0}")]
    ChannelLost(String),
}

pub type TransportResult<T> = Result<T, TransportError>;

/// Reasons the client-side guard refuses a command before it reaches the network.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardRejection {
    #[error("monitoring is already running")]
    AlreadyRunning,
    #[error("monitoring is not running")]
    NotRunning,
    #[error("no alarm is armed")]
    AlarmNotArmed,
    #[error("{} is still in flight", .0.describe())]
    Pending(CommandKind),
}

/// Source of the wall-clock labels stamped on series points and log entries.
pub trait Clock {
    fn now_label(&self) -> String;
}

/// Local time formatted as `HH:MM:SS`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_label(&self) -> String {
        chrono::Local::now().format("%H:%M:%S").to_string()
    }
}
