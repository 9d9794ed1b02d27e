pub mod commands;
pub mod events;
pub mod snapshot;

pub use commands::{Command, CommandKind, CommandReply, Method, RigSettings};
pub use events::{LogEntry, PushEnvelope, PushEvent, Severity, VideoFrame};
pub use snapshot::{LinkStatus, PipelineStage, RawSnapshot, SensorSnapshot};
