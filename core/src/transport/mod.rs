pub mod http;
pub mod push;

use crate::prelude::TransportResult;
use crate::rig_interface::{Command, CommandReply};
use std::future::Future;

pub use http::HttpTransport;
pub use push::PushChannel;

/// Request/response seam between the driver and the backend.
///
/// The returned future owns everything it needs so the driver can keep many
/// of them in flight without borrowing the transport.
pub trait CommandTransport {
    fn send(
        &self,
        command: Command,
    ) -> impl Future<Output = TransportResult<CommandReply>> + Send + 'static;
}
