pub mod state;
pub mod transitions;

pub use state::{
    AlertState, ChannelStatus, DashboardState, SessionState, SystemStatus, ThresholdFlags,
    Thresholds,
};
pub use transitions::{Inbound, Reconciler};
