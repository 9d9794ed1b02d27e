//! State-synchronisation core for the fire-detection rig dashboard.
//!
//! Push events, polled snapshots and command outcomes are funnelled into a
//! single [`Reconciler`]; the GUI only ever sees the [`DashboardState`] it
//! publishes and the [`DashboardView`] projected from it.

pub mod config;
pub mod prelude;
pub mod presentation;
pub mod reconciler;
pub mod rig_interface;
pub mod runtime;
pub mod series;
pub mod telemetry;
pub mod transport;

pub use config::DashboardConfig;
pub use prelude::{Clock, GuardRejection, SystemClock, TransportError, TransportResult};
pub use presentation::DashboardView;
pub use reconciler::{DashboardState, Inbound, Reconciler};
pub use runtime::{connect, DashboardDriver, DashboardHandle};
