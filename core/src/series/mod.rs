pub mod bounded;
pub mod log_feed;
pub mod rolling;

pub use bounded::Bounded;
pub use log_feed::{LogFeed, DEFAULT_LOG_CAPACITY};
pub use rolling::{RollingSeries, SeriesPoint, DEFAULT_SERIES_CAPACITY};
