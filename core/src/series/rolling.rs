use crate::series::bounded::Bounded;
use serde::Serialize;

pub const DEFAULT_SERIES_CAPACITY: usize = 20;

/// One chart sample for the smoke and temperature channels.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub timestamp: String,
    pub smoke: f64,
    pub temperature: f64,
}

impl SeriesPoint {
    pub fn new(timestamp: impl Into<String>, smoke: f64, temperature: f64) -> Self {
        Self {
            timestamp: timestamp.into(),
            smoke,
            temperature,
        }
    }
}

/// Fixed-capacity time series, kept in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub struct RollingSeries {
    points: Bounded<SeriesPoint>,
}

impl RollingSeries {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            points: Bounded::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, point: SeriesPoint) {
        self.points.push(point);
    }

    /// Read-only copy of the buffered points, oldest first.
    pub fn snapshot(&self) -> Vec<SeriesPoint> {
        self.points.to_vec()
    }

    pub fn labels(&self) -> Vec<String> {
        self.points.iter().map(|p| p.timestamp.clone()).collect()
    }

    pub fn smoke(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.smoke).collect()
    }

    pub fn temperature(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.temperature).collect()
    }

    pub fn latest(&self) -> Option<&SeriesPoint> {
        self.points.last()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.points.capacity()
    }
}

impl Default for RollingSeries {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_SERIES_CAPACITY)
    }
}
