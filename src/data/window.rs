//! Fixed-depth time series used by the dashboard charts.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// Number of points kept per series (five minutes at the default poll rate).
pub const DEFAULT_WINDOW_CAPACITY: usize = 60;

/// One point of a series.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TimePoint {
    /// Milliseconds since the Unix epoch; 0 for placeholder points.
    pub timestamp_ms: u64,
    pub value: f64,
}

impl TimePoint {
    pub fn new(timestamp_ms: u64, value: f64) -> Self {
        Self {
            timestamp_ms,
            value,
        }
    }

    /// Whether this is one of the zero points the window is primed with.
    pub fn is_placeholder(&self) -> bool {
        self.timestamp_ms == 0
    }
}

/// A ring buffer of the most recent points.
///
/// The window is primed with `capacity` zero points, so its length is always
/// `capacity` and charts have a stable x-axis from the first frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlidingWindow {
    capacity: usize,
    points: VecDeque<TimePoint>,
}

impl Default for SlidingWindow {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_CAPACITY)
    }
}

impl SlidingWindow {
    /// Create a window primed with zero points. A zero capacity is raised to 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let mut points = VecDeque::with_capacity(capacity);
        points.resize(capacity, TimePoint::default());
        Self { capacity, points }
    }

    /// Evict the oldest point and append `point`.
    pub fn push(&mut self, point: TimePoint) {
        self.points.pop_front();
        self.points.push_back(point);
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Points oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &TimePoint> {
        self.points.iter()
    }

    pub fn latest(&self) -> Option<&TimePoint> {
        self.points.back()
    }

    /// Points that were actually recorded, oldest first.
    pub fn recorded(&self) -> impl Iterator<Item = &TimePoint> {
        self.points.iter().filter(|p| !p.is_placeholder())
    }

    /// Minimum and maximum value over the whole window, for chart axes.
    pub fn bounds(&self) -> (f64, f64) {
        self.points.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), p| {
            (min.min(p.value), max.max(p.value))
        })
    }

    /// Points as `(slot, value)` pairs for a chart dataset.
    pub fn chart_data(&self) -> Vec<(f64, f64)> {
        self.points.iter().enumerate().map(|(i, p)| (i as f64, p.value)).collect()
    }
}
