//! Chart datasets: a rolling latency series and snapshot distributions.

use std::collections::VecDeque;
use std::time::Instant;

use super::snapshot::{AnalyticsSnapshot, StatsSnapshot};

/// Capacity of time-series charts.
pub const TIME_SERIES_CAPACITY: usize = 20;

/// Number of commands shown in the command usage chart.
const COMMAND_CHART_SIZE: usize = 10;

/// Fixed-capacity FIFO buffer.
#[derive(Debug, Clone)]
pub struct RollingBuffer<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T> RollingBuffer<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append an item, evicting the oldest once capacity is exceeded.
    pub fn push(&mut self, item: T) {
        self.items.push_back(item);
        if self.items.len() > self.capacity {
            self.items.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn latest(&self) -> Option<&T> {
        self.items.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }
}

/// One latency sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatencyPoint {
    /// Seconds since the chart was created.
    pub at: f64,
    pub millis: f64,
}

/// Datasets for the dashboard charts.
///
/// The latency chart is a time series; the command and activity charts are
/// distributions and are replaced wholesale on every analytics update.
#[derive(Debug, Clone)]
pub struct ChartData {
    origin: Instant,
    pub latency: RollingBuffer<LatencyPoint>,
    /// Top commands by usage, descending.
    pub commands: Vec<(String, u64)>,
    /// Commands per hour of day.
    pub activity: Vec<u64>,
}

impl ChartData {
    pub fn new(origin: Instant) -> Self {
        Self {
            origin,
            latency: RollingBuffer::new(TIME_SERIES_CAPACITY),
            commands: Vec::new(),
            activity: Vec::new(),
        }
    }

    /// Record a stats update into the latency series.
    pub fn record_stats(&mut self, stats: &StatsSnapshot, now: Instant) {
        let at = now.saturating_duration_since(self.origin).as_secs_f64();
        self.latency.push(LatencyPoint {
            at,
            millis: stats.latency,
        });
    }

    /// Replace the distribution charts with a new analytics snapshot.
    pub fn record_analytics(&mut self, analytics: &AnalyticsSnapshot) {
        let mut commands: Vec<(String, u64)> = analytics
            .command_stats
            .iter()
            .map(|c| (c.name.clone(), c.count))
            .collect();
        commands.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        commands.truncate(COMMAND_CHART_SIZE);

        self.commands = commands;
        self.activity = analytics.hourly_activity.clone();
    }

    /// Latency series as `(x, y)` pairs for a line chart.
    pub fn latency_points(&self) -> Vec<(f64, f64)> {
        self.latency.iter().map(|p| (p.at, p.millis)).collect()
    }

    /// Bounds `(min, max)` of the latency series, padded so a flat line is visible.
    pub fn latency_bounds(&self) -> (f64, f64) {
        let max = self.latency.iter().map(|p| p.millis).fold(0.0_f64, f64::max);
        (0.0, (max * 1.2).max(10.0))
    }

    /// Activity normalized to 0-7 for 8 bar levels.
    pub fn activity_levels(&self) -> Vec<u8> {
        normalize_levels(&self.activity)
    }
}

/// Normalize values to the 0-7 range for sparkline display.
fn normalize_levels(values: &[u64]) -> Vec<u8> {
    let max = values.iter().copied().max().unwrap_or(0).max(1) as f64;
    values
        .iter()
        .map(|&v| ((v as f64 / max) * 7.0).round().min(7.0) as u8)
        .collect()
}
