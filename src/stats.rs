// src/stats.rs
//! Rolling statistics over fix snapshots

use std::collections::{HashMap, VecDeque};

use crate::gps::data::GpsFix;

/// Per-field aggregation result. A field is `None` when the window is empty
/// (all aggregations) or when no value repeats (mode).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FieldStats {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub height: Option<f64>,
}

/// Bounded FIFO window of fix snapshots with mean/median/mode aggregation.
///
/// Aggregations are recomputed from the window contents on every call;
/// at the default capacity of 10 that is cheaper than maintaining
/// incremental state.
pub struct GpsStatistics {
    window: VecDeque<GpsFix>,
    capacity: usize,
}

impl Default for GpsStatistics {
    fn default() -> Self {
        Self::new()
    }
}

impl GpsStatistics {
    pub const DEFAULT_CAPACITY: usize = 10;

    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            window: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a snapshot, evicting the oldest entry at capacity.
    pub fn push(&mut self, fix: GpsFix) {
        if self.capacity == 0 {
            return;
        }
        while self.window.len() >= self.capacity {
            self.window.pop_front();
        }
        self.window.push_back(fix);
    }

    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn mean(&self) -> FieldStats {
        self.aggregate(mean)
    }

    pub fn median(&self) -> FieldStats {
        self.aggregate(median)
    }

    /// Most frequent value per field. Absent unless exactly one value has
    /// the strictly highest repeat count above one.
    pub fn mode(&self) -> FieldStats {
        self.aggregate(mode)
    }

    fn aggregate(&self, f: fn(Vec<f64>) -> Option<f64>) -> FieldStats {
        if self.window.is_empty() {
            return FieldStats::default();
        }
        FieldStats {
            latitude: f(self.field(|fix| fix.latitude)),
            longitude: f(self.field(|fix| fix.longitude)),
            height: f(self.field(|fix| fix.height)),
        }
    }

    fn field(&self, get: fn(&GpsFix) -> f64) -> Vec<f64> {
        self.window.iter().map(get).collect()
    }
}

fn mean(values: Vec<f64>) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

fn median(mut values: Vec<f64>) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        Some(values[mid])
    } else {
        Some((values[mid - 1] + values[mid]) / 2.0)
    }
}

fn mode(values: Vec<f64>) -> Option<f64> {
    // Decoded coordinates come from text fields, so keying on the bit
    // pattern is exact and NaN never enters the window.
    let mut counts: HashMap<u64, (f64, usize)> = HashMap::new();
    for value in values {
        counts.entry(value.to_bits()).or_insert((value, 0)).1 += 1;
    }

    let best = counts.values().map(|&(_, n)| n).max()?;
    if best < 2 {
        return None;
    }
    let mut at_best = counts.values().filter(|&&(_, n)| n == best);
    let (value, _) = *at_best.next()?;
    if at_best.next().is_some() {
        // Multimodal: no single answer.
        return None;
    }
    Some(value)
}
