use std::collections::VecDeque;

pub const DEFAULT_CAPACITY: usize = 60;

/// Fixed-capacity FIFO of metric values for time-series display.
///
/// Pre-filled with zeros at construction so consumers always see a series
/// of exactly `capacity` points, even before the first real sample. There
/// is no resize: capacity is fixed for the life of the buffer.
#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    values: VecDeque<f64>,
    capacity: usize,
}

impl HistoryBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let mut values = VecDeque::with_capacity(capacity);
        values.extend(std::iter::repeat_n(0.0, capacity));
        Self { values, capacity }
    }

    pub fn push(&mut self, value: f64) {
        if self.values.len() == self.capacity {
            self.values.pop_front();
        }
        self.values.push_back(value);
    }

    /// A copy of the series, oldest first. Never the live buffer.
    pub fn values(&self) -> Vec<f64> {
        self.values.iter().copied().collect()
    }

    pub fn latest(&self) -> f64 {
        self.values.back().copied().unwrap_or(0.0)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for HistoryBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
