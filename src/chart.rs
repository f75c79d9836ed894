//! Rolling CPU series for the dashboard chart
//!
//! Fixed number of slots. Points are appended until the series is full, then
//! the write position wraps to slot 0 and overwrites in place, so the chart
//! reads like a sweeping oscilloscope trace.

pub const DEFAULT_POINTS: usize = 100;

#[derive(Debug, Clone)]
pub struct CpuSeries {
    capacity: usize,
    values: Vec<f64>,
    cursor: usize,
    filled: bool,
}

impl Default for CpuSeries {
    fn default() -> Self {
        Self::new(DEFAULT_POINTS)
    }
}

impl CpuSeries {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            values: Vec::with_capacity(capacity),
            cursor: 0,
            filled: false,
        }
    }

    pub fn push(&mut self, value: f64) {
        if self.cursor >= self.capacity {
            self.filled = true;
            self.cursor = 0;
        }
        if self.filled {
            self.values[self.cursor] = value;
        } else {
            self.values.push(value);
        }
        self.cursor += 1;
    }

    /// `(slot, value)` pairs ordered by slot.
    pub fn points(&self) -> Vec<(f64, f64)> {
        self.values
            .iter()
            .enumerate()
            .map(|(i, v)| (i as f64, *v))
            .collect()
    }

    /// Most recently written value
    pub fn latest(&self) -> Option<f64> {
        self.cursor
            .checked_sub(1)
            .and_then(|i| self.values.get(i))
            .copied()
    }

    pub fn max_value(&self) -> f64 {
        self.values.iter().copied().fold(0.0, f64::max)
    }

    /// Slot the most recent value was written to.
    pub fn cursor(&self) -> usize {
        self.cursor.saturating_sub(1)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.filled || self.values.len() == self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_appends_until_full() {
        let mut series = CpuSeries::new(3);
        series.push(1.0);
        series.push(2.0);
        assert_eq!(series.points(), vec![(0.0, 1.0), (1.0, 2.0)]);
        assert!(!series.is_full());

        series.push(3.0);
        assert!(series.is_full());
        assert_eq!(series.latest(), Some(3.0));
    }

    #[test]
    fn test_wraps_and_overwrites() {
        let mut series = CpuSeries::new(3);
        for v in [1.0, 2.0, 3.0, 4.0, 5.0] {
            series.push(v);
        }
        assert_eq!(series.len(), 3);
        assert_eq!(series.points(), vec![(0.0, 4.0), (1.0, 5.0), (2.0, 3.0)]);
        assert_eq!(series.cursor(), 1);
        assert_eq!(series.latest(), Some(5.0));
        assert_eq!(series.max_value(), 5.0);
    }

    #[test]
    fn test_empty_series() {
        let series = CpuSeries::new(0);
        assert_eq!(series.capacity(), 1);
        assert!(series.is_empty());
        assert_eq!(series.latest(), None);
        assert_eq!(series.max_value(), 0.0);
    }
}
