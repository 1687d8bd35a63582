use std::collections::VecDeque;

/// Fixed-capacity sample window, oldest first.
///
/// Seeded with `capacity` copies of a fill value (zero by default) so the
/// window is always full; every append evicts the oldest sample.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryBuffer {
    samples: VecDeque<f64>,
    capacity: usize,
}

impl HistoryBuffer {
    pub fn new(capacity: usize) -> Self {
        Self::filled(capacity, 0.0)
    }

    pub fn filled(capacity: usize, value: f64) -> Self {
        let mut samples = VecDeque::with_capacity(capacity);
        samples.resize(capacity, value);
        Self { samples, capacity }
    }

    pub fn append(&mut self, value: f64) {
        if self.capacity == 0 {
            return;
        }
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(value);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Most recent sample.
    pub fn latest(&self) -> Option<f64> {
        self.samples.back().copied()
    }

    /// Oldest → newest.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = f64> + ExactSizeIterator + '_ {
        self.samples.iter().copied()
    }

    pub fn to_vec(&self) -> Vec<f64> {
        self.iter().collect()
    }

    /// Smallest non-NaN sample.
    pub fn min(&self) -> Option<f64> {
        self.iter().filter(|v| !v.is_nan()).reduce(f64::min)
    }

    /// Largest non-NaN sample.
    pub fn max(&self) -> Option<f64> {
        self.iter().filter(|v| !v.is_nan()).reduce(f64::max)
    }
}
