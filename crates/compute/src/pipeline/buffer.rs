use std::collections::VecDeque;

use andeped_core::{AndepedError, Result};

/// Fixed-capacity FIFO over samples. Adding to a full buffer evicts the oldest sample.
#[derive(Debug, Clone)]
pub struct BoundedBuffer {
    capacity: usize,
    samples: VecDeque<f64>,
}

impl BoundedBuffer {
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(AndepedError::InvalidParameter(
                "buffer capacity must be positive".into(),
            ));
        }
        Ok(Self {
            capacity,
            samples: VecDeque::new(),
        })
    }

    /// Clear, then refill with the trailing `capacity` values of `values`.
    pub fn load(&mut self, values: &[f64]) {
        self.samples.clear();
        let start = values.len().saturating_sub(self.capacity);
        self.samples.extend(&values[start..]);
    }

    pub fn add(&mut self, value: f64) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(value);
    }

    /// Current contents, oldest first.
    pub fn snapshot(&self) -> Vec<f64> {
        self.samples.iter().copied().collect()
    }

    /// The newest `n` samples, oldest first. Returns fewer when the buffer holds fewer.
    pub fn last_n(&self, n: usize) -> Vec<f64> {
        let skip = self.samples.len().saturating_sub(n);
        self.samples.iter().skip(skip).copied().collect()
    }

    pub fn last(&self) -> Result<f64> {
        self.samples.back().copied().ok_or(AndepedError::EmptyBuffer)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.samples.len() == self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_capacity_rejected() {
        assert!(BoundedBuffer::new(0).is_err());
    }

    #[test]
    fn huge_capacity_grows_with_samples() {
        let mut buf = BoundedBuffer::new(usize::MAX).unwrap();
        buf.load(&[1.0, 2.0]);
        buf.add(3.0);
        assert_eq!(buf.snapshot(), vec![1.0, 2.0, 3.0]);
        assert_eq!(buf.capacity(), usize::MAX);
    }

    #[test]
    fn add_evicts_oldest_when_full() {
        let mut buf = BoundedBuffer::new(3).unwrap();
        for v in [1.0, 2.0, 3.0, 4.0] {
            buf.add(v);
        }
        assert_eq!(buf.snapshot(), vec![2.0, 3.0, 4.0]);
        assert!(buf.is_full());
    }

    #[test]
    fn load_keeps_trailing_values() {
        let mut buf = BoundedBuffer::new(2).unwrap();
        buf.add(99.0);
        buf.load(&[1.0, 2.0, 3.0]);
        assert_eq!(buf.snapshot(), vec![2.0, 3.0]);
    }

    #[test]
    fn load_shorter_than_capacity() {
        let mut buf = BoundedBuffer::new(5).unwrap();
        buf.load(&[1.0, 2.0]);
        assert_eq!(buf.len(), 2);
        assert!(!buf.is_full());
    }

    #[test]
    fn last_on_empty_buffer_fails() {
        let buf = BoundedBuffer::new(4).unwrap();
        assert!(matches!(buf.last(), Err(AndepedError::EmptyBuffer)));
    }

    #[test]
    fn last_n_returns_newest() {
        let mut buf = BoundedBuffer::new(4).unwrap();
        buf.load(&[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(buf.last_n(2), vec![3.0, 4.0]);
        assert_eq!(buf.last_n(10), vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(buf.last().unwrap(), 4.0);
    }
}
