//! Bounded FIFO sample history shared by the auditors

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Rolling window of the most recent `capacity` samples
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundedHistory<T> {
    samples: VecDeque<T>,
    capacity: usize,
}

impl<T> BoundedHistory<T> {
    /// Capacity is at least one
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
        }
    }

    /// Append a sample, evicting the oldest ones past capacity
    pub fn push(&mut self, sample: T) {
        self.samples.push_back(sample);
        self.evict();
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

    /// Change the capacity, dropping the oldest samples if it shrank
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity.max(1);
        self.evict();
    }

    /// Oldest first
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.samples.iter()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    fn evict(&mut self) {
        while self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_eviction() {
        let mut history = BoundedHistory::new(3);
        for i in 0..5 {
            history.push(i);
        }
        assert_eq!(history.len(), 3);
        assert_eq!(history.iter().copied().collect::<Vec<_>>(), vec![2, 3, 4]);
    }

    #[test]
    fn test_shrinking_capacity_drops_oldest() {
        let mut history = BoundedHistory::new(10);
        for i in 0..6 {
            history.push(i);
        }
        history.set_capacity(2);
        assert_eq!(history.iter().copied().collect::<Vec<_>>(), vec![4, 5]);
    }

    #[test]
    fn test_zero_capacity_keeps_one() {
        let mut history = BoundedHistory::new(0);
        history.push("a");
        history.push("b");
        assert_eq!(history.capacity(), 1);
        assert_eq!(history.iter().copied().collect::<Vec<_>>(), vec!["b"]);
    }

    #[test]
    fn test_serde_round_trip_preserves_order() {
        let mut history = BoundedHistory::new(4);
        history.push(1.5);
        history.push(2.5);
        let json = serde_json::to_string(&history).unwrap();
        let restored: BoundedHistory<f64> = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, history);
    }
}
