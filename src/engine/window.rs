//! Bounded, ordered window of recent readings.
//!
//! The same abstraction backs the edge ring buffer (capacity = configured
//! history size) and the aggregation service's query-limited window. The
//! analytics only ever see "the last N, oldest first".

use std::collections::VecDeque;

// ---

#[derive(Debug, Clone)]
pub struct HistoryWindow<T> {
    // ---
    items: VecDeque<T>,
    capacity: usize,
}

impl<T: Clone> HistoryWindow<T> {
    // ---
    /// Empty window. A capacity of 0 is treated as 1.
    pub fn new(capacity: usize) -> Self {
        // ---
        let capacity = capacity.max(1);
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Window over the newest `capacity` entries of an oldest-first sequence.
    pub fn from_recent(items: impl IntoIterator<Item = T>, capacity: usize) -> Self {
        // ---
        let mut window = Self::new(capacity);
        for item in items {
            window.push(item);
        }
        window
    }

    /// Append the newest entry, evicting the oldest when full.
    pub fn push(&mut self, item: T) {
        // ---
        if self.items.len() == self.capacity {
            self.items.pop_front();
        }
        self.items.push_back(item);
    }

    /// Change capacity, keeping the newest entries.
    pub fn resize(&mut self, capacity: usize) {
        // ---
        self.capacity = capacity.max(1);
        while self.items.len() > self.capacity {
            self.items.pop_front();
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn latest(&self) -> Option<&T> {
        self.items.back()
    }

    /// Iterate oldest → newest.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    /// Owned copy for an evaluation; later pushes do not affect it.
    pub fn snapshot(&self) -> Vec<T> {
        self.items.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[test]
    fn test_evicts_oldest_on_overflow() {
        // ---
        let mut w = HistoryWindow::new(3);
        for i in 1..=5 {
            w.push(i);
        }
        assert_eq!(w.len(), 3);
        assert_eq!(w.snapshot(), vec![3, 4, 5]);
        assert_eq!(w.latest(), Some(&5));
    }

    #[test]
    fn test_zero_capacity_is_coerced() {
        // ---
        let mut w = HistoryWindow::new(0);
        w.push("a");
        w.push("b");
        assert_eq!(w.capacity(), 1);
        assert_eq!(w.snapshot(), vec!["b"]);
    }

    #[test]
    fn test_from_recent_keeps_newest() {
        // ---
        let w = HistoryWindow::from_recent(0..10, 4);
        assert_eq!(w.snapshot(), vec![6, 7, 8, 9]);
    }

    #[test]
    fn test_resize_keeps_newest_in_order() {
        // ---
        let mut w = HistoryWindow::from_recent(0..6, 6);
        w.resize(2);
        assert_eq!(w.snapshot(), vec![4, 5]);

        w.resize(5);
        w.push(6);
        assert_eq!(w.iter().copied().collect::<Vec<_>>(), vec![4, 5, 6]);
    }

    #[test]
    fn test_snapshot_is_detached() {
        // ---
        let mut w = HistoryWindow::new(4);
        w.push(1);
        let snap = w.snapshot();
        w.push(2);
        assert_eq!(snap, vec![1]);
        assert!(!w.is_empty());
    }
}
