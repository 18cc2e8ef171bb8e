// Generation-counted "sync in progress" indicator.
//
// Each cycle takes a fresh generation when it starts. Clearing is only
// honoured for the generation that currently owns the indicator, so a slow
// older cycle cannot switch off a newer cycle's indicator.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

#[derive(Debug, Default)]
pub struct ProgressTracker {
    next: AtomicU64,
    current: Mutex<Option<u64>>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the indicator for a new cycle and return its generation.
    pub fn begin(&self) -> u64 {
        let generation = self.next.fetch_add(1, Ordering::Relaxed) + 1;
        *self.lock() = Some(generation);
        generation
    }

    /// Release the indicator if `generation` still owns it.
    /// Returns true when the indicator was cleared.
    pub fn finish(&self, generation: u64) -> bool {
        let mut current = self.lock();
        if *current == Some(generation) {
            *current = None;
            true
        } else {
            false
        }
    }

    pub fn current(&self) -> Option<u64> {
        *self.lock()
    }

    pub fn is_active(&self) -> bool {
        self.current().is_some()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<u64>> {
        // The guarded value is a plain Option; a poisoned lock still holds a valid one.
        self.current.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generations_increase() {
        let tracker = ProgressTracker::new();
        let a = tracker.begin();
        let b = tracker.begin();
        assert!(b > a);
        assert_eq!(tracker.current(), Some(b));
    }

    #[test]
    fn finish_clears_matching_generation() {
        let tracker = ProgressTracker::new();
        let generation = tracker.begin();
        assert!(tracker.finish(generation));
        assert!(!tracker.is_active());
    }

    #[test]
    fn stale_finish_does_not_clear_newer_cycle() {
        let tracker = ProgressTracker::new();
        let older = tracker.begin();
        let newer = tracker.begin();

        assert!(!tracker.finish(older));
        assert_eq!(tracker.current(), Some(newer));
        assert!(tracker.finish(newer));
        assert!(!tracker.is_active());
    }

    #[test]
    fn double_finish_is_a_no_op() {
        let tracker = ProgressTracker::new();
        let generation = tracker.begin();
        assert!(tracker.finish(generation));
        assert!(!tracker.finish(generation));
    }
}
