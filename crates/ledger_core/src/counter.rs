//! Monotonic counter used to anchor deadlines.
//!
//! # Responsibility
//! - Abstract the external ever-increasing clock substitute (e.g. block
//!   height) behind a small trait.
//! - Provide an in-process implementation for embedding and tests.
//!
//! # Invariants
//! - `ManualCounter` never moves backwards.

use std::sync::atomic::{AtomicU64, Ordering};

/// Source of the current global counter value.
pub trait Counter {
    fn current(&self) -> u64;
}

impl<C: Counter + ?Sized> Counter for &C {
    fn current(&self) -> u64 {
        (**self).current()
    }
}

/// Thread-safe, caller-driven monotonic counter.
#[derive(Debug, Default)]
pub struct ManualCounter {
    value: AtomicU64,
}

impl ManualCounter {
    pub fn new(start: u64) -> Self {
        Self {
            value: AtomicU64::new(start),
        }
    }

    /// Advances by `by` (saturating) and returns the new value.
    pub fn advance(&self, by: u64) -> u64 {
        let previous = self
            .value
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |current| {
                Some(current.saturating_add(by))
            })
            .unwrap_or_else(|current| current);
        previous.saturating_add(by)
    }

    /// Moves the counter to `value`.
    ///
    /// Returns `Err(current)` without changing anything when `value` is lower
    /// than the current value.
    pub fn set(&self, value: u64) -> Result<(), u64> {
        self.value
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |current| {
                (value >= current).then_some(value)
            })
            .map(|_| ())
    }
}

impl Counter for ManualCounter {
    fn current(&self) -> u64 {
        self.value.load(Ordering::SeqCst)
    }
}
