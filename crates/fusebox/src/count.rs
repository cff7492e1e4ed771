// Copyright (c) Fusebox Contributors.
// Licensed under the MIT License.

/// An immutable count of success and failure events.
///
/// `EventCount` is the value a breaker inspects when deciding whether to
/// trip: the sliding-window counter aggregates events into one of these and
/// publishes it as a snapshot.
///
/// [`failure_rate()`][EventCount::failure_rate] over the zero count is NaN;
/// callers must gate on [`total()`][EventCount::total] before evaluating it.
///
/// # Examples
///
/// ```
/// use fusebox::EventCount;
///
/// let count = EventCount::new(3, 1);
/// assert_eq!(count.total(), 4);
/// assert_eq!(count.failure_rate(), 0.25);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventCount {
    success: u64,
    failure: u64,
}

impl EventCount {
    /// The well-known zero count.
    pub const ZERO: Self = Self::new(0, 0);

    /// Creates a new count from the given success and failure totals.
    #[must_use]
    pub const fn new(success: u64, failure: u64) -> Self {
        Self { success, failure }
    }

    /// Returns the number of success events.
    #[must_use]
    pub const fn success(&self) -> u64 {
        self.success
    }

    /// Returns the number of failure events.
    #[must_use]
    pub const fn failure(&self) -> u64 {
        self.failure
    }

    /// Returns the total number of events.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.success.saturating_add(self.failure)
    }

    /// Returns the fraction of events that were failures.
    ///
    /// NaN when the count is zero; check [`total()`][EventCount::total]
    /// first.
    #[must_use]
    #[expect(
        clippy::cast_precision_loss,
        reason = "rate comparisons tolerate the precision of f64 over realistic event counts"
    )]
    pub fn failure_rate(&self) -> f64 {
        self.failure as f64 / self.total() as f64
    }
}
