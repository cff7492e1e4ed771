// Copyright (c) Fusebox Contributors.
// Licensed under the MIT License.

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use crate::Clock;

/// Controls the flow of time in tests.
///
/// A `ClockControl` owns a millisecond counter that only moves when told to.
/// Clocks created through [`ClockControl::to_clock`] (and their clones) all
/// read that shared counter, so a single control drives every clock handed
/// to the code under test.
///
/// `ClockControl` is available when the `test-util` feature is enabled.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use tock::ClockControl;
///
/// let control = ClockControl::new();
/// let clock = control.to_clock();
///
/// control.advance(Duration::from_secs(3));
/// assert_eq!(clock.current_millis(), 3_000);
///
/// control.rewind(Duration::from_secs(1));
/// assert_eq!(clock.current_millis(), 2_000);
/// ```
///
/// # Production code and `ClockControl`
///
/// Never enable the `test-util` feature in production code; always keep it
/// confined to `dev-dependencies`.
#[derive(Debug, Clone, Default)]
pub struct ClockControl {
    millis: Arc<AtomicI64>,
}

impl ClockControl {
    /// Creates a control whose time starts at the Unix epoch (zero
    /// milliseconds).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a control whose time starts at the given millisecond value.
    #[must_use]
    pub fn new_at(millis: i64) -> Self {
        Self {
            millis: Arc::new(AtomicI64::new(millis)),
        }
    }

    /// Creates a control whose time starts at the current system time.
    #[must_use]
    pub fn now() -> Self {
        Self::new_at(Clock::system().current_millis())
    }

    /// Creates a clock that reads this control's time.
    #[must_use]
    pub fn to_clock(&self) -> Clock {
        Clock::with_control(self)
    }

    /// Returns the control's current time in milliseconds.
    #[must_use]
    pub fn current_millis(&self) -> i64 {
        self.millis.load(Ordering::SeqCst)
    }

    /// Moves time forward by the given duration.
    pub fn advance(&self, duration: Duration) {
        self.millis.fetch_add(duration_millis(duration), Ordering::SeqCst);
    }

    /// Moves time backward by the given duration.
    ///
    /// Useful for exercising code paths that must survive the wall clock
    /// jumping backward.
    pub fn rewind(&self, duration: Duration) {
        self.millis.fetch_sub(duration_millis(duration), Ordering::SeqCst);
    }

    /// Pins time to the given millisecond value.
    pub fn set_millis(&self, millis: i64) {
        self.millis.store(millis, Ordering::SeqCst);
    }
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "test durations will not exceed the i64 millisecond range"
)]
fn duration_millis(duration: Duration) -> i64 {
    duration.as_millis() as i64
}
