// Copyright (c) Fusebox Contributors.
// Licensed under the MIT License.

use std::time::SystemTime;

#[cfg(any(feature = "test-util", test))]
use crate::clock_control::ClockControl;

/// Reads the current wall time in milliseconds.
///
/// The clock is a cheap cloneable handle. In production it reads the system
/// clock; in tests it can be backed by a `ClockControl` (available with the
/// `test-util` feature) so the flow of time is driven manually.
///
/// Clones of a controlled clock share the same underlying time source, so a
/// test can hold the control while the code under test holds clones.
///
/// # Examples
///
/// ```
/// use tock::Clock;
///
/// let clock = Clock::system();
/// let t1 = clock.current_millis();
/// let t2 = clock.current_millis();
///
/// // Wall time is not guaranteed to be monotonic, but it does not
/// // spontaneously jump backward on a healthy host.
/// assert!(t2 >= t1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Clock(ClockInner);

impl Clock {
    /// Creates a clock that reads the system wall time.
    ///
    /// This is also what [`Clock::default`] returns.
    #[must_use]
    pub fn system() -> Self {
        Self(ClockInner::System)
    }

    #[cfg(any(feature = "test-util", test))]
    pub(crate) fn with_control(control: &ClockControl) -> Self {
        Self(ClockInner::Control(control.clone()))
    }

    /// Returns the current wall time in milliseconds since the Unix epoch.
    ///
    /// Times before the epoch are reported as negative values.
    #[must_use]
    pub fn current_millis(&self) -> i64 {
        match &self.0 {
            ClockInner::System => system_millis(),
            #[cfg(any(feature = "test-util", test))]
            ClockInner::Control(control) => control.current_millis(),
        }
    }
}

impl AsRef<Self> for Clock {
    fn as_ref(&self) -> &Self {
        self
    }
}

#[derive(Debug, Clone, Default)]
enum ClockInner {
    #[default]
    System,

    #[cfg(any(feature = "test-util", test))]
    Control(ClockControl),
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "millisecond counts will not exceed the i64 range for billions of years"
)]
fn system_millis() -> i64 {
    match SystemTime::now().duration_since(SystemTime::UNIX_EPOCH) {
        Ok(since_epoch) => since_epoch.as_millis() as i64,
        Err(before_epoch) => -(before_epoch.duration().as_millis() as i64),
    }
}
