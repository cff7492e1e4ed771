// Copyright (c) Fusebox Contributors.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Provides a minimal millisecond wall-clock abstraction.
//!
//! # Why?
//!
//! Code that makes time-based decisions is notoriously hard to test when it
//! reads the system clock directly. This crate provides [`Clock`], a cheap
//! cloneable handle that production code uses to read the current time in
//! milliseconds, and `ClockControl` (behind the `test-util` feature), which
//! lets tests advance, rewind, or pin time manually. Tests become fast and
//! deterministic: jumping forward ten seconds is a method call, not a sleep.
//!
//! # Overview
//!
//! - [`Clock`] - Reads the current wall time in milliseconds since the Unix
//!   epoch. The default clock reads system time.
//! - `ClockControl` - Manually-driven time source for tests. Exposed only
//!   when the `test-util` feature is enabled.
//!
//! The clock makes no monotonicity promise: the system clock can be adjusted
//! between reads, and a controlled clock can be rewound on purpose. Callers
//! that must survive backward jumps have to handle them explicitly.
//!
//! # Examples
//!
//! ```
//! use tock::Clock;
//!
//! let clock = Clock::system();
//! let now = clock.current_millis();
//! ```
//!
//! # Testing
//!
//! ```
//! use std::time::Duration;
//!
//! use tock::ClockControl;
//!
//! let control = ClockControl::new();
//! let clock = control.to_clock();
//!
//! let before = clock.current_millis();
//! control.advance(Duration::from_secs(10));
//!
//! assert_eq!(clock.current_millis() - before, 10_000);
//! ```
//!
//! **Important:** never enable the `test-util` feature for production code.
//! Only use it in your `dev-dependencies`.

mod clock;
pub use clock::Clock;

#[cfg(any(feature = "test-util", test))]
mod clock_control;
#[cfg(any(feature = "test-util", test))]
pub use clock_control::ClockControl;
