// Copyright (c) Fusebox Contributors.
// Licensed under the MIT License.

use std::sync::Arc;
use std::time::Duration;

use tock::Clock;

use crate::ConfigError;

/// Default threshold of failure rate beyond which the circuit trips.
const DEFAULT_FAILURE_RATE_THRESHOLD: f64 = 0.8;

/// Default minimum number of events within the sliding window before the
/// failure rate is evaluated at all.
const DEFAULT_MINIMUM_REQUEST_THRESHOLD: u64 = 10;

/// Default interval between trial requests while the circuit is HALF_OPEN.
const DEFAULT_TRIAL_REQUEST_INTERVAL: Duration = Duration::from_secs(3);

/// Default duration the circuit stays OPEN before the first trial request.
const DEFAULT_CIRCUIT_OPEN_WINDOW: Duration = Duration::from_secs(10);

/// Default length of the sliding window that accumulates event counts.
const DEFAULT_COUNTER_SLIDING_WINDOW: Duration = Duration::from_secs(20);

/// Default interval at which the accumulated count snapshot is refreshed.
const DEFAULT_COUNTER_UPDATE_INTERVAL: Duration = Duration::from_secs(1);

/// Converts a configured duration to whole milliseconds.
#[expect(
    clippy::cast_possible_truncation,
    reason = "saturated before the cast; validated durations fit i64 milliseconds"
)]
pub(crate) fn duration_millis(duration: Duration) -> i64 {
    duration.as_millis().min(i64::MAX as u128) as i64
}

/// A policy of circuit breaker scoping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// One circuit breaker shared by all methods of the remote service.
    Service,

    /// One circuit breaker per method of the remote service.
    PerMethod,
}

/// Stores the configuration of a circuit breaker.
///
/// Built through [`CircuitBreakerConfigBuilder`], which validates every
/// parameter. The config is cheap to clone and is shared by every breaker
/// created from it.
#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    remote_service_name: Arc<str>,
    failure_rate_threshold: f64,
    scope: Scope,
    clock: Clock,
    minimum_request_threshold: u64,
    trial_request_interval: Duration,
    circuit_open_window: Duration,
    counter_sliding_window: Duration,
    counter_update_interval: Duration,
}

impl CircuitBreakerConfig {
    /// Returns the name of the remote service, as used in logs and in
    /// [`FailFastError`][crate::FailFastError].
    #[must_use]
    pub fn remote_service_name(&self) -> &str {
        &self.remote_service_name
    }

    pub(crate) fn remote_service_name_arc(&self) -> Arc<str> {
        Arc::clone(&self.remote_service_name)
    }

    /// Returns the scoping policy.
    #[must_use]
    pub fn scope(&self) -> Scope {
        self.scope
    }

    /// Returns the failure rate beyond which the circuit trips.
    #[must_use]
    pub fn failure_rate_threshold(&self) -> f64 {
        self.failure_rate_threshold
    }

    /// Returns the minimum number of events within the sliding window
    /// required before the failure rate is evaluated.
    #[must_use]
    pub fn minimum_request_threshold(&self) -> u64 {
        self.minimum_request_threshold
    }

    /// Returns the interval between trial requests in HALF_OPEN.
    #[must_use]
    pub fn trial_request_interval(&self) -> Duration {
        self.trial_request_interval
    }

    /// Returns the duration of the OPEN state.
    #[must_use]
    pub fn circuit_open_window(&self) -> Duration {
        self.circuit_open_window
    }

    /// Returns the length of the sliding window.
    #[must_use]
    pub fn counter_sliding_window(&self) -> Duration {
        self.counter_sliding_window
    }

    /// Returns the interval at which the count snapshot is refreshed.
    #[must_use]
    pub fn counter_update_interval(&self) -> Duration {
        self.counter_update_interval
    }

    /// Returns the clock the breaker reads time from.
    #[must_use]
    pub fn clock(&self) -> &Clock {
        &self.clock
    }
}

/// Builds a [`CircuitBreakerConfig`] using the builder pattern.
///
/// Setters store the raw values; [`build()`][Self::build] performs all
/// validation and reports the first violated invariant as a
/// [`ConfigError`].
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use fusebox::CircuitBreakerConfigBuilder;
///
/// let config = CircuitBreakerConfigBuilder::new("billing")
///     .failure_rate_threshold(0.5)
///     .minimum_request_threshold(20)
///     .circuit_open_window(Duration::from_secs(30))
///     .build()?;
///
/// assert_eq!(config.remote_service_name(), "billing");
/// # Ok::<(), fusebox::ConfigError>(())
/// ```
#[derive(Debug)]
pub struct CircuitBreakerConfigBuilder {
    remote_service_name: String,
    failure_rate_threshold: f64,
    scope: Scope,
    clock: Clock,
    minimum_request_threshold: u64,
    trial_request_interval: Duration,
    circuit_open_window: Duration,
    counter_sliding_window: Duration,
    counter_update_interval: Duration,
}

impl CircuitBreakerConfigBuilder {
    /// Creates a new builder for the remote service with the given name.
    ///
    /// All other parameters start at their defaults: trip at a failure rate
    /// above 0.8 once at least 10 events were seen within a 20 second
    /// window refreshed every second, stay OPEN for 10 seconds, probe every
    /// 3 seconds while HALF_OPEN, one breaker per service.
    #[must_use]
    pub fn new(remote_service_name: impl Into<String>) -> Self {
        Self {
            remote_service_name: remote_service_name.into(),
            failure_rate_threshold: DEFAULT_FAILURE_RATE_THRESHOLD,
            scope: Scope::Service,
            clock: Clock::system(),
            minimum_request_threshold: DEFAULT_MINIMUM_REQUEST_THRESHOLD,
            trial_request_interval: DEFAULT_TRIAL_REQUEST_INTERVAL,
            circuit_open_window: DEFAULT_CIRCUIT_OPEN_WINDOW,
            counter_sliding_window: DEFAULT_COUNTER_SLIDING_WINDOW,
            counter_update_interval: DEFAULT_COUNTER_UPDATE_INTERVAL,
        }
    }

    /// Sets the threshold of failure rate used to detect a remote service
    /// fault.
    ///
    /// Must be greater than 0 and at most 1.
    #[must_use]
    pub fn failure_rate_threshold(mut self, threshold: f64) -> Self {
        self.failure_rate_threshold = threshold;
        self
    }

    /// Sets the scoping policy.
    #[must_use]
    pub fn scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    /// Sets the minimum number of events within the sliding window required
    /// before the failure rate is evaluated.
    ///
    /// Zero means a single counted failure can trip the circuit.
    #[must_use]
    pub fn minimum_request_threshold(mut self, threshold: u64) -> Self {
        self.minimum_request_threshold = threshold;
        self
    }

    /// Sets the interval between trial requests in HALF_OPEN. Must be
    /// greater than zero.
    #[must_use]
    pub fn trial_request_interval(mut self, interval: Duration) -> Self {
        self.trial_request_interval = interval;
        self
    }

    /// Sets the duration of the OPEN state. Must be greater than zero.
    #[must_use]
    pub fn circuit_open_window(mut self, window: Duration) -> Self {
        self.circuit_open_window = window;
        self
    }

    /// Sets the length of the sliding window that accumulates event counts.
    ///
    /// Must be greater than zero and greater than the counter update
    /// interval.
    #[must_use]
    pub fn counter_sliding_window(mut self, window: Duration) -> Self {
        self.counter_sliding_window = window;
        self
    }

    /// Sets the interval at which the accumulated count snapshot is
    /// refreshed. Must be greater than zero.
    #[must_use]
    pub fn counter_update_interval(mut self, interval: Duration) -> Self {
        self.counter_update_interval = interval;
        self
    }

    /// Sets the clock the breaker reads time from.
    ///
    /// The default reads system time; tests inject a controlled clock.
    #[must_use]
    pub fn clock(mut self, clock: impl AsRef<Clock>) -> Self {
        self.clock = clock.as_ref().clone();
        self
    }

    /// Builds the config, validating every parameter.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] naming the first violated invariant.
    pub fn build(self) -> Result<CircuitBreakerConfig, ConfigError> {
        if self.remote_service_name.is_empty() {
            return Err(ConfigError::invalid_argument("remote_service_name must not be empty"));
        }

        if !(self.failure_rate_threshold > 0.0 && self.failure_rate_threshold <= 1.0) {
            return Err(ConfigError::invalid_argument(
                "failure_rate_threshold must be between 0 (exclusive) and 1 (inclusive)",
            ));
        }

        if self.trial_request_interval.is_zero() {
            return Err(ConfigError::invalid_argument("trial_request_interval must be greater than zero"));
        }

        if self.circuit_open_window.is_zero() {
            return Err(ConfigError::invalid_argument("circuit_open_window must be greater than zero"));
        }

        if self.counter_sliding_window.is_zero() {
            return Err(ConfigError::invalid_argument("counter_sliding_window must be greater than zero"));
        }

        if self.counter_update_interval.is_zero() {
            return Err(ConfigError::invalid_argument("counter_update_interval must be greater than zero"));
        }

        if self.counter_sliding_window <= self.counter_update_interval {
            return Err(ConfigError::invalid_argument(
                "counter_sliding_window must be greater than counter_update_interval",
            ));
        }

        Ok(CircuitBreakerConfig {
            remote_service_name: self.remote_service_name.into(),
            failure_rate_threshold: self.failure_rate_threshold,
            scope: self.scope,
            clock: self.clock,
            minimum_request_threshold: self.minimum_request_threshold,
            trial_request_interval: self.trial_request_interval,
            circuit_open_window: self.circuit_open_window,
            counter_sliding_window: self.counter_sliding_window,
            counter_update_interval: self.counter_update_interval,
        })
    }
}
