// Copyright (c) Fusebox Contributors.
// Licensed under the MIT License.

use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::EventCount;
use crate::config::{CircuitBreakerConfig, duration_millis};
use crate::counter::{EventCounter, NoOpCounter, SlidingWindowCounter};

/// The state a circuit breaker is in.
///
/// Exactly one of these holds at any instant; transitions replace the
/// breaker's state atomically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Normal operation. All requests are sent to the remote service and
    /// their outcomes are counted.
    Closed,

    /// The circuit is tripped. All requests fail fast without calling the
    /// remote service.
    Open,

    /// Probation. One trial request at a time is admitted until one
    /// succeeds or fails; if it does not complete within the trial request
    /// interval, another trial request is admitted.
    HalfOpen,
}

impl CircuitState {
    /// Returns the name of the state as it appears in transition logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Closed => "CLOSED",
            Self::Open => "OPEN",
            Self::HalfOpen => "HALF_OPEN",
        }
    }

    /// Returns `true` for [`CircuitState::Closed`].
    #[must_use]
    pub const fn is_closed(self) -> bool {
        matches!(self, Self::Closed)
    }

    /// Returns `true` for [`CircuitState::Open`].
    #[must_use]
    pub const fn is_open(self) -> bool {
        matches!(self, Self::Open)
    }

    /// Returns `true` for [`CircuitState::HalfOpen`].
    #[must_use]
    pub const fn is_half_open(self) -> bool {
        matches!(self, Self::HalfOpen)
    }
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The immutable per-state bundle the breaker swaps atomically.
#[derive(Debug)]
struct BreakerState {
    circuit_state: CircuitState,

    counter: Box<dyn EventCounter>,

    /// Clock value at state entry.
    start_millis: i64,

    /// Max duration of the state in milliseconds; zero never times out.
    timeout_millis: i64,
}

impl BreakerState {
    fn timed_out(&self, now: i64) -> bool {
        0 < self.timeout_millis && self.start_millis + self.timeout_millis <= now
    }
}

/// A non-blocking implementation of the circuit breaker pattern.
///
/// The breaker starts CLOSED with an empty counter. Reporting calls feed
/// [`on_success`][Self::on_success] / [`on_failure`][Self::on_failure];
/// initiators ask [`can_request`][Self::can_request] before contacting the
/// remote. All three operations are bounded-time and lock-free: the
/// per-state bundle (state kind, counter, timings) is an immutable value
/// behind a single atomic reference, and transitions replace it via
/// compare-and-swap. A caller that loses a transition race never retries;
/// the observed state wins.
///
/// Every transition is logged at info level as a single line
/// `name:<service> state:<STATE> fail:<n|-> total:<n|->`, with `-` when the
/// transition carries no meaningful count.
///
/// Breakers are usually managed by
/// [`CircuitBreakerInvoker`][crate::CircuitBreakerInvoker], which scopes
/// them per service or per method and reports outcomes of the wrapped
/// invocations, but nothing prevents driving one directly.
#[derive(Debug)]
pub struct CircuitBreaker {
    name: String,

    config: CircuitBreakerConfig,

    current: ArcSwap<BreakerState>,
}

impl CircuitBreaker {
    /// Creates a new breaker with the given name, starting CLOSED.
    #[must_use]
    pub fn new(name: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        let breaker = Self {
            name: name.into(),
            current: ArcSwap::from_pointee(new_closed_state(&config)),
            config,
        };
        breaker.log_state_transition(CircuitState::Closed, EventCount::ZERO);
        breaker
    }

    /// Returns the breaker's name, as used in transition logs.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the state the breaker is currently in.
    #[must_use]
    pub fn current_state(&self) -> CircuitState {
        self.current.load().circuit_state
    }

    /// Decides whether a request should be allowed or refused according to
    /// the current circuit state.
    ///
    /// In OPEN and HALF_OPEN, the first caller to observe an elapsed state
    /// timeout wins a transition into HALF_OPEN and is admitted as the
    /// trial request; everyone else is refused until the next interval.
    #[must_use]
    pub fn can_request(&self) -> bool {
        let state = self.current.load_full();
        match state.circuit_state {
            // All requests are allowed during CLOSED.
            CircuitState::Closed => true,
            CircuitState::Open | CircuitState::HalfOpen => {
                let now = self.config.clock().current_millis();
                if state.timed_out(now) && self.try_transition(&state, new_half_open_state(&self.config)) {
                    self.log_state_transition(CircuitState::HalfOpen, EventCount::ZERO);
                    return true;
                }
                // All other requests are refused.
                false
            }
        }
    }

    /// Reports a successful completion of a request.
    pub fn on_success(&self) {
        let state = self.current.load_full();
        match state.circuit_state {
            CircuitState::Closed => state.counter.on_success(),
            // One success during HALF_OPEN closes the circuit.
            CircuitState::HalfOpen => {
                if self.try_transition(&state, new_closed_state(&self.config)) {
                    self.log_state_transition(CircuitState::Closed, EventCount::ZERO);
                }
            }
            CircuitState::Open => {}
        }
    }

    /// Reports a failed completion of a request.
    pub fn on_failure(&self) {
        let state = self.current.load_full();
        match state.circuit_state {
            CircuitState::Closed => {
                state.counter.on_failure();
                let count = state.counter.count();
                if self.exceeds_failure_threshold(count) && self.try_transition(&state, new_open_state(&self.config)) {
                    self.log_state_transition(CircuitState::Open, count);
                }
            }
            // A failure during HALF_OPEN reopens the circuit.
            CircuitState::HalfOpen => {
                if self.try_transition(&state, new_open_state(&self.config)) {
                    self.log_state_transition(CircuitState::Open, EventCount::ZERO);
                }
            }
            CircuitState::Open => {}
        }
    }

    fn exceeds_failure_threshold(&self, count: EventCount) -> bool {
        // Strict comparison: a rate exactly at the threshold does not trip.
        // NaN over the zero count compares false on both clauses.
        self.config.minimum_request_threshold() <= count.total()
            && self.config.failure_rate_threshold() < count.failure_rate()
    }

    /// Installs `next` if the breaker is still in `expected`. A lost race
    /// is not retried.
    fn try_transition(&self, expected: &Arc<BreakerState>, next: BreakerState) -> bool {
        let previous = self.current.compare_and_swap(expected, Arc::new(next));
        Arc::ptr_eq(&previous, expected)
    }

    fn log_state_transition(&self, state: CircuitState, count: EventCount) {
        if count == EventCount::ZERO {
            tracing::event!(
                name: "fusebox.circuit_breaker.transition",
                tracing::Level::INFO,
                "name:{} state:{} fail:- total:-",
                self.name,
                state.as_str(),
            );
        } else {
            tracing::event!(
                name: "fusebox.circuit_breaker.transition",
                tracing::Level::INFO,
                "name:{} state:{} fail:{} total:{}",
                self.name,
                state.as_str(),
                count.failure(),
                count.total(),
            );
        }
    }
}

fn new_closed_state(config: &CircuitBreakerConfig) -> BreakerState {
    BreakerState {
        circuit_state: CircuitState::Closed,
        counter: Box::new(SlidingWindowCounter::new(config)),
        start_millis: config.clock().current_millis(),
        timeout_millis: 0,
    }
}

fn new_open_state(config: &CircuitBreakerConfig) -> BreakerState {
    BreakerState {
        circuit_state: CircuitState::Open,
        counter: Box::new(NoOpCounter),
        start_millis: config.clock().current_millis(),
        timeout_millis: duration_millis(config.circuit_open_window()),
    }
}

fn new_half_open_state(config: &CircuitBreakerConfig) -> BreakerState {
    BreakerState {
        circuit_state: CircuitState::HalfOpen,
        counter: Box::new(NoOpCounter),
        start_millis: config.clock().current_millis(),
        timeout_millis: duration_millis(config.trial_request_interval()),
    }
}
