// Copyright (c) Fusebox Contributors.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Client-side circuit breaking for remote invocations.
//!
//! # Why?
//!
//! When a remote service degrades, callers that keep sending requests pile
//! up on an unresponsive dependency and drag their own service down with
//! it. A circuit breaker watches the failure rate of recent calls and,
//! once it exceeds a threshold, *trips*: subsequent calls fail fast with a
//! local error instead of contacting the remote. While tripped, the
//! breaker periodically admits a single probe request; one probe success
//! closes the circuit again.
//!
//! Everything in this crate is non-blocking. The breaker state is an
//! immutable value behind an atomic reference replaced via
//! compare-and-swap, and the sliding-window counter feeding the trip
//! decision is built from striped atomic counters and a lock-free queue,
//! so completion callbacks on many threads can report outcomes without
//! ever contending on a lock.
//!
//! # Circuit states
//!
//! ```text
//! ┌────────┐   failure rate exceeds threshold    ┌──────────┐
//! │ CLOSED │ ───────────────────────────────────▶│   OPEN   │
//! └────────┘                                     └──────────┘
//!      ▲                                            │     ▲
//!      │ probe                ┌───────────┐         │     │ probe
//!      │ succeeds             │ HALF_OPEN │◀────────┘     │ fails
//!      └──────────────────────└───────────┘───────────────┘
//!                        circuit open window elapsed
//! ```
//!
//! - **CLOSED**: all requests pass; outcomes are counted over a sliding
//!   window. When at least `minimum_request_threshold` events were seen
//!   and the failure rate strictly exceeds `failure_rate_threshold`, the
//!   circuit opens.
//! - **OPEN**: all requests fail fast for `circuit_open_window`, then the
//!   first request is admitted as a probe and the circuit becomes
//!   HALF_OPEN.
//! - **HALF_OPEN**: at most one probe is in flight per
//!   `trial_request_interval`. A successful probe closes the circuit with
//!   a fresh counter; a failed one reopens it.
//!
//! # Quick start
//!
//! Wrap your transport-level invoker with [`decorator`]; the decorator
//! resolves one breaker per service (or per method, with
//! [`Scope::PerMethod`]) and reports every completion into it:
//!
//! ```
//! use std::time::Duration;
//!
//! use fusebox::{
//!     CircuitBreakerConfigBuilder, ClientCodec, FailFastError, RemoteInvoker, Scope, decorator,
//! };
//!
//! // The transport that actually performs remote calls.
//! struct HttpInvoker;
//!
//! #[derive(Debug)]
//! enum RpcError {
//!     Transport(String),
//!     FailFast(FailFastError),
//! }
//!
//! impl From<FailFastError> for RpcError {
//!     fn from(cause: FailFastError) -> Self {
//!         Self::FailFast(cause)
//!     }
//! }
//!
//! impl RemoteInvoker for HttpInvoker {
//!     type Args = Vec<u8>;
//!     type Response = Vec<u8>;
//!     type Error = RpcError;
//!
//!     async fn invoke<C>(&self, uri: &str, codec: &C, method: &str, args: Vec<u8>) -> Result<Vec<u8>, RpcError>
//!     where
//!         C: ClientCodec<Vec<u8>> + Sync,
//!     {
//!         // ... perform the call over the wire ...
//!         # let _ = (uri, codec, method);
//!         Ok(args)
//!     }
//! }
//!
//! struct Codec;
//!
//! impl ClientCodec<Vec<u8>> for Codec {
//!     fn prepare_request(&self, _method: &str, _args: &Vec<u8>, _cause: &FailFastError) {}
//! }
//!
//! # async fn example() -> Result<(), fusebox::ConfigError> {
//! let config = CircuitBreakerConfigBuilder::new("billing")
//!     .failure_rate_threshold(0.5)
//!     .minimum_request_threshold(20)
//!     .circuit_open_window(Duration::from_secs(30))
//!     .scope(Scope::PerMethod)
//!     .build()?;
//!
//! let invoker = decorator(config)(HttpInvoker);
//!
//! match invoker.invoke("http://billing.local", &Codec, "charge", vec![1, 2, 3]).await {
//!     Ok(_response) => { /* the remote completed */ }
//!     Err(RpcError::FailFast(_cause)) => { /* circuit is open; take a fallback path */ }
//!     Err(RpcError::Transport(_)) => { /* the remote failed; counted by the breaker */ }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Failures that should not count as remote faults (a not-found response,
//! say) can be excluded with a [`FailureFilter`].
//!
//! # Defaults
//!
//! | Parameter | Default | Description |
//! |-----------|---------|-------------|
//! | Failure rate threshold | `0.8` | Trip when the observed failure rate strictly exceeds this |
//! | Minimum request threshold | `10` | Events required in the window before the rate is evaluated |
//! | Trial request interval | `3 s` | Interval between probes while HALF_OPEN |
//! | Circuit open window | `10 s` | Duration of the OPEN state before the first probe |
//! | Counter sliding window | `20 s` | Length of the window that accumulates outcomes |
//! | Counter update interval | `1 s` | Refresh cadence (and staleness bound) of the count snapshot |
//! | Scope | `Service` | One breaker for the whole service |
//! | Failure filter | accept all | Every failure cause counts |
//!
//! # Telemetry
//!
//! Every state transition emits one info-level `tracing` event named
//! `fusebox.circuit_breaker.transition` whose message is the single line
//! `name:<service> state:<STATE> fail:<n|-> total:<n|->`. `-` appears when
//! the transition carries no meaningful count (entering CLOSED or
//! HALF_OPEN, and OPEN reached from HALF_OPEN).
//!
//! # What this crate is not
//!
//! Breaker state is per process and never persisted: there is no
//! cross-process coordination, no adaptive threshold tuning, no request
//! timeout enforcement (that belongs to the transport), no concurrency
//! limiting, and no manual trip/reset API.

mod breaker;
pub use breaker::{CircuitBreaker, CircuitState};

mod config;
pub use config::{CircuitBreakerConfig, CircuitBreakerConfigBuilder, Scope};

mod count;
pub use count::EventCount;

mod counter;

mod error;
pub use error::{ConfigError, FailFastError};

mod failure_filter;
pub use failure_filter::FailureFilter;

mod invoker;
pub use invoker::{CircuitBreakerInvoker, ClientCodec, RemoteInvoker, decorator};

mod registry;
