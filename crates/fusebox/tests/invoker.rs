// Copyright (c) Fusebox Contributors.
// Licensed under the MIT License.

#![allow(missing_docs, reason = "this is a test module")]

//! Integration tests for the invoker decorator using only the public API.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use fusebox::{
    CircuitBreakerConfig, CircuitBreakerConfigBuilder, CircuitBreakerInvoker, ClientCodec, FailFastError, FailureFilter,
    RemoteInvoker, Scope, decorator,
};
use tock::ClockControl;

const REMOTE_SERVICE_NAME: &str = "testservice";
const MINIMUM_REQUEST_THRESHOLD: u64 = 2;
const FAILURE_RATE_THRESHOLD: f64 = 0.5;
const CIRCUIT_OPEN_WINDOW: Duration = Duration::from_secs(60);
const COUNTER_UPDATE_INTERVAL: Duration = Duration::from_millis(1);

#[derive(Debug)]
enum StubError {
    Remote,
    FailFast(FailFastError),
}

impl From<FailFastError> for StubError {
    fn from(cause: FailFastError) -> Self {
        Self::FailFast(cause)
    }
}

/// A delegate whose outcome per method is driven by a closure, counting how
/// often it is actually invoked.
struct StubInvoker {
    calls: Arc<AtomicUsize>,
    behavior: Arc<dyn Fn(&str) -> Result<String, StubError> + Send + Sync>,
}

impl StubInvoker {
    fn new(behavior: impl Fn(&str) -> Result<String, StubError> + Send + Sync + 'static) -> Self {
        Self {
            calls: Arc::new(AtomicUsize::new(0)),
            behavior: Arc::new(behavior),
        }
    }

    /// A handle to the invocation counter, for asserting after the stub
    /// moved into the decorator.
    fn call_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

impl RemoteInvoker for StubInvoker {
    type Args = Vec<String>;
    type Response = String;
    type Error = StubError;

    async fn invoke<C>(&self, _uri: &str, _codec: &C, method: &str, _args: Vec<String>) -> Result<String, StubError>
    where
        C: ClientCodec<Vec<String>> + Sync,
    {
        self.calls.fetch_add(1, Ordering::SeqCst);
        (self.behavior)(method)
    }
}

/// Records every `prepare_request` call.
#[derive(Default)]
struct RecordingCodec {
    prepared: Mutex<Vec<(String, String, String)>>,
}

impl RecordingCodec {
    fn prepared(&self) -> MutexGuard<'_, Vec<(String, String, String)>> {
        self.prepared.lock().unwrap()
    }
}

impl ClientCodec<Vec<String>> for RecordingCodec {
    fn prepare_request(&self, method: &str, _args: &Vec<String>, cause: &FailFastError) {
        self.prepared.lock().unwrap().push((
            method.to_string(),
            cause.remote_service_name().to_string(),
            cause.method_name().to_string(),
        ));
    }
}

fn create_config(control: &ClockControl, scope: Scope) -> CircuitBreakerConfig {
    CircuitBreakerConfigBuilder::new(REMOTE_SERVICE_NAME)
        .scope(scope)
        .failure_rate_threshold(FAILURE_RATE_THRESHOLD)
        .minimum_request_threshold(MINIMUM_REQUEST_THRESHOLD)
        .circuit_open_window(CIRCUIT_OPEN_WINDOW)
        .counter_sliding_window(Duration::from_secs(180))
        .counter_update_interval(COUNTER_UPDATE_INTERVAL)
        .clock(control.to_clock())
        .build()
        .unwrap()
}

fn args() -> Vec<String> {
    vec!["a".to_string(), "b".to_string()]
}

/// Reports failures until the circuit opens: one failing invocation per
/// counter update interval, enough of them to clear the minimum request
/// threshold.
async fn open_circuit<C>(invoker: &CircuitBreakerInvoker<StubInvoker>, codec: &C, control: &ClockControl, method: &str)
where
    C: ClientCodec<Vec<String>> + Sync,
{
    for _ in 0..=MINIMUM_REQUEST_THRESHOLD {
        let result = invoker.invoke("http://xxx", codec, method, args()).await;
        assert!(matches!(result, Err(StubError::Remote)));
        control.advance(COUNTER_UPDATE_INTERVAL);
    }
}

#[tokio::test]
async fn delegates_remote_invocation() {
    let control = ClockControl::new();
    let stub = StubInvoker::new(|_| Ok("ok".to_string()));
    let calls = stub.call_counter();
    let invoker = decorator(create_config(&control, Scope::Service))(stub);

    let result = invoker.invoke("http://xxx", &RecordingCodec::default(), "methodA", args()).await;

    assert_eq!(result.unwrap(), "ok");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn state_transition_through_decorator() {
    let control = ClockControl::new();
    let codec = RecordingCodec::default();

    let healthy = Arc::new(AtomicBool::new(false));
    let healthy_flag = Arc::clone(&healthy);
    let stub = StubInvoker::new(move |_| {
        if healthy_flag.load(Ordering::SeqCst) {
            Ok("ok".to_string())
        } else {
            Err(StubError::Remote)
        }
    });
    let calls = stub.call_counter();
    let invoker = CircuitBreakerInvoker::new(stub, create_config(&control, Scope::Service));

    // CLOSED: every failure reaches the delegate and comes back verbatim.
    open_circuit(&invoker, &codec, &control, "methodA").await;
    assert_eq!(calls.load(Ordering::SeqCst), MINIMUM_REQUEST_THRESHOLD as usize + 1);

    // OPEN: refused locally, carrying the service and method names.
    let result = invoker.invoke("http://xxx", &codec, "methodA", args()).await;
    match result {
        Err(StubError::FailFast(cause)) => {
            assert_eq!(cause.remote_service_name(), REMOTE_SERVICE_NAME);
            assert_eq!(cause.method_name(), "methodA");
        }
        other => panic!("expected fail-fast, got {other:?}"),
    }
    assert_eq!(calls.load(Ordering::SeqCst), MINIMUM_REQUEST_THRESHOLD as usize + 1);

    control.advance(CIRCUIT_OPEN_WINDOW);
    healthy.store(true, Ordering::SeqCst);

    // HALF_OPEN: the probe goes through and closes the circuit.
    let result = invoker.invoke("http://xxx", &codec, "methodA", args()).await;
    assert_eq!(result.unwrap(), "ok");

    // CLOSED again.
    let result = invoker.invoke("http://xxx", &codec, "methodA", args()).await;
    assert_eq!(result.unwrap(), "ok");
}

#[tokio::test]
async fn service_scope_shares_one_circuit() {
    let control = ClockControl::new();
    let codec = RecordingCodec::default();

    let invoker = CircuitBreakerInvoker::new(
        StubInvoker::new(|method| {
            if method == "methodA" {
                Err(StubError::Remote)
            } else {
                Ok("ok".to_string())
            }
        }),
        create_config(&control, Scope::Service),
    );

    open_circuit(&invoker, &codec, &control, "methodA").await;

    let result = invoker.invoke("http://xxx", &codec, "methodA", args()).await;
    assert!(matches!(result, Err(StubError::FailFast(_))));

    // The healthy method shares the tripped circuit.
    let result = invoker.invoke("http://xxx", &codec, "methodB", args()).await;
    assert!(matches!(result, Err(StubError::FailFast(_))));
}

#[tokio::test]
async fn per_method_scope_isolates_circuits() {
    let control = ClockControl::new();
    let codec = RecordingCodec::default();

    let invoker = CircuitBreakerInvoker::new(
        StubInvoker::new(|method| {
            if method == "methodA" {
                Err(StubError::Remote)
            } else {
                Ok("ok".to_string())
            }
        }),
        create_config(&control, Scope::PerMethod),
    );

    open_circuit(&invoker, &codec, &control, "methodA").await;

    let result = invoker.invoke("http://xxx", &codec, "methodA", args()).await;
    assert!(matches!(result, Err(StubError::FailFast(_))));

    // The healthy method keeps its own closed circuit.
    let result = invoker.invoke("http://xxx", &codec, "methodB", args()).await;
    assert_eq!(result.unwrap(), "ok");
}

#[tokio::test]
async fn failure_filter_keeps_circuit_closed() {
    let control = ClockControl::new();
    let codec = RecordingCodec::default();

    let stub = StubInvoker::new(|_| Err(StubError::Remote));
    let calls = stub.call_counter();
    let invoker = CircuitBreakerInvoker::new(stub, create_config(&control, Scope::Service))
        .failure_filter(FailureFilter::new(|_| false));

    open_circuit(&invoker, &codec, &control, "methodA").await;

    // None of the failures counted, so the next call still reaches the
    // delegate instead of failing fast.
    let result = invoker.invoke("http://xxx", &codec, "methodA", args()).await;
    assert!(matches!(result, Err(StubError::Remote)));
    assert_eq!(calls.load(Ordering::SeqCst), MINIMUM_REQUEST_THRESHOLD as usize + 2);
}

#[tokio::test]
async fn codec_prepares_only_fail_fast_requests() {
    let control = ClockControl::new();
    let codec = RecordingCodec::default();

    let healthy = Arc::new(AtomicBool::new(true));
    let healthy_flag = Arc::clone(&healthy);
    let invoker = CircuitBreakerInvoker::new(
        StubInvoker::new(move |_| {
            if healthy_flag.load(Ordering::SeqCst) {
                Ok("ok".to_string())
            } else {
                Err(StubError::Remote)
            }
        }),
        create_config(&control, Scope::Service),
    );

    let result = invoker.invoke("http://xxx", &codec, "methodA", args()).await;
    assert!(result.is_ok());
    assert!(codec.prepared().is_empty());

    healthy.store(false, Ordering::SeqCst);
    open_circuit(&invoker, &codec, &control, "methodA").await;
    assert!(codec.prepared().is_empty());

    let result = invoker.invoke("http://xxx", &codec, "methodA", args()).await;
    assert!(matches!(result, Err(StubError::FailFast(_))));

    let prepared = codec.prepared();
    assert_eq!(
        *prepared,
        vec![(
            "methodA".to_string(),
            REMOTE_SERVICE_NAME.to_string(),
            "methodA".to_string()
        )]
    );
}
