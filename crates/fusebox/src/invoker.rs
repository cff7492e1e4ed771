// Copyright (c) Fusebox Contributors.
// Licensed under the MIT License.

use crate::config::CircuitBreakerConfig;
use crate::registry::BreakerRegistry;
use crate::{FailFastError, FailureFilter};

/// Prepares requests on behalf of a remote invoker.
///
/// The codec is an external collaborator of the decorator: when a call is
/// refused because the circuit is tripped, the delegate is never invoked,
/// so the decorator hands the already-failed completion to
/// [`prepare_request`][Self::prepare_request] so codec-side bookkeeping
/// still runs. The decorator calls it on no other path.
pub trait ClientCodec<Args>: Send + Sync {
    /// Prepares a request whose completion has already failed with `cause`.
    fn prepare_request(&self, method: &str, args: &Args, cause: &FailFastError);
}

/// An asynchronous invoker of remote service methods.
///
/// The transport behind this trait is out of the circuit breaker's scope;
/// the breaker only needs the completion of
/// [`invoke`][Self::invoke] to observe success or a failure cause.
pub trait RemoteInvoker: Send + Sync {
    /// The argument bundle of one method call.
    type Args: Send;

    /// The value of a successful completion.
    type Response: Send;

    /// The cause of a failed completion.
    type Error: Send;

    /// Invokes `method` of the service at `uri` with `args`.
    fn invoke<C>(
        &self,
        uri: &str,
        codec: &C,
        method: &str,
        args: Self::Args,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send
    where
        C: ClientCodec<Self::Args> + Sync;
}

/// A [`RemoteInvoker`] decorator that deals with failures of remote
/// invocation based on the circuit breaker pattern.
///
/// Each invocation resolves a [`CircuitBreaker`][crate::CircuitBreaker]
/// according to the configured [`Scope`][crate::Scope] and asks it whether
/// the request may proceed. Allowed requests are forwarded to the delegate
/// and their awaited outcome is reported back to the breaker: a success
/// unconditionally, a failure only when the
/// [`FailureFilter`] accepts the cause. Refused requests complete
/// immediately with a [`FailFastError`] without contacting the remote; the
/// delegate's own outcomes are returned verbatim, never transformed.
///
/// Use [`decorator`] to obtain a function that wraps any invoker value with
/// a given configuration.
pub struct CircuitBreakerInvoker<I: RemoteInvoker> {
    delegate: I,
    config: CircuitBreakerConfig,
    registry: BreakerRegistry,
    failure_filter: FailureFilter<I::Error>,
}

impl<I: RemoteInvoker> CircuitBreakerInvoker<I> {
    /// Creates a new instance that decorates the given delegate.
    ///
    /// The failure filter starts as
    /// [`FailureFilter::accept_all`]; replace it with
    /// [`failure_filter`][Self::failure_filter].
    #[must_use]
    pub fn new(delegate: I, config: CircuitBreakerConfig) -> Self {
        Self {
            registry: BreakerRegistry::new(&config),
            delegate,
            config,
            failure_filter: FailureFilter::accept_all(),
        }
    }

    /// Sets the filter that decides which failure causes count toward
    /// tripping the circuit.
    #[must_use]
    pub fn failure_filter(mut self, filter: FailureFilter<I::Error>) -> Self {
        self.failure_filter = filter;
        self
    }
}

impl<I> RemoteInvoker for CircuitBreakerInvoker<I>
where
    I: RemoteInvoker,
    I::Error: From<FailFastError>,
{
    type Args = I::Args;
    type Response = I::Response;
    type Error = I::Error;

    async fn invoke<C>(&self, uri: &str, codec: &C, method: &str, args: Self::Args) -> Result<Self::Response, Self::Error>
    where
        C: ClientCodec<Self::Args> + Sync,
    {
        let circuit_breaker = self.registry.get(method);

        if circuit_breaker.can_request() {
            let result = self.delegate.invoke(uri, codec, method, args).await;

            match &result {
                Ok(_) => circuit_breaker.on_success(),
                Err(cause) => {
                    if self.failure_filter.should_deal_with(cause) {
                        circuit_breaker.on_failure();
                    }
                }
            }

            result
        } else {
            // The circuit is tripped; fail fast without calling the
            // succeeding remote invokers.
            let cause = FailFastError::new(self.config.remote_service_name_arc(), method);
            codec.prepare_request(method, &args, &cause);
            Err(cause.into())
        }
    }
}

impl<I: RemoteInvoker> std::fmt::Debug for CircuitBreakerInvoker<I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CircuitBreakerInvoker")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Returns a decorator function that wraps any [`RemoteInvoker`] with
/// circuit breaking under the given configuration.
///
/// Every application of the returned function creates an independent set of
/// breakers.
pub fn decorator<I>(config: CircuitBreakerConfig) -> impl Clone + Fn(I) -> CircuitBreakerInvoker<I>
where
    I: RemoteInvoker,
{
    move |delegate| CircuitBreakerInvoker::new(delegate, config.clone())
}
