// Copyright (c) Fusebox Contributors.
// Licensed under the MIT License.

use std::sync::Arc;

/// Decides whether the circuit breaker should deal with a given failure
/// cause.
///
/// The decorator consults the filter for every failed completion of the
/// wrapped invoker; only accepted causes count toward tripping the circuit.
/// The default accepts everything. Implementers typically ignore
/// application-level errors (a not-found response, say) so they do not
/// count as remote service faults.
///
/// # Examples
///
/// ```
/// use fusebox::FailureFilter;
///
/// #[derive(Debug)]
/// enum RpcError {
///     Timeout,
///     NotFound,
/// }
///
/// let filter = FailureFilter::new(|cause: &RpcError| !matches!(cause, RpcError::NotFound));
///
/// assert!(filter.should_deal_with(&RpcError::Timeout));
/// assert!(!filter.should_deal_with(&RpcError::NotFound));
/// ```
pub struct FailureFilter<E>(Arc<dyn Fn(&E) -> bool + Send + Sync>);

impl<E> FailureFilter<E> {
    /// Creates a filter from the given predicate.
    pub fn new(predicate: impl Fn(&E) -> bool + Send + Sync + 'static) -> Self {
        Self(Arc::new(predicate))
    }

    /// Creates the default filter, which counts every failure.
    #[must_use]
    pub fn accept_all() -> Self {
        Self::new(|_| true)
    }

    /// Returns `true` if the given cause should count toward tripping.
    pub fn should_deal_with(&self, cause: &E) -> bool {
        (self.0)(cause)
    }
}

impl<E> Default for FailureFilter<E> {
    fn default() -> Self {
        Self::accept_all()
    }
}

impl<E> Clone for FailureFilter<E> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<E> std::fmt::Debug for FailureFilter<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FailureFilter").finish()
    }
}

#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg(test)]
mod tests {
    use std::fmt::Debug;

    use super::*;

    #[test]
    fn assert_types() {
        static_assertions::assert_impl_all!(FailureFilter<String>: Send, Sync, Clone, Debug, Default);
    }

    #[test]
    fn accept_all_accepts_everything() {
        let filter = FailureFilter::<&str>::accept_all();
        assert!(filter.should_deal_with(&"anything"));
    }

    #[test]
    fn predicate_is_consulted() {
        let filter = FailureFilter::new(|cause: &i32| *cause > 0);
        assert!(filter.should_deal_with(&1));
        assert!(!filter.should_deal_with(&-1));
    }

    #[test]
    fn debug_is_opaque() {
        let filter = FailureFilter::<String>::accept_all();
        assert_eq!(format!("{filter:?}"), "FailureFilter");
    }
}
