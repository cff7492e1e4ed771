// Copyright (c) Fusebox Contributors.
// Licensed under the MIT License.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

/// An invalid-argument error raised when building a
/// [`CircuitBreakerConfig`][crate::CircuitBreakerConfig].
///
/// Configuration errors are programmer errors: they surface immediately from
/// [`build()`][crate::CircuitBreakerConfigBuilder::build] and name the
/// offending parameter.
///
/// # Limited introspection
///
/// Other than implementing the [`std::error::Error`] and [`fmt::Debug`]
/// traits, this error type currently provides no introspection capabilities.
#[derive(Debug)]
pub struct ConfigError {
    message: Cow<'static, str>,
}

impl ConfigError {
    pub(crate) fn invalid_argument(message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ConfigError {}

/// The error a caller receives when a call is short-circuited.
///
/// While a circuit is OPEN (or HALF_OPEN with a probe already admitted), the
/// decorator refuses calls without contacting the remote and completes them
/// with this error instead. It carries the name of the protected remote
/// service and the method that was refused, and nothing else: a fail-fast
/// outcome is recoverable, and callers typically match on it to take a
/// fallback path.
///
/// # Examples
///
/// ```
/// use fusebox::FailFastError;
///
/// fn describe(error: &FailFastError) -> String {
///     format!("{}#{} is failing fast", error.remote_service_name(), error.method_name())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct FailFastError {
    remote_service_name: Arc<str>,
    method_name: String,
}

impl FailFastError {
    pub(crate) fn new(remote_service_name: impl Into<Arc<str>>, method_name: impl Into<String>) -> Self {
        Self {
            remote_service_name: remote_service_name.into(),
            method_name: method_name.into(),
        }
    }

    /// Returns the name of the remote service whose circuit refused the call.
    #[must_use]
    pub fn remote_service_name(&self) -> &str {
        &self.remote_service_name
    }

    /// Returns the name of the method that was refused.
    #[must_use]
    pub fn method_name(&self) -> &str {
        &self.method_name
    }
}

impl fmt::Display for FailFastError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "circuit of {}#{} is open; failing fast",
            self.remote_service_name, self.method_name
        )
    }
}

impl std::error::Error for FailFastError {}
