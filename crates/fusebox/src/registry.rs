// Copyright (c) Fusebox Contributors.
// Licensed under the MIT License.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::CircuitBreaker;
use crate::config::{CircuitBreakerConfig, Scope};

const ERR_POISONED_LOCK: &str = "poisoned breaker registry lock - a breaker constructor panicked";

/// Maps invocations to circuit breakers according to the configured
/// [`Scope`].
///
/// `Service` scope constructs the single breaker eagerly; `PerMethod` scope
/// creates one breaker per method name on first use, named
/// `service#method`, and never evicts it.
#[derive(Debug)]
pub(crate) enum BreakerRegistry {
    Service(Arc<CircuitBreaker>),

    PerMethod {
        config: CircuitBreakerConfig,
        mapping: Mutex<HashMap<String, Arc<CircuitBreaker>>>,
    },
}

impl BreakerRegistry {
    pub fn new(config: &CircuitBreakerConfig) -> Self {
        match config.scope() {
            Scope::Service => Self::Service(Arc::new(CircuitBreaker::new(config.remote_service_name(), config.clone()))),
            Scope::PerMethod => Self::PerMethod {
                config: config.clone(),
                mapping: Mutex::new(HashMap::new()),
            },
        }
    }

    pub fn get(&self, method: &str) -> Arc<CircuitBreaker> {
        match self {
            Self::Service(breaker) => Arc::clone(breaker),
            Self::PerMethod { config, mapping } => {
                let mut mapping = mapping.lock().expect(ERR_POISONED_LOCK);

                if let Some(breaker) = mapping.get(method) {
                    return Arc::clone(breaker);
                }

                let name = format!("{}#{method}", config.remote_service_name());
                let breaker = Arc::new(CircuitBreaker::new(name, config.clone()));
                mapping.insert(method.to_string(), Arc::clone(&breaker));
                breaker
            }
        }
    }
}
