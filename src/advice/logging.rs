// src/advice/logging.rs
//! Observational advice
//!
//! Neither interceptor changes the outcome of a call; both proceed exactly
//! once and return whatever the rest of the chain produced.

use crate::advice::Interceptor;
use crate::invocation::context::Invocation;
use crate::invocation::value::Value;
use crate::utils::errors::Result;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;
use tracing::{info, warn};

/// Logs entry, exit and elapsed time of every call it sees
#[derive(Debug, Default)]
pub struct TracingInterceptor {
    label: Option<String>,
}

impl TracingInterceptor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_label(label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
        }
    }
}

impl Interceptor for TracingInterceptor {
    fn invoke(&self, invocation: &mut Invocation) -> Result<Value> {
        let label = self.label.as_deref().unwrap_or("trace");
        let method = *invocation.method();
        let start = Instant::now();

        info!(invocation = %invocation.id(), label, "Entering {}", method);

        let outcome = invocation.proceed();
        let elapsed = start.elapsed();

        match &outcome {
            Ok(value) => info!(
                invocation = %invocation.id(),
                label,
                elapsed_us = elapsed.as_micros() as u64,
                "Leaving {} with {}",
                method,
                value.type_name()
            ),
            Err(err) => warn!(
                invocation = %invocation.id(),
                label,
                elapsed_us = elapsed.as_micros() as u64,
                "{} failed: {}",
                method,
                err
            ),
        }

        outcome
    }

    fn name(&self) -> &str {
        self.label.as_deref().unwrap_or("TracingInterceptor")
    }
}

/// Counts calls passing through it
#[derive(Debug, Default)]
pub struct CountingInterceptor {
    count: AtomicUsize,
}

impl CountingInterceptor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

impl Interceptor for CountingInterceptor {
    fn invoke(&self, invocation: &mut Invocation) -> Result<Value> {
        self.count.fetch_add(1, Ordering::SeqCst);
        invocation.proceed()
    }

    fn name(&self) -> &str {
        "CountingInterceptor"
    }
}
