//! Deterministic in-memory resolver.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use tabulax_model::TransformationExample;

use crate::{ResolveError, ResolveRequest, Result, ValueResolver};

/// Resolver backed by a fixed mapping.
///
/// Values absent from the mapping are rejected. Call counters, an optional
/// delay and a number of leading transient failures make it suitable for
/// exercising caching, timeout and retry behaviour.
#[derive(Debug, Default)]
pub struct StubResolver {
    mapping: BTreeMap<String, String>,
    description: Option<String>,
    delay: Option<Duration>,
    failures: usize,
    calls: AtomicUsize,
    resolve_calls: AtomicUsize,
    describe_calls: AtomicUsize,
}

impl StubResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mapping(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.mapping.insert(from.into(), to.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sleeps before answering each call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Fails the first `failures` calls with a transport error.
    pub fn flaky(mut self, failures: usize) -> Self {
        self.failures = failures;
        self
    }

    pub fn resolve_calls(&self) -> usize {
        self.resolve_calls.load(Ordering::SeqCst)
    }

    pub fn describe_calls(&self) -> usize {
        self.describe_calls.load(Ordering::SeqCst)
    }

    fn begin_call(&self) -> Result<()> {
        if let Some(delay) = self.delay {
            thread::sleep(delay);
        }
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.failures {
            return Err(ResolveError::Transport(format!(
                "simulated failure {} of {}",
                call + 1,
                self.failures
            )));
        }
        Ok(())
    }
}

impl ValueResolver for StubResolver {
    fn describe(&self, _examples: &[TransformationExample]) -> Result<String> {
        self.describe_calls.fetch_add(1, Ordering::SeqCst);
        self.begin_call()?;
        self.description
            .clone()
            .ok_or_else(|| ResolveError::InvalidResponse("no description".to_string()))
    }

    fn resolve(&self, request: &ResolveRequest) -> Result<String> {
        self.resolve_calls.fetch_add(1, Ordering::SeqCst);
        self.begin_call()?;
        self.mapping
            .get(&request.value)
            .cloned()
            .ok_or_else(|| ResolveError::Rejected(request.value.clone()))
    }
}
