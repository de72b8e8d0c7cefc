//! Timeout and retry wrapper around any resolver.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use crossbeam_channel::{RecvTimeoutError, bounded};
use tabulax_model::TransformationExample;
use tracing::{debug, warn};

use crate::{ResolveError, ResolveRequest, ResolverPolicy, Result, ValueResolver};

/// Attempt threads allowed to run at once, including abandoned ones.
pub const DEFAULT_MAX_IN_FLIGHT: usize = 64;

/// Applies a [`ResolverPolicy`] to every call of an inner resolver.
///
/// Each attempt runs on a helper thread so a hung call is abandoned once the
/// timeout elapses. Retryable failures are retried with exponential backoff;
/// anything else is returned at once.
///
/// An abandoned attempt keeps its thread until the inner call returns; the
/// thread is never joined. At most `max_in_flight` attempt threads exist at a
/// time, and further attempts fail with a transport error until one finishes.
#[derive(Clone)]
pub struct ResilientResolver {
    inner: Arc<dyn ValueResolver>,
    policy: ResolverPolicy,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: usize,
}

impl ResilientResolver {
    pub fn new(inner: Arc<dyn ValueResolver>, policy: ResolverPolicy) -> Self {
        Self {
            inner,
            policy,
            in_flight: Arc::new(AtomicUsize::new(0)),
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
        }
    }

    pub fn with_max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.max_in_flight = max_in_flight.max(1);
        self
    }

    pub fn policy(&self) -> &ResolverPolicy {
        &self.policy
    }

    /// Attempt threads currently running, including abandoned ones.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    fn with_retries<T, F>(&self, operation: &'static str, call: F) -> Result<T>
    where
        T: Send + 'static,
        F: Fn(&dyn ValueResolver) -> Result<T> + Clone + Send + 'static,
    {
        let mut attempt = 0;
        loop {
            match self.attempt(call.clone()) {
                Ok(value) => return Ok(value),
                Err(err) if err.is_retryable() && attempt < self.policy.retry.max_retries => {
                    let delay = self.policy.retry.backoff(attempt);
                    attempt += 1;
                    debug!(
                        operation,
                        attempt,
                        delay_ms = delay.as_millis(),
                        error = %err,
                        "resolver call failed, retrying"
                    );
                    thread::sleep(delay);
                }
                Err(err) => {
                    if err.is_retryable() {
                        warn!(
                            operation,
                            attempts = attempt + 1,
                            error = %err,
                            "resolver retries exhausted"
                        );
                    }
                    return Err(err);
                }
            }
        }
    }

    fn attempt<T, F>(&self, call: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&dyn ValueResolver) -> Result<T> + Send + 'static,
    {
        let Some(timeout) = self.policy.timeout else {
            return call(self.inner.as_ref());
        };

        let slot = InFlight::acquire(&self.in_flight, self.max_in_flight).ok_or_else(|| {
            ResolveError::Transport(format!(
                "{} resolver calls still in flight",
                self.max_in_flight
            ))
        })?;
        let inner = Arc::clone(&self.inner);
        let (tx, rx) = bounded(1);
        thread::Builder::new()
            .name("tabulax-resolver".to_string())
            .spawn(move || {
                let _slot = slot;
                let _ = tx.send(call(inner.as_ref()));
            })
            .map_err(|e| ResolveError::Transport(e.to_string()))?;

        match rx.recv_timeout(timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => Err(ResolveError::Timeout(timeout)),
            Err(RecvTimeoutError::Disconnected) => Err(ResolveError::Transport(
                "resolver worker exited without a result".to_string(),
            )),
        }
    }
}

/// One counted attempt thread; released on drop.
struct InFlight(Arc<AtomicUsize>);

impl InFlight {
    fn acquire(counter: &Arc<AtomicUsize>, max: usize) -> Option<Self> {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| (n < max).then_some(n + 1))
            .ok()
            .map(|_| Self(Arc::clone(counter)))
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl ValueResolver for ResilientResolver {
    fn describe(&self, examples: &[TransformationExample]) -> Result<String> {
        let examples: Arc<[TransformationExample]> = examples.into();
        self.with_retries("describe", move |inner| inner.describe(&examples))
    }

    fn resolve(&self, request: &ResolveRequest) -> Result<String> {
        let request = Arc::new(request.clone());
        self.with_retries("resolve", move |inner| inner.resolve(&request))
    }
}

impl std::fmt::Debug for ResilientResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResilientResolver")
            .field("policy", &self.policy)
            .field("max_in_flight", &self.max_in_flight)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::{RetryPolicy, StubResolver};

    fn fast_policy(retries: u32) -> ResolverPolicy {
        ResolverPolicy::default()
            .with_timeout(Some(Duration::from_secs(5)))
            .with_retry(
                RetryPolicy::default()
                    .with_max_retries(retries)
                    .with_initial_backoff(Duration::from_millis(1)),
            )
    }

    fn request(value: &str) -> ResolveRequest {
        ResolveRequest::new(None, &[], value)
    }

    #[test]
    fn test_retries_transient_failures() {
        let stub = Arc::new(StubResolver::new().with_mapping("Japan", "Tokyo").flaky(2));
        let resolver = ResilientResolver::new(stub.clone(), fast_policy(2));

        assert_eq!(resolver.resolve(&request("Japan")).unwrap(), "Tokyo");
        assert_eq!(stub.resolve_calls(), 3);
    }

    #[test]
    fn test_gives_up_after_max_retries() {
        let stub = Arc::new(StubResolver::new().with_mapping("Japan", "Tokyo").flaky(5));
        let resolver = ResilientResolver::new(stub.clone(), fast_policy(1));

        let err = resolver.resolve(&request("Japan")).unwrap_err();
        assert!(matches!(err, ResolveError::Transport(_)));
        assert_eq!(stub.resolve_calls(), 2);
    }

    #[test]
    fn test_rejection_is_not_retried() {
        let stub = Arc::new(StubResolver::new());
        let resolver = ResilientResolver::new(stub.clone(), fast_policy(3));

        let err = resolver.resolve(&request("Atlantis")).unwrap_err();
        assert!(matches!(err, ResolveError::Rejected(_)));
        assert_eq!(stub.resolve_calls(), 1);
    }

    #[test]
    fn test_timeout() {
        let stub = Arc::new(
            StubResolver::new()
                .with_mapping("Japan", "Tokyo")
                .with_delay(Duration::from_millis(500)),
        );
        let policy = fast_policy(0).with_timeout(Some(Duration::from_millis(20)));
        let resolver = ResilientResolver::new(stub, policy);

        let err = resolver.resolve(&request("Japan")).unwrap_err();
        assert_eq!(err, ResolveError::Timeout(Duration::from_millis(20)));
    }

    #[test]
    fn test_abandoned_attempts_are_capped() {
        let stub = Arc::new(
            StubResolver::new()
                .with_mapping("Japan", "Tokyo")
                .with_delay(Duration::from_millis(300)),
        );
        let policy = fast_policy(0).with_timeout(Some(Duration::from_millis(10)));
        let resolver = ResilientResolver::new(stub, policy).with_max_in_flight(1);

        let err = resolver.resolve(&request("Japan")).unwrap_err();
        assert!(matches!(err, ResolveError::Timeout(_)));
        assert_eq!(resolver.in_flight(), 1);

        let err = resolver.resolve(&request("Japan")).unwrap_err();
        assert!(matches!(err, ResolveError::Transport(ref m) if m.contains("in flight")));

        thread::sleep(Duration::from_millis(600));
        assert_eq!(resolver.in_flight(), 0);
        let err = resolver.resolve(&request("Japan")).unwrap_err();
        assert!(matches!(err, ResolveError::Timeout(_)));
    }

    #[test]
    fn test_describe_passes_through() {
        let stub = Arc::new(StubResolver::new().with_description("Country to Capital City"));
        let resolver = ResilientResolver::new(stub, fast_policy(0));
        let examples = [TransformationExample::new("Japan", "Tokyo")];
        assert_eq!(
            resolver.describe(&examples).unwrap(),
            "Country to Capital City"
        );
    }
}
