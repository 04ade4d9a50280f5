//! Circuit breaker registry
//!
//! Owns one [`CircuitBreaker`] per provider, created lazily on first use, and
//! runs provider calls through them. An instance is owned by one orchestrator
//! and injected where needed; there is no process-global breaker state.
//!
//! The map lock is held only for individual state transitions, never across
//! the guarded call. Two requests hitting the same provider may therefore
//! interleave their check-and-record steps; failure counts are advisory.

use crate::ports::provider_adapter::GatewayError;
use conclave_domain::resilience::circuit_breaker::{DEFAULT_COOLDOWN, DEFAULT_FAILURE_THRESHOLD};
use conclave_domain::{Admission, CircuitBreaker, CircuitState, ProviderId};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Wall-clock limit for a single provider call.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(60);

/// Breaker thresholds and the per-call timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakerPolicy {
    pub failure_threshold: u32,
    pub cooldown: Duration,
    pub call_timeout: Duration,
}

impl Default for BreakerPolicy {
    fn default() -> Self {
        Self {
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            cooldown: DEFAULT_COOLDOWN,
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }
}

impl BreakerPolicy {
    pub fn with_failure_threshold(mut self, threshold: u32) -> Self {
        self.failure_threshold = threshold;
        self
    }

    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }
}

/// Why the fallback of a guarded call ran.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackReason {
    /// The breaker is open; the provider was not called.
    CircuitOpen,
    /// The provider was called and failed (including timeouts).
    Failed(GatewayError),
}

impl FallbackReason {
    pub fn describe(&self) -> String {
        match self {
            FallbackReason::CircuitOpen => "temporarily unavailable".to_string(),
            FallbackReason::Failed(GatewayError::Timeout) => "timed out".to_string(),
            FallbackReason::Failed(e) => e.to_string(),
        }
    }
}

/// Per-provider circuit breakers.
pub struct CircuitBreakerRegistry {
    policy: BreakerPolicy,
    breakers: Mutex<HashMap<ProviderId, CircuitBreaker>>,
}

impl Default for CircuitBreakerRegistry {
    fn default() -> Self {
        Self::new(BreakerPolicy::default())
    }
}

impl CircuitBreakerRegistry {
    pub fn new(policy: BreakerPolicy) -> Self {
        Self {
            policy,
            breakers: Mutex::new(HashMap::new()),
        }
    }

    pub fn policy(&self) -> &BreakerPolicy {
        &self.policy
    }

    /// Current state; providers never called are `Closed`.
    pub fn state(&self, provider: &ProviderId) -> CircuitState {
        self.lock()
            .get(provider)
            .map(CircuitBreaker::state)
            .unwrap_or(CircuitState::Closed)
    }

    /// Whether a call made now would reach the provider.
    pub fn is_available(&self, provider: &ProviderId) -> bool {
        let now = now();
        self.lock()
            .get(provider)
            .is_none_or(|breaker| breaker.is_available(now))
    }

    /// Copy of the breaker for `provider`, if it has been used.
    pub fn snapshot(&self, provider: &ProviderId) -> Option<CircuitBreaker> {
        self.lock().get(provider).cloned()
    }

    /// Run `action` through the provider's breaker.
    ///
    /// `fallback` runs exactly once when the breaker rejects the call or the
    /// action fails or exceeds the call timeout; otherwise it is dropped
    /// unused.
    pub async fn execute<T, A, AF, B, BF>(&self, provider: &ProviderId, action: A, fallback: B) -> T
    where
        A: FnOnce() -> AF,
        AF: Future<Output = Result<T, GatewayError>>,
        B: FnOnce(FallbackReason) -> BF,
        BF: Future<Output = T>,
    {
        self.guarded(provider, Some(self.policy.call_timeout), action, fallback)
            .await
    }

    /// Like [`execute`](Self::execute), but without the overall call
    /// timeout. For streamed replies, where the action bounds each wait on
    /// the provider itself and time spent delivering output to the caller
    /// must not count against the provider.
    pub async fn execute_untimed<T, A, AF, B, BF>(
        &self,
        provider: &ProviderId,
        action: A,
        fallback: B,
    ) -> T
    where
        A: FnOnce() -> AF,
        AF: Future<Output = Result<T, GatewayError>>,
        B: FnOnce(FallbackReason) -> BF,
        BF: Future<Output = T>,
    {
        self.guarded(provider, None, action, fallback).await
    }

    async fn guarded<T, A, AF, B, BF>(
        &self,
        provider: &ProviderId,
        limit: Option<Duration>,
        action: A,
        fallback: B,
    ) -> T
    where
        A: FnOnce() -> AF,
        AF: Future<Output = Result<T, GatewayError>>,
        B: FnOnce(FallbackReason) -> BF,
        BF: Future<Output = T>,
    {
        let admission = self.admit(provider);
        match admission {
            Admission::Rejected => {
                debug!("Circuit open for {}, skipping call", provider);
                return fallback(FallbackReason::CircuitOpen).await;
            }
            Admission::Trial => info!("Circuit half-open for {}, sending trial call", provider),
            Admission::Allowed => {}
        }

        let outcome = match limit {
            Some(limit) => match tokio::time::timeout(limit, action()).await {
                Ok(result) => result,
                Err(_) => Err(GatewayError::Timeout),
            },
            None => action().await,
        };

        match outcome {
            Ok(value) => {
                self.record_success(provider);
                value
            }
            Err(error) => {
                warn!("Provider {} failed: {}", provider, error);
                self.record_failure(provider);
                fallback(FallbackReason::Failed(error)).await
            }
        }
    }

    fn admit(&self, provider: &ProviderId) -> Admission {
        let now = now();
        let mut breakers = self.lock();
        self.entry(&mut breakers, provider).admit(now)
    }

    fn record_success(&self, provider: &ProviderId) {
        let mut breakers = self.lock();
        let breaker = self.entry(&mut breakers, provider);
        if breaker.state() != CircuitState::Closed {
            info!("Circuit closed for {}", provider);
        }
        breaker.record_success();
    }

    fn record_failure(&self, provider: &ProviderId) {
        let now = now();
        let mut breakers = self.lock();
        let breaker = self.entry(&mut breakers, provider);
        let was_open = breaker.state() == CircuitState::Open;
        breaker.record_failure(now);
        if !was_open && breaker.state() == CircuitState::Open {
            warn!(
                "Circuit opened for {} after {} consecutive failures",
                provider,
                breaker.consecutive_failures()
            );
        }
    }

    fn entry<'a>(
        &self,
        breakers: &'a mut HashMap<ProviderId, CircuitBreaker>,
        provider: &ProviderId,
    ) -> &'a mut CircuitBreaker {
        breakers.entry(provider.clone()).or_insert_with(|| {
            CircuitBreaker::new(self.policy.failure_threshold, self.policy.cooldown)
        })
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ProviderId, CircuitBreaker>> {
        // breaker state stays consistent even if a holder panicked
        self.breakers.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Current time on tokio's clock, so paused-time tests drive cooldowns.
fn now() -> Instant {
    tokio::time::Instant::now().into_std()
}
