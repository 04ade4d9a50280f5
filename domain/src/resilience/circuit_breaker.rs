//! Per-provider circuit breaker state machine.
//!
//! ```text
//! Closed --(failures >= threshold)--> Open --(cooldown elapsed)--> HalfOpen
//! HalfOpen --(trial succeeds)--> Closed
//! HalfOpen --(trial fails)-----> Open
//! ```
//!
//! The machine is clock-agnostic: every transition that depends on time takes
//! `now` from the caller. Executing the guarded call (and timing it out) is
//! the job of the application-layer registry.

use std::time::{Duration, Instant};

/// Consecutive failures that trip a closed breaker.
pub const DEFAULT_FAILURE_THRESHOLD: u32 = 3;

/// Time an open breaker waits before admitting a trial call.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(60);

/// Circuit breaker state for a single provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Healthy — calls allowed.
    Closed,
    /// Tripped — calls short-circuit until the retry time.
    Open,
    /// Cooldown elapsed — one trial call allowed.
    HalfOpen,
}

impl CircuitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CircuitState::Closed => "closed",
            CircuitState::Open => "open",
            CircuitState::HalfOpen => "half_open",
        }
    }
}

/// Outcome of asking the breaker whether a call may proceed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Closed breaker; run the call normally.
    Allowed,
    /// Half-open breaker; this call is the single trial.
    Trial,
    /// Open breaker; do not call the provider.
    Rejected,
}

impl Admission {
    pub fn is_rejected(&self) -> bool {
        matches!(self, Admission::Rejected)
    }
}

/// Failure-isolation state for one provider.
#[derive(Debug, Clone)]
pub struct CircuitBreaker {
    state: CircuitState,
    consecutive_failures: u32,
    last_failure_at: Option<Instant>,
    next_retry_at: Option<Instant>,
    trial_started_at: Option<Instant>,
    failure_threshold: u32,
    cooldown: Duration,
}

impl CircuitBreaker {
    pub fn new(failure_threshold: u32, cooldown: Duration) -> Self {
        Self {
            state: CircuitState::Closed,
            consecutive_failures: 0,
            last_failure_at: None,
            next_retry_at: None,
            trial_started_at: None,
            failure_threshold: failure_threshold.max(1),
            cooldown,
        }
    }

    pub fn state(&self) -> CircuitState {
        self.state
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn last_failure_at(&self) -> Option<Instant> {
        self.last_failure_at
    }

    pub fn next_retry_at(&self) -> Option<Instant> {
        self.next_retry_at
    }

    /// Whether a call made at `now` would reach the provider.
    ///
    /// Does not transition; an open breaker whose cooldown has elapsed
    /// counts as available because the next call becomes its trial. A
    /// half-open breaker is unavailable while its trial is in flight.
    pub fn is_available(&self, now: Instant) -> bool {
        match self.state {
            CircuitState::Closed => true,
            CircuitState::Open => self.cooldown_elapsed(now),
            CircuitState::HalfOpen => !self.trial_in_flight(now),
        }
    }

    /// Decide whether a call at `now` may proceed, moving Open → HalfOpen
    /// once the cooldown has elapsed.
    pub fn admit(&mut self, now: Instant) -> Admission {
        match self.state {
            CircuitState::Closed => Admission::Allowed,
            CircuitState::Open => {
                if self.cooldown_elapsed(now) {
                    self.state = CircuitState::HalfOpen;
                    self.trial_started_at = Some(now);
                    Admission::Trial
                } else {
                    Admission::Rejected
                }
            }
            CircuitState::HalfOpen => {
                if self.trial_in_flight(now) {
                    Admission::Rejected
                } else {
                    self.trial_started_at = Some(now);
                    Admission::Trial
                }
            }
        }
    }

    /// Record a successful call: resets the count and closes the breaker.
    pub fn record_success(&mut self) {
        self.state = CircuitState::Closed;
        self.consecutive_failures = 0;
        self.next_retry_at = None;
        self.trial_started_at = None;
    }

    /// Record a failed call at `now`; trips the breaker at the threshold or
    /// when the half-open trial fails.
    pub fn record_failure(&mut self, now: Instant) {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        self.last_failure_at = Some(now);
        self.trial_started_at = None;

        if self.state == CircuitState::HalfOpen
            || self.consecutive_failures >= self.failure_threshold
        {
            self.state = CircuitState::Open;
            self.next_retry_at = Some(now + self.cooldown);
        }
    }

    /// A trial whose outcome never arrived within a cooldown is abandoned.
    fn trial_in_flight(&self, now: Instant) -> bool {
        self.trial_started_at
            .is_some_and(|started| now.saturating_duration_since(started) < self.cooldown)
    }

    fn cooldown_elapsed(&self, now: Instant) -> bool {
        self.next_retry_at.is_none_or(|retry| now >= retry)
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(DEFAULT_FAILURE_THRESHOLD, DEFAULT_COOLDOWN)
    }
}
