//! Count-based circuit breaker.
//!
//! # States
//! - Closed: normal operation, calls pass through and fill the sliding window
//! - Open: dependency assumed down, calls fail fast without executing
//! - Half-Open: a fixed number of trial calls probe recovery
//!
//! # State Transitions
//! ```text
//! Closed → Open: window full and failure rate >= threshold
//! Open → Half-Open: first call after wait_duration_in_open
//! Half-Open → Closed: trial sample complete, failure rate < threshold
//! Half-Open → Open: trial sample complete, failure rate >= threshold
//! ```
//!
//! # Design Decisions
//! - One mutex guards the whole state machine; the protected call runs outside it
//! - Every permit carries the generation it was issued under, so outcomes
//!   that arrive after a transition are dropped instead of polluting the new state
//! - A dropped (cancelled) half-open call hands its permit back

use std::collections::VecDeque;
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};

use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::config::CircuitBreakerConfig;
use crate::observability::metrics;

/// Circuit breaker states.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CircuitState {
    Closed = 0,
    Open = 1,
    HalfOpen = 2,
}

impl CircuitState {
    pub fn as_str(self) -> &'static str {
        match self {
            CircuitState::Closed => "closed",
            CircuitState::Open => "open",
            CircuitState::HalfOpen => "half_open",
        }
    }
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors returned by [`CircuitBreaker::call`].
#[derive(Debug, Error)]
pub enum CircuitBreakerError<E> {
    /// The breaker is open (or out of half-open permits); the operation did not run.
    #[error("Circuit breaker '{name}' does not permit further calls")]
    CallNotPermitted { name: String },

    /// The operation ran and failed. The failure has been recorded.
    #[error("Operation failed: {0}")]
    Operation(E),
}

/// Fixed-capacity record of the most recent outcomes.
#[derive(Debug)]
struct OutcomeWindow {
    outcomes: VecDeque<bool>,
    capacity: usize,
    failures: usize,
}

impl OutcomeWindow {
    fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            outcomes: VecDeque::with_capacity(capacity),
            capacity,
            failures: 0,
        }
    }

    /// Push an outcome, evicting the oldest once at capacity.
    fn record(&mut self, success: bool) {
        if self.outcomes.len() == self.capacity {
            if let Some(false) = self.outcomes.pop_front() {
                self.failures -= 1;
            }
        }
        self.outcomes.push_back(success);
        if !success {
            self.failures += 1;
        }
    }

    fn len(&self) -> usize {
        self.outcomes.len()
    }

    fn is_full(&self) -> bool {
        self.outcomes.len() == self.capacity
    }

    /// Failure percentage over the full capacity.
    fn failure_rate(&self) -> f32 {
        self.failures as f32 * 100.0 / self.capacity as f32
    }

    fn clear(&mut self) {
        self.outcomes.clear();
        self.failures = 0;
    }
}

#[derive(Debug)]
struct BreakerState {
    state: CircuitState,
    /// Closed-state sliding window.
    window: OutcomeWindow,
    /// Half-open trial sample.
    trial: OutcomeWindow,
    opened_at: Option<Instant>,
    half_open_permits: u32,
    /// Bumped on every transition.
    generation: u64,
}

/// Point-in-time view of a breaker, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BreakerSnapshot {
    pub state: CircuitState,
    /// Outcomes currently held by the active sample (window or trial).
    pub buffered_calls: usize,
    pub failed_calls: usize,
    /// Only known once the active sample is full.
    pub failure_rate: Option<f32>,
}

/// Circuit breaker shared by every caller of one protected call site.
#[derive(Debug)]
pub struct CircuitBreaker {
    name: String,
    config: CircuitBreakerConfig,
    inner: Mutex<BreakerState>,
}

impl CircuitBreaker {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        info!(
            breaker = %config.name,
            sliding_window_size = config.sliding_window_size,
            failure_rate_threshold = config.failure_rate_threshold,
            wait_duration_in_open_ms = config.wait_duration_in_open_ms,
            permitted_calls_in_half_open = config.permitted_calls_in_half_open,
            "Circuit breaker initialized"
        );
        metrics::record_breaker_state(&config.name, CircuitState::Closed);

        Self {
            name: config.name.clone(),
            inner: Mutex::new(BreakerState {
                state: CircuitState::Closed,
                window: OutcomeWindow::new(config.sliding_window_size),
                trial: OutcomeWindow::new(config.permitted_calls_in_half_open as usize),
                opened_at: None,
                half_open_permits: 0,
                generation: 0,
            }),
            config,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current state. An Open breaker whose wait has elapsed still reports
    /// Open until the next call moves it to Half-Open.
    pub fn state(&self) -> CircuitState {
        self.lock().state
    }

    pub fn snapshot(&self) -> BreakerSnapshot {
        let inner = self.lock();
        let sample = match inner.state {
            CircuitState::HalfOpen => &inner.trial,
            _ => &inner.window,
        };
        BreakerSnapshot {
            state: inner.state,
            buffered_calls: sample.len(),
            failed_calls: sample.failures,
            failure_rate: sample.is_full().then(|| sample.failure_rate()),
        }
    }

    /// Execute `operation` if the breaker permits it and record its outcome.
    pub async fn call<F, Fut, T, E>(&self, operation: F) -> Result<T, CircuitBreakerError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let Some(mut permit) = self.try_acquire() else {
            return Err(CircuitBreakerError::CallNotPermitted {
                name: self.name.clone(),
            });
        };

        let result = operation().await;
        permit.settle(result.is_ok());

        result.map_err(CircuitBreakerError::Operation)
    }

    fn lock(&self) -> MutexGuard<'_, BreakerState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn try_acquire(&self) -> Option<Permit<'_>> {
        let mut inner = self.lock();

        if inner.state == CircuitState::Open {
            let waited = inner
                .opened_at
                .map_or(true, |at| at.elapsed() >= self.config.wait_duration_in_open());
            if waited {
                self.transition(&mut inner, CircuitState::HalfOpen);
            }
        }

        let permitted = match inner.state {
            CircuitState::Closed => true,
            CircuitState::HalfOpen if inner.half_open_permits > 0 => {
                inner.half_open_permits -= 1;
                true
            }
            _ => false,
        };

        if !permitted {
            warn!(breaker = %self.name, state = %inner.state, "Circuit breaker call not permitted");
            metrics::record_call_not_permitted(&self.name);
            return None;
        }

        Some(Permit {
            breaker: self,
            generation: inner.generation,
            settled: false,
        })
    }

    fn on_outcome(&self, generation: u64, success: bool) {
        let mut inner = self.lock();
        if inner.generation != generation {
            debug!(breaker = %self.name, success, "Discarding outcome issued before last transition");
            return;
        }

        let threshold = self.config.failure_rate_threshold;
        match inner.state {
            CircuitState::Closed => {
                inner.window.record(success);
                if inner.window.is_full() {
                    let failure_rate = inner.window.failure_rate();
                    if failure_rate >= threshold {
                        self.failure_rate_exceeded(failure_rate);
                        self.transition(&mut inner, CircuitState::Open);
                    }
                }
            }
            CircuitState::HalfOpen => {
                inner.trial.record(success);
                if inner.trial.is_full() {
                    let failure_rate = inner.trial.failure_rate();
                    if failure_rate < threshold {
                        self.transition(&mut inner, CircuitState::Closed);
                    } else {
                        self.failure_rate_exceeded(failure_rate);
                        self.transition(&mut inner, CircuitState::Open);
                    }
                }
            }
            CircuitState::Open => {}
        }
    }

    /// Give back a half-open permit whose call never completed.
    fn release(&self, generation: u64) {
        let mut inner = self.lock();
        if inner.generation == generation && inner.state == CircuitState::HalfOpen {
            inner.half_open_permits += 1;
            debug!(breaker = %self.name, "Half-open permit released by cancelled call");
        }
    }

    fn failure_rate_exceeded(&self, failure_rate: f32) {
        error!(
            breaker = %self.name,
            failure_rate,
            threshold = self.config.failure_rate_threshold,
            "Circuit breaker failure rate exceeded"
        );
        metrics::record_failure_rate_exceeded(&self.name);
    }

    fn transition(&self, inner: &mut BreakerState, to: CircuitState) {
        let from = inner.state;
        inner.state = to;
        inner.generation += 1;

        match to {
            CircuitState::Closed => {
                inner.window.clear();
                inner.opened_at = None;
            }
            CircuitState::Open => {
                inner.opened_at = Some(Instant::now());
            }
            CircuitState::HalfOpen => {
                inner.trial.clear();
                inner.half_open_permits = self.config.permitted_calls_in_half_open;
            }
        }

        warn!(breaker = %self.name, %from, %to, "Circuit breaker state transition");
        metrics::record_breaker_transition(&self.name, from, to);
    }
}

/// Permission to run one call; records the outcome exactly once.
struct Permit<'a> {
    breaker: &'a CircuitBreaker,
    generation: u64,
    settled: bool,
}

impl Permit<'_> {
    fn settle(&mut self, success: bool) {
        self.settled = true;
        self.breaker.on_outcome(self.generation, success);
    }
}

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.breaker.release(self.generation);
        }
    }
}
