//! API quota accounting.
//!
//! One [`QuotaTracker`] exists per caller identity for the duration of a
//! retrieval. Its state is private behind a single lock, and every
//! quota-counted call runs inside that lock: the capacity check, the request
//! and the update from the response's headers form one critical section, so
//! concurrent callers can never collectively overshoot the budget.

mod error;
mod state;

pub use error::QuotaError;
pub use state::QuotaState;

use crate::config::RetrievalConfig;
use crate::transport::{Response, TransportError};
use reqwest::header::HeaderMap;
pub(crate) use state::unix_now;
use state::PLACEHOLDER_WINDOW_SECS;
use std::future::Future;
use std::time::Duration;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

/// Hourly call limit for credentialed callers.
pub const CREDENTIALED_LIMIT: u32 = 5000;

/// Hourly call limit for anonymous callers.
pub const ANONYMOUS_LIMIT: u32 = 60;

/// Owner of a caller's [`QuotaState`].
#[derive(Debug)]
pub struct QuotaTracker {
    state: Mutex<QuotaState>,
    safety_buffer: u32,
    max_wait: Duration,
}

impl QuotaTracker {
    /// Creates a tracker with the published default limit for the identity
    /// and a placeholder reset one hour out.
    #[must_use]
    pub fn new(credentialed: bool, safety_buffer: u32, max_wait: Duration) -> Self {
        let limit = if credentialed {
            CREDENTIALED_LIMIT
        } else {
            ANONYMOUS_LIMIT
        };
        Self::with_state(
            QuotaState {
                limit,
                remaining: limit,
                reset_at: unix_now() + PLACEHOLDER_WINDOW_SECS,
            },
            safety_buffer,
            max_wait,
        )
    }

    /// Creates a tracker from retrieval settings.
    #[must_use]
    pub fn from_config(config: &RetrievalConfig, credentialed: bool) -> Self {
        Self::new(
            credentialed,
            config.quota_safety_buffer,
            config.max_quota_wait(),
        )
    }

    /// Creates a tracker starting from a known state.
    #[must_use]
    pub fn with_state(state: QuotaState, safety_buffer: u32, max_wait: Duration) -> Self {
        Self {
            state: Mutex::new(state),
            safety_buffer,
            max_wait,
        }
    }

    /// Returns a copy of the current state.
    pub async fn snapshot(&self) -> QuotaState {
        *self.state.lock().await
    }

    /// Whether at least `units` plus the safety buffer remain.
    pub async fn reserve(&self, units: u32) -> bool {
        let mut state = self.state.lock().await;
        self.refresh(&mut state);
        state.has_capacity(units, self.safety_buffer)
    }

    /// Decrements the remaining budget, floored at zero.
    pub async fn consume(&self, units: u32) {
        self.state.lock().await.consume(units);
    }

    /// Overwrites the state from authoritative rate limit headers.
    ///
    /// Returns `false` if the headers carried no rate limit information.
    pub async fn reconcile(&self, headers: &HeaderMap) -> bool {
        self.state.lock().await.reconcile(headers)
    }

    /// Sleeps until the window resets if the budget is exhausted.
    ///
    /// The sleep is capped at the configured maximum wait, so a misreported
    /// reset time cannot hang the caller.
    pub async fn wait_until_reset(&self) {
        let state = {
            let mut state = self.state.lock().await;
            self.refresh(&mut state);
            *state
        };
        if state.has_capacity(1, self.safety_buffer) {
            return;
        }
        let wait = self.capped_wait(&state, unix_now());
        tokio::time::sleep(wait).await;
    }

    /// Runs a quota-counted call, waiting for a reset if the budget is short.
    ///
    /// # Errors
    ///
    /// Returns [`QuotaError::Exhausted`] if the budget is still short after
    /// the capped wait, or [`QuotaError::Transport`] if the call fails.
    pub async fn execute<F, Fut>(&self, units: u32, call: F) -> Result<Response, QuotaError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Response, TransportError>>,
    {
        let mut state = self.state.lock().await;
        self.refresh(&mut state);

        if !state.has_capacity(units, self.safety_buffer) {
            let wait = self.capped_wait(&state, unix_now());
            info!(
                remaining = state.remaining,
                wait_secs = wait.as_secs(),
                "Quota low, waiting for reset"
            );
            tokio::time::sleep(wait).await;

            self.refresh(&mut state);
            if !state.has_capacity(units, self.safety_buffer) {
                return Err(exhausted(&state));
            }
        }

        Self::call_and_reconcile(&mut state, units, call).await
    }

    /// Runs a quota-counted call without waiting.
    ///
    /// # Errors
    ///
    /// Returns [`QuotaError::Exhausted`] immediately if the budget is short,
    /// or [`QuotaError::Transport`] if the call fails.
    pub async fn try_execute<F, Fut>(&self, units: u32, call: F) -> Result<Response, QuotaError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Response, TransportError>>,
    {
        let mut state = self.state.lock().await;
        self.refresh(&mut state);
        if !state.has_capacity(units, self.safety_buffer) {
            return Err(exhausted(&state));
        }
        Self::call_and_reconcile(&mut state, units, call).await
    }

    async fn call_and_reconcile<F, Fut>(
        state: &mut MutexGuard<'_, QuotaState>,
        units: u32,
        call: F,
    ) -> Result<Response, QuotaError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Response, TransportError>>,
    {
        match call().await {
            Ok(response) => {
                if !state.reconcile(response.headers()) {
                    state.consume(units);
                }
                debug!(remaining = state.remaining, "Quota after call");
                Ok(response)
            }
            Err(error) => {
                // Error responses still carry authoritative numbers.
                if let Some(headers) = error.headers() {
                    state.reconcile(headers);
                }
                Err(error.into())
            }
        }
    }

    fn refresh(&self, state: &mut QuotaState) {
        if state.roll_over(unix_now()) {
            debug!(limit = state.limit, "Quota window elapsed, budget refilled");
        }
    }

    fn capped_wait(&self, state: &QuotaState, now: u64) -> Duration {
        let wait = state.wait_for_reset(self.max_wait, now);
        if state.reset_at.saturating_sub(now) > self.max_wait.as_secs() {
            warn!(
                reset_at = state.reset_at,
                max_wait_secs = self.max_wait.as_secs(),
                "Quota reset too far in future, capping wait time"
            );
        }
        wait
    }
}

fn exhausted(state: &QuotaState) -> QuotaError {
    QuotaError::Exhausted {
        remaining: state.remaining,
        reset_at: state.reset_at,
    }
}
