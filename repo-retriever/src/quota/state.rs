//! Quota window bookkeeping.

use reqwest::header::HeaderMap;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

const LIMIT_HEADER: &str = "x-ratelimit-limit";
const REMAINING_HEADER: &str = "x-ratelimit-remaining";
const RESET_HEADER: &str = "x-ratelimit-reset";

/// Window length assumed until authoritative headers arrive.
pub(crate) const PLACEHOLDER_WINDOW_SECS: u64 = 3600;

/// Point-in-time view of a caller's API budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaState {
    /// Calls allowed per window.
    pub limit: u32,

    /// Calls left in the current window. Never negative.
    pub remaining: u32,

    /// Unix timestamp at which the window resets.
    pub reset_at: u64,
}

impl QuotaState {
    /// Time left until the window resets, zero if it already has.
    #[must_use]
    pub fn reset_in(&self) -> Duration {
        Duration::from_secs(self.reset_at.saturating_sub(unix_now()))
    }

    /// Whether `units` calls fit on top of the safety buffer.
    pub(crate) fn has_capacity(&self, units: u32, safety_buffer: u32) -> bool {
        self.remaining >= units.saturating_add(safety_buffer)
    }

    /// Refills the budget once the window has elapsed.
    ///
    /// The new reset time is a placeholder one window out; the next
    /// response's headers replace it. Returns whether a rollover happened.
    pub(crate) fn roll_over(&mut self, now: u64) -> bool {
        if now < self.reset_at {
            return false;
        }
        self.remaining = self.limit;
        self.reset_at = now + PLACEHOLDER_WINDOW_SECS;
        true
    }

    /// Decrements `remaining`, floored at zero.
    pub(crate) fn consume(&mut self, units: u32) {
        self.remaining = self.remaining.saturating_sub(units);
    }

    /// Applies `x-ratelimit-*` headers. Returns `false` if they were absent.
    ///
    /// Within one window `remaining` only goes down; a different reset
    /// timestamp starts a new window and is taken as-is.
    pub(crate) fn reconcile(&mut self, headers: &HeaderMap) -> bool {
        let (Some(remaining), Some(reset_at)) = (
            header_u64(headers, REMAINING_HEADER),
            header_u64(headers, RESET_HEADER),
        ) else {
            return false;
        };
        let remaining = u32::try_from(remaining).unwrap_or(u32::MAX);

        if let Some(limit) = header_u64(headers, LIMIT_HEADER) {
            self.limit = u32::try_from(limit).unwrap_or(u32::MAX);
        }

        if reset_at == self.reset_at {
            self.remaining = self.remaining.min(remaining);
        } else {
            self.remaining = remaining;
            self.reset_at = reset_at;
        }
        true
    }

    /// How long to sleep for the window to reset, capped at `max_wait`.
    pub(crate) fn wait_for_reset(&self, max_wait: Duration, now: u64) -> Duration {
        Duration::from_secs(self.reset_at.saturating_sub(now)).min(max_wait)
    }
}

/// Current Unix time in whole seconds.
pub(crate) fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

fn header_u64(headers: &HeaderMap, name: &str) -> Option<u64> {
    headers.get(name)?.to_str().ok()?.trim().parse().ok()
}
