//! Quota error types.

use crate::transport::TransportError;
use thiserror::Error;

/// Errors from a quota-gated upstream call.
#[derive(Debug, Error)]
pub enum QuotaError {
    /// Not enough budget left, even after waiting.
    #[error("API quota exhausted ({remaining} remaining), resets at {reset_at}")]
    Exhausted { remaining: u32, reset_at: u64 },

    /// The call itself failed.
    #[error(transparent)]
    Transport(#[from] TransportError),
}
