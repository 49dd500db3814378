//! Caller-facing failure taxonomy.

use crate::quota::{unix_now, QuotaError};
use crate::transport::TransportError;
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Classification attached to a failure where it is detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Repository absent, or invisible to the caller.
    NotFound,
    /// Explicit access denial, usually a private repository.
    Forbidden,
    /// A credential was presented but is not good enough.
    AuthenticationFailure,
    /// API budget exhausted even after waiting.
    QuotaExceeded,
    /// Declared or observed content exceeds the configured limits.
    Oversize,
    /// Timeout, connection failure or upstream hiccup.
    Transient,
    /// Corrupt or non-ZIP archive payload.
    MalformedArchive,
}

impl FailureKind {
    /// Whether switching to the other retrieval path could help.
    #[must_use]
    pub fn is_retriable(&self) -> bool {
        !matches!(
            self,
            Self::NotFound | Self::AuthenticationFailure | Self::QuotaExceeded
        )
    }

    /// Returns the kind as a short label.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::Forbidden => "forbidden",
            Self::AuthenticationFailure => "authentication_failure",
            Self::QuotaExceeded => "quota_exceeded",
            Self::Oversize => "oversize",
            Self::Transient => "transient",
            Self::MalformedArchive => "malformed_archive",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn header_u64(headers: &HeaderMap, name: &str) -> Option<u64> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

/// A classified retrieval failure.
///
/// When both retrieval paths fail, the archive-path failure is the one
/// returned and the API-path failure hangs off [`RetrievalFailure::fallback`]
/// (also reachable through [`std::error::Error::source`]).
#[derive(Debug, Error, Serialize)]
#[error("{kind}: {detail}")]
pub struct RetrievalFailure {
    pub kind: FailureKind,

    /// Human readable description of what went wrong.
    pub detail: String,

    /// Whether the caller could expect a different result by retrying.
    pub retriable: bool,

    /// Unix timestamp at which the quota resets, for quota failures.
    pub reset_at: Option<u64>,

    /// What the caller can do about it.
    pub guidance: Option<String>,

    /// Failure of the API path attempted after this one.
    #[source]
    pub fallback: Option<Box<RetrievalFailure>>,
}

impl RetrievalFailure {
    /// Creates a failure whose retriability follows its kind.
    #[must_use]
    pub fn new(kind: FailureKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
            retriable: kind.is_retriable(),
            reset_at: None,
            guidance: None,
            fallback: None,
        }
    }

    /// Attaches the quota reset time.
    #[must_use]
    pub fn with_reset_at(mut self, reset_at: u64) -> Self {
        self.reset_at = Some(reset_at);
        self
    }

    /// Attaches caller guidance.
    #[must_use]
    pub fn with_guidance(mut self, guidance: Option<String>) -> Self {
        self.guidance = guidance;
        self
    }

    /// Attaches the failure of the fallback path.
    #[must_use]
    pub fn with_fallback(mut self, fallback: RetrievalFailure) -> Self {
        self.fallback = Some(Box::new(fallback));
        self
    }

    /// Marks the failure as final from the caller's point of view.
    #[must_use]
    pub fn final_for_caller(mut self) -> Self {
        self.retriable = false;
        self
    }

    /// Classifies a failed metadata API call.
    ///
    /// `credentialed` decides whether a plain 403 means the repository is
    /// private (anonymous) or that the credential lacks access.
    #[must_use]
    pub fn from_api_error(error: &TransportError, credentialed: bool) -> Self {
        match error {
            TransportError::Upstream {
                status, headers, ..
            } => {
                let quota_spent = headers
                    .get("x-ratelimit-remaining")
                    .and_then(|v| v.to_str().ok())
                    .is_some_and(|v| v.trim() == "0");
                let reset_at = header_u64(headers, "x-ratelimit-reset").or_else(|| {
                    header_u64(headers, "retry-after").map(|secs| unix_now() + secs)
                });

                let failure = match *status {
                    StatusCode::NOT_FOUND => {
                        Self::new(FailureKind::NotFound, "Repository or branch not found")
                    }
                    StatusCode::UNAUTHORIZED => Self::new(
                        FailureKind::AuthenticationFailure,
                        "Credential was rejected",
                    ),
                    StatusCode::TOO_MANY_REQUESTS => {
                        Self::new(FailureKind::QuotaExceeded, "API quota exhausted")
                    }
                    StatusCode::FORBIDDEN if quota_spent => {
                        Self::new(FailureKind::QuotaExceeded, "API quota exhausted")
                    }
                    StatusCode::FORBIDDEN if credentialed => Self::new(
                        FailureKind::AuthenticationFailure,
                        "Credential lacks access to the repository",
                    ),
                    StatusCode::FORBIDDEN => Self::new(
                        FailureKind::Forbidden,
                        "Access denied; the repository is likely private",
                    ),
                    other => Self::new(
                        FailureKind::Transient,
                        format!("Upstream responded with HTTP {other}"),
                    ),
                };

                match (failure.kind, reset_at) {
                    (FailureKind::QuotaExceeded, Some(reset_at)) => {
                        failure.with_reset_at(reset_at)
                    }
                    _ => failure,
                }
            }
            other => Self::new(FailureKind::Transient, other.to_string()),
        }
    }

    /// Classifies a failed quota-gated call.
    #[must_use]
    pub fn from_quota_error(error: &QuotaError, credentialed: bool) -> Self {
        match error {
            QuotaError::Exhausted { reset_at, .. } => {
                Self::new(FailureKind::QuotaExceeded, error.to_string()).with_reset_at(*reset_at)
            }
            QuotaError::Transport(transport) => Self::from_api_error(transport, credentialed),
        }
    }
}
