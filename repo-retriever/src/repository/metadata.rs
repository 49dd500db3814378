//! Repository metadata lookups against the API.

use super::{RepositoryHandle, RepositoryInfo};
use crate::config::RetrievalConfig;
use crate::quota::QuotaTracker;
use crate::retrieval::{FailureKind, RetrievalFailure};
use crate::transport::{endpoint, RequestOptions, Transport};
use tracing::{debug, info_span, warn, Instrument};

/// Largest metadata body accepted.
const MAX_METADATA_BYTES: u64 = 1024 * 1024;

/// How metadata lookup failures are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataMode {
    /// Any failure yields [`RepositoryInfo::placeholder`]; never waits for quota.
    Safe,
    /// Failures are classified and returned; waits for quota if needed.
    Strict,
}

/// Fetches `GET /repos/{owner}/{repo}` as one quota-counted call.
///
/// # Errors
///
/// Only in [`MetadataMode::Strict`]: returns a [`RetrievalFailure`]
/// classified from the upstream status (see
/// [`RetrievalFailure::from_api_error`]).
pub async fn fetch_repository_info<T: Transport>(
    transport: &T,
    quota: &QuotaTracker,
    config: &RetrievalConfig,
    handle: &RepositoryHandle,
    mode: MetadataMode,
    credentialed: bool,
) -> Result<RepositoryInfo, RetrievalFailure> {
    let span = info_span!("repository_info", repo = %handle, ?mode);

    async {
        match fetch(transport, quota, config, handle, mode, credentialed).await {
            Ok(info) => Ok(info),
            Err(failure) if mode == MetadataMode::Safe => {
                warn!(kind = %failure.kind, detail = %failure.detail, "Using placeholder repository info");
                Ok(RepositoryInfo::placeholder(handle))
            }
            Err(failure) => Err(failure),
        }
    }
    .instrument(span)
    .await
}

async fn fetch<T: Transport>(
    transport: &T,
    quota: &QuotaTracker,
    config: &RetrievalConfig,
    handle: &RepositoryHandle,
    mode: MetadataMode,
    credentialed: bool,
) -> Result<RepositoryInfo, RetrievalFailure> {
    let url = endpoint(&config.api_base, ["repos", handle.owner.as_str(), handle.name.as_str()])
        .ok_or_else(|| {
            RetrievalFailure::new(FailureKind::Transient, "API base URL cannot carry a path")
        })?;
    let options = RequestOptions::with_timeout(config.api_timeout());

    let call = || transport.get(url.as_str(), &options);
    let response = match mode {
        MetadataMode::Strict => quota.execute(1, call).await,
        MetadataMode::Safe => quota.try_execute(1, call).await,
    }
    .map_err(|e| RetrievalFailure::from_quota_error(&e, credentialed))?;

    let body = response
        .collect_limited(MAX_METADATA_BYTES)
        .await
        .map_err(|e| RetrievalFailure::new(FailureKind::Transient, e.to_string()))?;

    let info = RepositoryInfo::from_json(&body, handle)
        .map_err(|e| RetrievalFailure::new(FailureKind::Transient, e.to_string()))?;
    debug!(default_branch = %info.default_branch, "Fetched repository info");
    Ok(info)
}
