//! Quota-counted retrieval through the tree listing and per-file downloads.

mod listing;

pub use listing::{plan_downloads, DownloadPlan, PlannedFile, TreeEntry};

use crate::config::RetrievalConfig;
use crate::files::FileRecord;
use crate::quota::{QuotaError, QuotaTracker};
use crate::repository::RepositoryHandle;
use crate::retrieval::{FailureKind, RetrievalFailure};
use crate::transport::{endpoint, BodyError, RequestOptions, Transport};
use futures::stream::{self, StreamExt};
use listing::TreeResponse;
use serde::Serialize;
use tracing::{debug, info, info_span, warn, Instrument};

/// Largest tree listing body accepted.
const MAX_LISTING_BYTES: u64 = 64 * 1024 * 1024;

/// Result of downloading a plan.
#[derive(Debug, Default, Serialize)]
pub struct DownloadReport {
    /// Retrieved files, in completion order.
    pub files: Vec<FileRecord>,

    /// Downloads not attempted because the quota ran out.
    pub skipped: usize,

    /// Blobs filtered out, not admitted, or discarded after download.
    pub dropped: usize,

    /// Downloads that failed in transport.
    pub failed: usize,
}

/// How one download ended.
enum FileOutcome {
    Retrieved(FileRecord),
    Skipped,
    Dropped,
    Failed,
}

/// Lists a branch and downloads its admitted files.
#[derive(Debug)]
pub struct TreeRetriever<'a, T> {
    transport: &'a T,
    quota: &'a QuotaTracker,
    config: &'a RetrievalConfig,
    credentialed: bool,
}

impl<'a, T: Transport> TreeRetriever<'a, T> {
    #[must_use]
    pub fn new(
        transport: &'a T,
        quota: &'a QuotaTracker,
        config: &'a RetrievalConfig,
        credentialed: bool,
    ) -> Self {
        Self {
            transport,
            quota,
            config,
            credentialed,
        }
    }

    /// Retrieves the files of `branch`.
    ///
    /// # Errors
    ///
    /// Returns a classified [`RetrievalFailure`] if the listing fails, or
    /// [`FailureKind::QuotaExceeded`] if files were planned but every
    /// download was skipped for lack of quota.
    pub async fn retrieve(
        &self,
        handle: &RepositoryHandle,
        branch: &str,
    ) -> Result<DownloadReport, RetrievalFailure> {
        let span = info_span!("tree", repo = %handle, %branch);

        async {
            let entries = self.list(handle, branch).await?;
            let plan = plan_downloads(&entries, self.config);
            info!(
                entries = entries.len(),
                planned = plan.files.len(),
                dropped = plan.dropped,
                "Planned downloads"
            );

            let mut report = self.download(handle, branch, plan.files).await;
            report.dropped += plan.dropped;
            info!(
                files = report.files.len(),
                skipped = report.skipped,
                dropped = report.dropped,
                failed = report.failed,
                "Tree retrieval complete"
            );

            if report.files.is_empty() && report.skipped > 0 {
                let state = self.quota.snapshot().await;
                return Err(RetrievalFailure::new(
                    FailureKind::QuotaExceeded,
                    format!("API quota exhausted; {} downloads skipped", report.skipped),
                )
                .with_reset_at(state.reset_at));
            }
            if report.files.is_empty() && report.failed > 0 {
                return Err(RetrievalFailure::new(
                    FailureKind::Transient,
                    format!("All {} file downloads failed", report.failed),
                ));
            }

            Ok(report)
        }
        .instrument(span)
        .await
    }

    /// Fetches the recursive listing as one quota-counted call.
    ///
    /// # Errors
    ///
    /// Returns a [`RetrievalFailure`] classified from the upstream response.
    pub async fn list(
        &self,
        handle: &RepositoryHandle,
        branch: &str,
    ) -> Result<Vec<TreeEntry>, RetrievalFailure> {
        let mut url = endpoint(
            &self.config.api_base,
            ["repos", handle.owner.as_str(), handle.name.as_str(), "git", "trees", branch],
        )
        .ok_or_else(|| {
            RetrievalFailure::new(FailureKind::Transient, "API base URL cannot carry a path")
        })?;
        url.query_pairs_mut().append_pair("recursive", "1");
        let options = RequestOptions::with_timeout(self.config.api_timeout());

        let response = self
            .quota
            .execute(1, || self.transport.get(url.as_str(), &options))
            .await
            .map_err(|e| RetrievalFailure::from_quota_error(&e, self.credentialed))?;

        let body = response
            .collect_limited(MAX_LISTING_BYTES)
            .await
            .map_err(|e| RetrievalFailure::new(FailureKind::Transient, e.to_string()))?;
        let listing: TreeResponse = serde_json::from_slice(&body).map_err(|e| {
            RetrievalFailure::new(FailureKind::Transient, format!("Malformed tree listing: {e}"))
        })?;

        if listing.truncated {
            warn!("Tree listing was truncated upstream; some files are missing");
        }
        Ok(listing.tree)
    }

    /// Downloads planned files in fixed-size groups with bounded concurrency.
    ///
    /// Each download reserves one quota unit without waiting; a download that
    /// does not fit is counted as skipped and its siblings carry on.
    pub async fn download(
        &self,
        handle: &RepositoryHandle,
        branch: &str,
        planned: Vec<PlannedFile>,
    ) -> DownloadReport {
        let concurrency = self.config.concurrency(self.credentialed).max(1);
        let batch_size = self.config.batch_size(self.credentialed).max(1);
        let mut report = DownloadReport::default();

        for (index, batch) in planned.chunks(batch_size).enumerate() {
            debug!(batch = index, size = batch.len(), "Downloading batch");
            let outcomes: Vec<FileOutcome> = stream::iter(batch)
                .map(|file| self.fetch_file(handle, branch, file))
                .buffer_unordered(concurrency)
                .collect()
                .await;

            for outcome in outcomes {
                match outcome {
                    FileOutcome::Retrieved(record) => report.files.push(record),
                    FileOutcome::Skipped => report.skipped += 1,
                    FileOutcome::Dropped => report.dropped += 1,
                    FileOutcome::Failed => report.failed += 1,
                }
            }
        }

        report
    }

    async fn fetch_file(
        &self,
        handle: &RepositoryHandle,
        branch: &str,
        file: &PlannedFile,
    ) -> FileOutcome {
        let segments = [handle.owner.as_str(), handle.name.as_str()]
            .into_iter()
            .chain(branch.split('/'))
            .chain(file.path.split('/'));
        let Some(url) = endpoint(&self.config.raw_base, segments) else {
            return FileOutcome::Failed;
        };
        let options = RequestOptions::with_timeout(self.config.file_timeout());

        let response = match self
            .quota
            .try_execute(1, || self.transport.get(url.as_str(), &options))
            .await
        {
            Ok(response) => response,
            Err(QuotaError::Exhausted { .. }) => return FileOutcome::Skipped,
            Err(QuotaError::Transport(e)) => {
                debug!(path = %file.path, error = %e, "Download failed");
                return FileOutcome::Failed;
            }
        };

        let max_file_size = self.config.max_file_size;
        let bytes = match response.collect_limited(max_file_size).await {
            Ok(bytes) => bytes,
            Err(BodyError::TooLarge { .. }) => return FileOutcome::Dropped,
            Err(BodyError::Transport(e)) => {
                debug!(path = %file.path, error = %e, "Download interrupted");
                return FileOutcome::Failed;
            }
        };

        let path = file.path.clone();
        match tokio::task::spawn_blocking(move || FileRecord::from_bytes(&path, &bytes, max_file_size))
            .await
        {
            Ok(Some(record)) => FileOutcome::Retrieved(record),
            Ok(None) => FileOutcome::Dropped,
            Err(e) => {
                debug!(path = %file.path, error = %e, "Decoding task failed");
                FileOutcome::Failed
            }
        }
    }
}
