//! Retrieval policy: archive first, API fallback.
//!
//! The archive path costs no API quota and is always tried first (unless the
//! caller asks for a specific path). Retriable archive failures fall back to
//! the tree path when a credential is present. If the fallback fails too, the
//! archive failure stays the reported cause and the API failure is attached
//! to it.

mod failure;
mod outcome;

pub use failure::{FailureKind, RetrievalFailure};
pub use outcome::{
    RetrievalMethod, RetrievalOutcome, RetrievalRequest, RetrievalSource, RetrievedRepository,
};

use crate::archive::{ArchiveRetriever, ArchiveSnapshot};
use crate::config::{Credential, RetrievalConfig};
use crate::guidance::{Guidance, GuidanceRenderer};
use crate::quota::QuotaTracker;
use crate::repository::{
    fetch_repository_info, BranchSelection, MetadataMode, RepositoryHandle, RepositoryInfo,
};
use crate::transport::{HttpTransport, Transport, TransportError};
use crate::tree::TreeRetriever;
use tracing::{debug, info, info_span, warn, Instrument};

/// Retrieves repositories for one caller identity.
///
/// Owns the caller's [`QuotaTracker`]; reuse one `Retriever` for every
/// retrieval made with the same credential.
pub struct Retriever<T> {
    transport: T,
    config: RetrievalConfig,
    credential: Option<Credential>,
    quota: QuotaTracker,
    guidance: GuidanceRenderer,
}

impl Retriever<HttpTransport> {
    /// Creates a retriever backed by the pooled HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Setup`] if the client cannot be built.
    pub fn from_config(
        config: RetrievalConfig,
        credential: Option<Credential>,
    ) -> Result<Self, TransportError> {
        let transport = HttpTransport::new(&config, credential.as_ref())?;
        Ok(Self::new(transport, config, credential))
    }
}

impl<T: Transport> Retriever<T> {
    /// Creates a retriever over any transport.
    #[must_use]
    pub fn new(transport: T, config: RetrievalConfig, credential: Option<Credential>) -> Self {
        match &credential {
            Some(credential) => info!(
                credential = %credential.masked(),
                kind = credential.kind().as_str(),
                "Using credential"
            ),
            None => info!("No credential supplied; anonymous limits apply"),
        }

        let quota = QuotaTracker::from_config(&config, credential.is_some());
        Self {
            transport,
            config,
            credential,
            quota,
            guidance: GuidanceRenderer::new(),
        }
    }

    /// The caller's quota tracker.
    #[must_use]
    pub fn quota(&self) -> &QuotaTracker {
        &self.quota
    }

    #[must_use]
    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    fn credentialed(&self) -> bool {
        self.credential.is_some()
    }

    /// Runs one retrieval under the caller-level deadline.
    ///
    /// Past the deadline every in-flight request is dropped and the result is
    /// a [`FailureKind::Transient`] failure; partial downloads are discarded.
    pub async fn retrieve(&self, request: &RetrievalRequest) -> RetrievalOutcome {
        let deadline = self.config.retrieval_timeout();
        match tokio::time::timeout(deadline, self.run(request)).await {
            Ok(outcome) => outcome,
            Err(_) => {
                warn!(repo = %request.handle, timeout_secs = deadline.as_secs(), "Retrieval timed out");
                RetrievalOutcome::Failure(RetrievalFailure::new(
                    FailureKind::Transient,
                    format!("Retrieval timed out after {}s", deadline.as_secs()),
                ))
            }
        }
    }

    async fn run(&self, request: &RetrievalRequest) -> RetrievalOutcome {
        let span = info_span!(
            "retrieve",
            repo = %request.handle,
            method = ?request.method,
            credentialed = self.credentialed()
        );

        async {
            let result = match request.method {
                RetrievalMethod::Archive => match self.archive_path(request).await {
                    Ok(snapshot) => Ok(self.finish_archive(&request.handle, snapshot).await),
                    Err(failure) => Err(self.annotate(&request.handle, failure).await),
                },
                RetrievalMethod::Api => match self.api_path(request).await {
                    Ok(repository) => Ok(repository),
                    Err(failure) => Err(self.annotate(&request.handle, failure).await),
                },
                RetrievalMethod::Auto => self.archive_first(request).await,
            };

            match result {
                Ok(repository) => {
                    info!(
                        files = repository.files.len(),
                        bytes = repository.total_size(),
                        source = ?repository.source,
                        "Retrieval succeeded"
                    );
                    RetrievalOutcome::Success(repository)
                }
                Err(failure) => {
                    warn!(kind = %failure.kind, detail = %failure.detail, "Retrieval failed");
                    RetrievalOutcome::Failure(failure)
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn archive_first(
        &self,
        request: &RetrievalRequest,
    ) -> Result<RetrievedRepository, RetrievalFailure> {
        let archive_failure = match self.archive_path(request).await {
            Ok(snapshot) => return Ok(self.finish_archive(&request.handle, snapshot).await),
            Err(failure) => failure,
        };

        if !archive_failure.kind.is_retriable() {
            debug!(kind = %archive_failure.kind, "Not retriable; no fallback");
            return Err(self.annotate(&request.handle, archive_failure).await);
        }
        if !self.credentialed() {
            info!(kind = %archive_failure.kind, "No credential; API fallback unavailable");
            return Err(self.annotate(&request.handle, archive_failure).await);
        }

        warn!(kind = %archive_failure.kind, "Archive path failed, falling back to API");
        match self.api_path(request).await {
            Ok(repository) => Ok(repository),
            Err(api_failure) => {
                warn!(kind = %api_failure.kind, "API fallback failed");
                let api_failure = self.annotate(&request.handle, api_failure).await;
                Err(self
                    .annotate(&request.handle, archive_failure)
                    .await
                    .with_fallback(api_failure))
            }
        }
    }

    async fn archive_path(
        &self,
        request: &RetrievalRequest,
    ) -> Result<ArchiveSnapshot, RetrievalFailure> {
        ArchiveRetriever::new(&self.transport, &self.config)
            .retrieve(&request.handle, &request.branch)
            .await
    }

    async fn finish_archive(
        &self,
        handle: &RepositoryHandle,
        snapshot: ArchiveSnapshot,
    ) -> RetrievedRepository {
        let mut repo_info = fetch_repository_info(
            &self.transport,
            &self.quota,
            &self.config,
            handle,
            MetadataMode::Safe,
            self.credentialed(),
        )
        .await
        .unwrap_or_else(|_| RepositoryInfo::placeholder(handle));
        if repo_info.placeholder {
            repo_info.default_branch.clone_from(&snapshot.branch);
        }

        RetrievedRepository {
            files: snapshot.files,
            repo_info,
            source: RetrievalSource::Archive,
            branch: snapshot.branch,
            skipped: 0,
            dropped: 0,
            failed: 0,
        }
    }

    async fn api_path(
        &self,
        request: &RetrievalRequest,
    ) -> Result<RetrievedRepository, RetrievalFailure> {
        let repo_info = fetch_repository_info(
            &self.transport,
            &self.quota,
            &self.config,
            &request.handle,
            MetadataMode::Strict,
            self.credentialed(),
        )
        .await?;

        let branch = match &request.branch {
            BranchSelection::Explicit(branch) => branch.clone(),
            BranchSelection::Auto => repo_info.default_branch.clone(),
        };
        info!(%branch, "Retrieving through API");

        let report = TreeRetriever::new(
            &self.transport,
            &self.quota,
            &self.config,
            self.credentialed(),
        )
        .retrieve(&request.handle, &branch)
        .await?;

        Ok(RetrievedRepository {
            files: report.files,
            repo_info,
            source: RetrievalSource::Api,
            branch,
            skipped: report.skipped,
            dropped: report.dropped,
            failed: report.failed,
        })
    }

    /// Attaches guidance, and marks access denials final for anonymous callers.
    ///
    /// Quota failures without an upstream reset time take the tracker's.
    async fn annotate(
        &self,
        handle: &RepositoryHandle,
        mut failure: RetrievalFailure,
    ) -> RetrievalFailure {
        if failure.kind == FailureKind::QuotaExceeded && failure.reset_at.is_none() {
            failure.reset_at = Some(self.quota.snapshot().await.reset_at);
        }
        let credentialed = self.credentialed();
        let guidance = match (failure.kind, credentialed) {
            (FailureKind::Forbidden | FailureKind::NotFound, false) => {
                Some(Guidance::PrivateWithoutCredential)
            }
            (FailureKind::Forbidden | FailureKind::AuthenticationFailure, true) => {
                Some(Guidance::InsufficientCredential)
            }
            (FailureKind::QuotaExceeded, _) => Some(Guidance::QuotaExhausted),
            _ => None,
        };

        let rendered = guidance.and_then(|guidance| {
            match self
                .guidance
                .render(guidance, handle, credentialed, failure.reset_at)
            {
                Ok(text) => Some(text),
                Err(e) => {
                    warn!(error = %e, "Failed to render guidance");
                    None
                }
            }
        });

        let failure = failure.with_guidance(rendered);
        if failure.kind == FailureKind::Forbidden && !credentialed {
            failure.final_for_caller()
        } else {
            failure
        }
    }
}
