//! Retrieval requests and results.

use super::RetrievalFailure;
use crate::files::FileRecord;
use crate::repository::{BranchSelection, RepositoryHandle, RepositoryInfo};
use serde::Serialize;

/// Which retrieval paths may be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RetrievalMethod {
    /// Archive first, API fallback on retriable failures when credentialed.
    #[default]
    Auto,
    /// Archive only.
    Archive,
    /// Metadata API and tree listing only.
    Api,
}

/// Path that produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RetrievalSource {
    Archive,
    Api,
}

/// What to retrieve.
#[derive(Debug, Clone)]
pub struct RetrievalRequest {
    pub handle: RepositoryHandle,
    pub branch: BranchSelection,
    pub method: RetrievalMethod,
}

impl RetrievalRequest {
    /// Request for the default branch using [`RetrievalMethod::Auto`].
    #[must_use]
    pub fn new(handle: RepositoryHandle) -> Self {
        Self {
            handle,
            branch: BranchSelection::Auto,
            method: RetrievalMethod::Auto,
        }
    }

    #[must_use]
    pub fn with_branch(mut self, branch: BranchSelection) -> Self {
        self.branch = branch;
        self
    }

    #[must_use]
    pub fn with_method(mut self, method: RetrievalMethod) -> Self {
        self.method = method;
        self
    }
}

/// A successful retrieval.
#[derive(Debug, Serialize)]
pub struct RetrievedRepository {
    /// Retained files. Order is unspecified.
    pub files: Vec<FileRecord>,

    pub repo_info: RepositoryInfo,
    pub source: RetrievalSource,

    /// Branch the files came from.
    pub branch: String,

    /// Tree-path downloads skipped for lack of quota.
    pub skipped: usize,

    /// Tree-path blobs filtered out or not admitted.
    pub dropped: usize,

    /// Tree-path downloads that failed in transport.
    pub failed: usize,
}

impl RetrievedRepository {
    /// Total bytes across retained files.
    #[must_use]
    pub fn total_size(&self) -> u64 {
        self.files.iter().map(|f| f.size).sum()
    }
}

/// Result of one retrieval.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RetrievalOutcome {
    Success(RetrievedRepository),
    Failure(RetrievalFailure),
}

impl RetrievalOutcome {
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Converts into a `Result`.
    ///
    /// # Errors
    ///
    /// Returns the failure for [`RetrievalOutcome::Failure`].
    pub fn into_result(self) -> Result<RetrievedRepository, RetrievalFailure> {
        match self {
            Self::Success(repository) => Ok(repository),
            Self::Failure(failure) => Err(failure),
        }
    }
}
