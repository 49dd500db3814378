//! Quota-free retrieval through branch archive downloads.
//!
//! Candidate branches are tried in order. Each download is guarded twice
//! against oversized payloads: the declared `Content-Length` is checked
//! before the body is touched, and a running total is checked while
//! streaming.

mod error;
mod extract;

pub use error::ArchiveError;

use crate::config::RetrievalConfig;
use crate::files::FileRecord;
use crate::repository::{BranchSelection, RepositoryHandle};
use crate::retrieval::{FailureKind, RetrievalFailure};
use crate::transport::{endpoint, BodyError, RequestOptions, Transport, TransportError};
use bytes::Bytes;
use reqwest::StatusCode;
use tracing::{debug, info, info_span, warn, Instrument};

/// Smallest payload that could be a real archive.
const MIN_ARCHIVE_BYTES: usize = 100;

/// Local file header signature.
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

const ARCHIVE_ACCEPT: &str = "application/zip, application/octet-stream";

/// Files unpacked from one branch archive.
#[derive(Debug, Clone)]
pub struct ArchiveSnapshot {
    /// Branch whose archive was used.
    pub branch: String,
    pub files: Vec<FileRecord>,
}

/// Outcome of one candidate branch.
enum Attempt {
    /// 404: try the next candidate.
    Missing,
    /// Stop walking candidates and report this.
    Stop(RetrievalFailure),
    /// Remember this and try the next candidate.
    Failed(RetrievalFailure),
}

/// Downloads and unpacks branch archives.
#[derive(Debug)]
pub struct ArchiveRetriever<'a, T> {
    transport: &'a T,
    config: &'a RetrievalConfig,
}

impl<'a, T: Transport> ArchiveRetriever<'a, T> {
    #[must_use]
    pub fn new(transport: &'a T, config: &'a RetrievalConfig) -> Self {
        Self { transport, config }
    }

    /// Retrieves the files of the first candidate branch with a usable archive.
    ///
    /// # Errors
    ///
    /// Returns the most specific failure seen across all candidates. A 403
    /// stops the walk immediately. If every candidate is missing, the
    /// repository is reported as [`FailureKind::Forbidden`], since an
    /// anonymous caller cannot tell a private repository from an absent one.
    pub async fn retrieve(
        &self,
        handle: &RepositoryHandle,
        selection: &BranchSelection,
    ) -> Result<ArchiveSnapshot, RetrievalFailure> {
        let span = info_span!("archive", repo = %handle);

        async {
            let mut worst: Option<RetrievalFailure> = None;

            for branch in selection.candidates() {
                debug!(%branch, "Trying archive");
                match self.attempt(handle, &branch).await {
                    Ok(files) => {
                        info!(%branch, files = files.len(), "Archive retrieved");
                        return Ok(ArchiveSnapshot { branch, files });
                    }
                    Err(Attempt::Missing) => debug!(%branch, "No archive for branch"),
                    Err(Attempt::Stop(failure)) => {
                        warn!(%branch, kind = %failure.kind, "Archive access denied");
                        return Err(failure);
                    }
                    Err(Attempt::Failed(failure)) => {
                        warn!(%branch, kind = %failure.kind, detail = %failure.detail, "Archive attempt failed");
                        worst = Some(match worst {
                            Some(previous) if specificity(previous.kind) >= specificity(failure.kind) => {
                                previous
                            }
                            _ => failure,
                        });
                    }
                }
            }

            Err(worst.unwrap_or_else(|| {
                RetrievalFailure::new(
                    FailureKind::Forbidden,
                    "No archive found for any candidate branch; the repository may be private or absent",
                )
            }))
        }
        .instrument(span)
        .await
    }

    async fn attempt(
        &self,
        handle: &RepositoryHandle,
        branch: &str,
    ) -> Result<Vec<FileRecord>, Attempt> {
        let bytes = self.download(handle, branch).await?;
        let max_file_size = self.config.max_file_size;

        tokio::task::spawn_blocking(move || extract::extract_files(bytes, max_file_size))
            .await
            .map_err(ArchiveError::from)
            .and_then(|result| result)
            .map_err(|e| match e {
                ArchiveError::Corrupt(_) => {
                    Attempt::Failed(RetrievalFailure::new(FailureKind::MalformedArchive, e.to_string()))
                }
                ArchiveError::Join(_) => {
                    Attempt::Failed(RetrievalFailure::new(FailureKind::Transient, e.to_string()))
                }
            })
    }

    async fn download(&self, handle: &RepositoryHandle, branch: &str) -> Result<Bytes, Attempt> {
        let file = format!("{branch}.zip");
        let segments = [
            handle.owner.as_str(),
            handle.name.as_str(),
            "archive",
            "refs",
            "heads",
        ]
        .into_iter()
        .chain(file.split('/'));
        let url = endpoint(&self.config.archive_base, segments).ok_or_else(|| {
            Attempt::Stop(RetrievalFailure::new(
                FailureKind::Transient,
                "Archive base URL cannot carry a path",
            ))
        })?;

        let options =
            RequestOptions::with_timeout(self.config.archive_timeout()).accept(ARCHIVE_ACCEPT);
        let response = self
            .transport
            .get(url.as_str(), &options)
            .await
            .map_err(classify_transport)?;

        if let Some(content_type) = response.content_type() {
            if !(content_type.contains("zip") || content_type.contains("octet-stream")) {
                return Err(Attempt::Failed(RetrievalFailure::new(
                    FailureKind::MalformedArchive,
                    format!("Unexpected archive content type '{content_type}'"),
                )));
            }
        }

        let limit = self.config.max_archive_size;
        if let Some(declared) = response.content_length() {
            if declared > limit {
                return Err(Attempt::Failed(RetrievalFailure::new(
                    FailureKind::Oversize,
                    format!("Archive declares {declared} bytes, limit is {limit}"),
                )));
            }
        }

        let bytes = response.collect_limited(limit).await.map_err(|e| match e {
            BodyError::TooLarge { .. } => {
                Attempt::Failed(RetrievalFailure::new(FailureKind::Oversize, e.to_string()))
            }
            BodyError::Transport(transport) => classify_transport(transport),
        })?;

        if bytes.len() < MIN_ARCHIVE_BYTES || !bytes.starts_with(ZIP_MAGIC) {
            return Err(Attempt::Failed(RetrievalFailure::new(
                FailureKind::MalformedArchive,
                format!("Payload of {} bytes is not a ZIP archive", bytes.len()),
            )));
        }

        Ok(bytes)
    }
}

fn classify_transport(error: TransportError) -> Attempt {
    match error.status() {
        Some(StatusCode::NOT_FOUND) => Attempt::Missing,
        Some(StatusCode::FORBIDDEN) => Attempt::Stop(RetrievalFailure::new(
            FailureKind::Forbidden,
            "Archive access denied; the repository is likely private",
        )),
        Some(StatusCode::UNAUTHORIZED) => Attempt::Failed(RetrievalFailure::new(
            FailureKind::AuthenticationFailure,
            "Credential was rejected",
        )),
        _ => Attempt::Failed(RetrievalFailure::new(FailureKind::Transient, error.to_string())),
    }
}

/// Ranks failure kinds; the highest ranked one is reported.
fn specificity(kind: FailureKind) -> u8 {
    match kind {
        FailureKind::Forbidden => 6,
        FailureKind::AuthenticationFailure => 5,
        FailureKind::Oversize => 4,
        FailureKind::MalformedArchive => 3,
        FailureKind::NotFound | FailureKind::QuotaExceeded => 2,
        FailureKind::Transient => 1,
    }
}
