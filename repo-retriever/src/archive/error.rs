//! Archive extraction error types.

use thiserror::Error;

/// Errors that can occur while unpacking a downloaded archive.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// The payload is not a ZIP archive or its central directory is corrupt.
    #[error("Corrupt archive: {0}")]
    Corrupt(#[from] zip::result::ZipError),

    /// The blocking extraction task did not complete.
    #[error("Extraction task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
