//! Repository identity error types.

use thiserror::Error;

/// Errors raised while identifying a repository or branch.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The reference does not name a hosted repository.
    #[error("Invalid repository reference '{input}': {reason}")]
    InvalidReference { input: String, reason: &'static str },

    /// The requested branch is not a valid git reference name.
    #[error("Invalid branch name '{branch}': {message}")]
    InvalidBranch { branch: String, message: String },

    /// The metadata endpoint returned something other than a repository.
    #[error("Malformed repository metadata: {0}")]
    MalformedMetadata(#[from] serde_json::Error),
}
