//! Repository identity, branches and metadata.

mod branch;
mod error;
mod handle;
mod info;
mod metadata;

pub use branch::{BranchCandidate, BranchSelection};
pub use error::RepositoryError;
pub use handle::RepositoryHandle;
pub use info::RepositoryInfo;
pub use metadata::{fetch_repository_info, MetadataMode};
