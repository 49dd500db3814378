#![doc = include_str!(concat!("../", env!("CARGO_PKG_README")))]

pub mod archive;
pub mod config;
pub mod files;
pub mod guidance;
pub mod quota;
pub mod repository;
pub mod retrieval;
pub mod transport;
pub mod tree;

pub use archive::{ArchiveError, ArchiveRetriever, ArchiveSnapshot};
pub use config::{ConfigError, Credential, CredentialKind, RetrievalConfig};
pub use files::{decode_text, file_priority, is_binary_path, is_excluded_path, FileRecord};
pub use guidance::{Guidance, GuidanceError, GuidanceRenderer};
pub use quota::{QuotaError, QuotaState, QuotaTracker};
pub use repository::{
    fetch_repository_info, BranchCandidate, BranchSelection, MetadataMode, RepositoryError,
    RepositoryHandle, RepositoryInfo,
};
pub use retrieval::{
    FailureKind, RetrievalFailure, RetrievalMethod, RetrievalOutcome, RetrievalRequest,
    RetrievalSource, RetrievedRepository, Retriever,
};
pub use transport::{
    BodyError, BodyStream, HttpTransport, RequestOptions, Response, Transport, TransportError,
};
pub use tree::{plan_downloads, DownloadPlan, DownloadReport, PlannedFile, TreeEntry, TreeRetriever};
