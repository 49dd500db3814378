//! Retained repository files and the rules for keeping them.

mod decode;
mod policy;

pub use decode::decode_text;
pub use policy::{
    file_priority, is_binary_path, is_excluded_path, BINARY_EXTENSIONS, DEFAULT_PRIORITY,
    EXCLUDED_DIRECTORIES,
};

use serde::Serialize;

/// One retained, decoded, size-bounded repository file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileRecord {
    /// Repository-relative, forward-slash path.
    pub path: String,

    /// Size of the raw bytes.
    pub size: u64,

    /// Decoded text.
    pub content: String,

    pub priority: u32,
}

impl FileRecord {
    /// Builds a record if `path` is keepable and `bytes` decode as text.
    ///
    /// Returns `None` for excluded or binary paths, bodies over `max_size`,
    /// and undecodable bodies.
    #[must_use]
    pub fn from_bytes(path: &str, bytes: &[u8], max_size: u64) -> Option<Self> {
        if path.is_empty() || !is_keepable_path(path) || bytes.len() as u64 > max_size {
            return None;
        }
        let content = decode_text(bytes)?;
        Some(Self {
            path: path.to_string(),
            size: bytes.len() as u64,
            content,
            priority: file_priority(path),
        })
    }
}

/// Neither under an excluded directory nor binary by extension.
#[must_use]
pub fn is_keepable_path(path: &str) -> bool {
    !is_excluded_path(path) && !is_binary_path(path)
}
