//! Recursive tree listings and download planning.

use crate::config::RetrievalConfig;
use crate::files::{file_priority, is_keepable_path};
use serde::Deserialize;

/// Body of `GET /repos/{owner}/{repo}/git/trees/{branch}?recursive=1`.
#[derive(Debug, Deserialize)]
pub(crate) struct TreeResponse {
    #[serde(default)]
    pub tree: Vec<TreeEntry>,

    /// Set when the listing was cut short upstream.
    #[serde(default)]
    pub truncated: bool,
}

/// One entry of a tree listing.
#[derive(Debug, Clone, Deserialize)]
pub struct TreeEntry {
    pub path: String,

    /// `blob`, `tree` or `commit` (submodule).
    #[serde(rename = "type")]
    pub kind: String,

    /// Blob size in bytes; absent for non-blobs.
    #[serde(default)]
    pub size: Option<u64>,
}

impl TreeEntry {
    #[must_use]
    pub fn is_blob(&self) -> bool {
        self.kind == "blob"
    }
}

/// A file admitted for download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedFile {
    pub path: String,
    pub size: u64,
    pub priority: u32,
}

/// Files chosen for download, highest priority first.
#[derive(Debug, Default)]
pub struct DownloadPlan {
    pub files: Vec<PlannedFile>,

    /// Blobs filtered out or not admitted under the budget.
    pub dropped: usize,
}

/// Filters, scores and admits blobs under the size budget and file cap.
///
/// Admission is greedy in descending priority order and stops at the first
/// entry that would overflow the budget; nothing after it is admitted.
#[must_use]
pub fn plan_downloads(entries: &[TreeEntry], config: &RetrievalConfig) -> DownloadPlan {
    let blobs: Vec<&TreeEntry> = entries.iter().filter(|e| e.is_blob()).collect();

    let mut candidates: Vec<PlannedFile> = blobs
        .iter()
        .filter(|e| is_keepable_path(&e.path))
        .map(|e| PlannedFile {
            path: e.path.clone(),
            size: e.size.unwrap_or(0),
            priority: file_priority(&e.path),
        })
        .filter(|f| f.size <= config.max_file_size)
        .collect();
    candidates.sort_by(|a, b| b.priority.cmp(&a.priority));

    let mut total: u64 = 0;
    let mut files = Vec::new();
    for candidate in candidates {
        if files.len() >= config.max_files || total + candidate.size > config.max_total_size {
            break;
        }
        total += candidate.size;
        files.push(candidate);
    }

    DownloadPlan {
        dropped: blobs.len() - files.len(),
        files,
    }
}
