//! Repository metadata record.

use super::{RepositoryError, RepositoryHandle};
use octocrab::models::Repository;
use serde::Serialize;

/// Metadata describing a retrieved repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepositoryInfo {
    /// Repository name.
    pub name: String,

    /// Full repository name in "owner/name" format.
    pub full_name: String,

    pub description: Option<String>,

    /// Primary language as reported upstream.
    pub language: Option<String>,

    /// Size reported upstream, in KiB.
    pub size_kb: u32,

    /// Default branch name (e.g., "main").
    pub default_branch: String,

    /// `public`, `private`, `internal`, or `unknown` for placeholders.
    pub visibility: String,

    pub private: bool,
    pub archived: bool,
    pub disabled: bool,
    pub topics: Vec<String>,

    /// License display name.
    pub license: Option<String>,

    pub stars: u32,
    pub forks: u32,

    /// RFC 3339 timestamps.
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub pushed_at: Option<String>,

    pub html_url: Option<String>,
    pub clone_url: Option<String>,

    /// Set when the record was synthesized instead of fetched.
    pub placeholder: bool,
}

impl RepositoryInfo {
    /// Synthetic record used when metadata could not be fetched.
    #[must_use]
    pub fn placeholder(handle: &RepositoryHandle) -> Self {
        Self {
            name: handle.name.clone(),
            full_name: handle.full_name(),
            description: None,
            language: None,
            size_kb: 0,
            default_branch: "main".to_string(),
            visibility: "unknown".to_string(),
            private: false,
            archived: false,
            disabled: false,
            topics: Vec::new(),
            license: None,
            stars: 0,
            forks: 0,
            created_at: None,
            updated_at: None,
            pushed_at: None,
            html_url: Some(format!("https://github.com/{}", handle.full_name())),
            clone_url: None,
            placeholder: true,
        }
    }

    /// Decodes a `GET /repos/{owner}/{repo}` response body.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::MalformedMetadata`] if the body is not a
    /// repository object.
    pub fn from_json(body: &[u8], handle: &RepositoryHandle) -> Result<Self, RepositoryError> {
        let model: Repository = serde_json::from_slice(body)?;
        Ok(Self::from_model(model, handle))
    }

    /// Converts the upstream repository model.
    #[must_use]
    pub fn from_model(model: Repository, handle: &RepositoryHandle) -> Self {
        let private = model.private.unwrap_or(false);
        let visibility = model.visibility.unwrap_or_else(|| {
            if private { "private" } else { "public" }.to_string()
        });

        Self {
            full_name: model.full_name.unwrap_or_else(|| handle.full_name()),
            name: model.name,
            description: model.description.filter(|d| !d.is_empty()),
            language: model
                .language
                .as_ref()
                .and_then(|v| v.as_str())
                .map(str::to_string),
            size_kb: model.size.unwrap_or(0),
            default_branch: model
                .default_branch
                .filter(|b| !b.is_empty())
                .unwrap_or_else(|| "main".to_string()),
            visibility,
            private,
            archived: model.archived.unwrap_or(false),
            disabled: model.disabled.unwrap_or(false),
            topics: model.topics.unwrap_or_default(),
            license: model.license.map(|l| l.name),
            stars: model.stargazers_count.unwrap_or(0),
            forks: model.forks_count.unwrap_or(0),
            created_at: model.created_at.map(|t| t.to_rfc3339()),
            updated_at: model.updated_at.map(|t| t.to_rfc3339()),
            pushed_at: model.pushed_at.map(|t| t.to_rfc3339()),
            html_url: model.html_url.map(|u| u.to_string()),
            clone_url: model.clone_url.map(|u| u.to_string()),
            placeholder: false,
        }
    }
}
