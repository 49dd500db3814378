//! Repository identity.

use super::RepositoryError;
use serde::Serialize;
use std::fmt;
use url::Url;

const HOSTS: [&str; 2] = ["github.com", "www.github.com"];

/// Owner and name of a hosted repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct RepositoryHandle {
    /// Repository owner (user or organization).
    pub owner: String,

    /// Repository name.
    pub name: String,
}

impl RepositoryHandle {
    /// Creates a handle from already-separated parts.
    #[must_use]
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// Parses a repository reference.
    ///
    /// Accepts `https://github.com/owner/repo`, `http://`, `github.com/owner/repo`
    /// and bare `owner/repo`, with an optional `.git` suffix. Trailing path
    /// segments such as `/tree/main/src` are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::InvalidReference`] for empty input, foreign
    /// hosts, or references missing an owner or name.
    pub fn parse(input: &str) -> Result<Self, RepositoryError> {
        let invalid = |reason| RepositoryError::InvalidReference {
            input: input.to_string(),
            reason,
        };

        let trimmed = input.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            return Err(invalid("empty reference"));
        }

        let candidate = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            trimmed.to_string()
        } else if trimmed.starts_with("github.com/") {
            format!("https://{trimmed}")
        } else {
            format!("https://github.com/{trimmed}")
        };

        let url = Url::parse(&candidate).map_err(|_| invalid("not a URL"))?;
        if !url.host_str().is_some_and(|host| HOSTS.contains(&host)) {
            return Err(invalid("not a GitHub URL"));
        }

        let path = url.path();
        let mut segments = path.strip_prefix('/').unwrap_or(path).split('/');
        let owner = segments.next().unwrap_or_default();
        let name = segments.next().unwrap_or_default();
        let name = name.strip_suffix(".git").unwrap_or(name);

        if !is_valid_segment(owner) {
            return Err(invalid("missing or malformed owner"));
        }
        if !is_valid_segment(name) {
            return Err(invalid("missing or malformed repository name"));
        }

        Ok(Self::new(owner, name))
    }

    /// Returns `owner/name`.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

impl fmt::Display for RepositoryHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

fn is_valid_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}
