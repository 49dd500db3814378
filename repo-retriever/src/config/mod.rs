//! Retrieval settings and credential handling.
//!
//! Settings are read from an optional TOML file with a single `[retrieval]`
//! table; every key is optional and falls back to the built-in defaults.

mod credential;
mod error;

pub use credential::{Credential, CredentialKind, TOKEN_ENV_VARS};
pub use error::ConfigError;

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

const MIB: u64 = 1024 * 1024;

/// Tunables for one retrieval session.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct RetrievalConfig {
    /// Base URL of the metadata API.
    pub api_base: String,

    /// Base URL serving raw blob contents.
    pub raw_base: String,

    /// Base URL serving branch archives.
    pub archive_base: String,

    /// `User-Agent` sent with every request.
    pub user_agent: String,

    /// Largest single file kept, in bytes.
    pub max_file_size: u64,

    /// Total byte budget for files admitted by the tree path.
    pub max_total_size: u64,

    /// Largest archive accepted, in bytes (declared or streamed).
    pub max_archive_size: u64,

    /// Maximum number of files admitted by the tree path.
    pub max_files: usize,

    /// Calls held back from the quota as a safety margin.
    pub quota_safety_buffer: u32,

    /// Longest time to sleep waiting for a quota reset.
    pub max_quota_wait_secs: u64,

    /// In-flight download cap when a credential is present.
    pub credentialed_concurrency: usize,

    /// In-flight download cap for anonymous callers.
    pub anonymous_concurrency: usize,

    /// Download group size when a credential is present.
    pub credentialed_batch_size: usize,

    /// Download group size for anonymous callers.
    pub anonymous_batch_size: usize,

    /// Deadline for metadata API calls.
    pub api_timeout_secs: u64,

    /// Deadline for archive downloads.
    pub archive_timeout_secs: u64,

    /// Deadline for single blob downloads.
    pub file_timeout_secs: u64,

    /// Deadline for establishing a connection.
    pub connect_timeout_secs: u64,

    /// Deadline for one whole retrieval; in-flight requests are aborted past it.
    pub retrieval_timeout_secs: u64,
}

/// Top-level structure of a retrieval config file.
#[derive(Debug, Deserialize)]
struct RetrievalConfigFile {
    #[serde(default)]
    retrieval: RetrievalConfig,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.github.com".to_string(),
            raw_base: "https://raw.githubusercontent.com".to_string(),
            archive_base: "https://github.com".to_string(),
            user_agent: concat!("repo-retriever/", env!("CARGO_PKG_VERSION")).to_string(),
            max_file_size: MIB,
            max_total_size: 100 * MIB,
            max_archive_size: 200 * MIB,
            max_files: 1000,
            quota_safety_buffer: 10,
            max_quota_wait_secs: 300,
            credentialed_concurrency: 100,
            anonymous_concurrency: 20,
            credentialed_batch_size: 50,
            anonymous_batch_size: 20,
            api_timeout_secs: 20,
            archive_timeout_secs: 180,
            file_timeout_secs: 30,
            connect_timeout_secs: 15,
            retrieval_timeout_secs: 600,
        }
    }
}

impl RetrievalConfig {
    /// Loads settings from a TOML file and validates them.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read, is not valid TOML,
    /// or holds an out-of-range value.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        info!(path = %path.display(), "Loading retrieval config");

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            path: path.display().to_string(),
            source: e,
        })?;

        let file: RetrievalConfigFile =
            toml::from_str(&content).map_err(|e| ConfigError::TomlError {
                path: path.display().to_string(),
                source: e,
            })?;

        file.retrieval.validate()?;
        debug!(config = ?file.retrieval, "Loaded retrieval config");
        Ok(file.retrieval)
    }

    /// Checks that every limit is usable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] naming the first bad key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let non_zero: [(&'static str, u64); 9] = [
            ("max-file-size", self.max_file_size),
            ("max-total-size", self.max_total_size),
            ("max-archive-size", self.max_archive_size),
            ("max-files", self.max_files as u64),
            ("credentialed-concurrency", self.credentialed_concurrency as u64),
            ("anonymous-concurrency", self.anonymous_concurrency as u64),
            ("credentialed-batch-size", self.credentialed_batch_size as u64),
            ("anonymous-batch-size", self.anonymous_batch_size as u64),
            ("retrieval-timeout-secs", self.retrieval_timeout_secs),
        ];
        if let Some((key, _)) = non_zero.into_iter().find(|(_, value)| *value == 0) {
            return Err(ConfigError::ValidationError {
                key,
                message: "must be greater than zero".to_string(),
            });
        }

        if self.max_file_size > self.max_total_size {
            return Err(ConfigError::ValidationError {
                key: "max-file-size",
                message: format!(
                    "{} exceeds max-total-size {}",
                    self.max_file_size, self.max_total_size
                ),
            });
        }

        for (key, base) in [
            ("api-base", &self.api_base),
            ("raw-base", &self.raw_base),
            ("archive-base", &self.archive_base),
        ] {
            url::Url::parse(base).map_err(|e| ConfigError::ValidationError {
                key,
                message: format!("'{base}' is not a valid URL: {e}"),
            })?;
        }

        Ok(())
    }

    /// Returns the in-flight download cap for the caller's identity.
    #[must_use]
    pub fn concurrency(&self, credentialed: bool) -> usize {
        if credentialed {
            self.credentialed_concurrency
        } else {
            self.anonymous_concurrency
        }
    }

    /// Returns the download group size for the caller's identity.
    #[must_use]
    pub fn batch_size(&self, credentialed: bool) -> usize {
        if credentialed {
            self.credentialed_batch_size
        } else {
            self.anonymous_batch_size
        }
    }

    /// Deadline for metadata API calls.
    #[must_use]
    pub fn api_timeout(&self) -> Duration {
        Duration::from_secs(self.api_timeout_secs)
    }

    /// Deadline for archive downloads.
    #[must_use]
    pub fn archive_timeout(&self) -> Duration {
        Duration::from_secs(self.archive_timeout_secs)
    }

    /// Deadline for blob downloads.
    #[must_use]
    pub fn file_timeout(&self) -> Duration {
        Duration::from_secs(self.file_timeout_secs)
    }

    /// Deadline for establishing a connection.
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Deadline for a whole retrieval.
    #[must_use]
    pub fn retrieval_timeout(&self) -> Duration {
        Duration::from_secs(self.retrieval_timeout_secs)
    }

    /// Longest quota-reset wait.
    #[must_use]
    pub fn max_quota_wait(&self) -> Duration {
        Duration::from_secs(self.max_quota_wait_secs)
    }
}
