//! Caller-facing guidance attached to actionable failures.

mod error;

pub use error::GuidanceError;

use crate::config::TOKEN_ENV_VARS;
use crate::quota::{ANONYMOUS_LIMIT, CREDENTIALED_LIMIT};
use crate::repository::RepositoryHandle;
use handlebars::{no_escape, Handlebars};
use serde_json::json;
use std::time::{SystemTime, UNIX_EPOCH};

/// Where credentials are created.
pub const TOKEN_SETTINGS_URL: &str = "https://github.com/settings/tokens";

const PRIVATE_WITHOUT_CREDENTIAL: &str = "\
Repository {{full_name}} is private or does not exist.
To access a private repository, provide a GitHub access token:
  1. Visit {{token_url}}
  2. Generate a classic token with the 'repo' scope, or a fine-grained token with read access to {{full_name}}
  3. Pass it with --token, or set {{env_vars}}";

const INSUFFICIENT_CREDENTIAL: &str = "\
The supplied credential cannot access {{full_name}}.
Check that it has not expired and that it has the 'repo' scope (classic) or read access to repository contents (fine-grained).
Tokens are managed at {{token_url}}";

const QUOTA_EXHAUSTED: &str = "\
The API quota for this {{#if credentialed}}credential{{else}}anonymous caller{{/if}} is exhausted.
{{#if reset_at}}It resets in about {{reset_minutes}} minute(s), at Unix time {{reset_at}}.{{else}}Wait for the hourly window to reset.{{/if}}
{{#if credentialed}}Retry after the reset.{{else}}Supplying a credential raises the limit from {{anonymous_limit}} to {{credentialed_limit}} calls per hour.{{/if}}";

/// Situations a caller can act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guidance {
    /// Access denied and no credential was supplied.
    PrivateWithoutCredential,
    /// A credential was supplied but lacks access.
    InsufficientCredential,
    /// The API quota ran out.
    QuotaExhausted,
}

impl Guidance {
    fn template(self) -> &'static str {
        match self {
            Self::PrivateWithoutCredential => PRIVATE_WITHOUT_CREDENTIAL,
            Self::InsufficientCredential => INSUFFICIENT_CREDENTIAL,
            Self::QuotaExhausted => QUOTA_EXHAUSTED,
        }
    }
}

/// Renders guidance texts.
pub struct GuidanceRenderer {
    handlebars: Handlebars<'static>,
}

impl Default for GuidanceRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl GuidanceRenderer {
    /// Creates a renderer with plain-text output and strict variable checks.
    #[must_use]
    pub fn new() -> Self {
        let mut handlebars = Handlebars::new();
        handlebars.register_escape_fn(no_escape);
        handlebars.set_strict_mode(true);
        Self { handlebars }
    }

    /// Renders the guidance for a repository.
    ///
    /// # Errors
    ///
    /// Returns [`GuidanceError`] if rendering fails.
    pub fn render(
        &self,
        guidance: Guidance,
        handle: &RepositoryHandle,
        credentialed: bool,
        reset_at: Option<u64>,
    ) -> Result<String, GuidanceError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        let reset_minutes = reset_at.map(|reset| reset.saturating_sub(now).div_ceil(60));

        let data = json!({
            "full_name": handle.full_name(),
            "token_url": TOKEN_SETTINGS_URL,
            "env_vars": TOKEN_ENV_VARS.join(" or "),
            "credentialed": credentialed,
            "reset_at": reset_at,
            "reset_minutes": reset_minutes,
            "anonymous_limit": ANONYMOUS_LIMIT,
            "credentialed_limit": CREDENTIALED_LIMIT,
        });

        Ok(self.handlebars.render_template(guidance.template(), &data)?)
    }
}
