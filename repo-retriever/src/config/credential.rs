//! Bearer credential resolution and masking.

use std::fmt;

/// Environment variables consulted, in order, when no credential is passed explicitly.
pub const TOKEN_ENV_VARS: [&str; 2] = ["GITHUB_TOKEN", "GH_TOKEN"];

/// An upstream bearer credential.
///
/// The raw value is only reachable through [`Credential::expose`]; `Debug`
/// prints the masked form so it never leaks into logs.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

/// Shape of a credential, inferred from its prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialKind {
    /// Classic personal access token (`ghp_`).
    PersonalClassic,
    /// Fine-grained personal access token (`github_pat_`).
    PersonalFineGrained,
    /// GitHub App installation token (`ghs_`).
    AppToken,
    /// 40 character hexadecimal legacy token.
    Legacy,
    /// Anything else.
    Unknown,
}

impl CredentialKind {
    /// Returns the kind as a short label for log fields.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PersonalClassic => "personal_classic",
            Self::PersonalFineGrained => "personal_fine_grained",
            Self::AppToken => "app_token",
            Self::Legacy => "legacy",
            Self::Unknown => "unknown",
        }
    }
}

impl Credential {
    /// Wraps a raw credential, returning `None` for blank input.
    #[must_use]
    pub fn new(raw: impl AsRef<str>) -> Option<Self> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    /// Resolves a credential from an explicit value or the environment.
    ///
    /// Priority: the explicit value, then `GITHUB_TOKEN`, then `GH_TOKEN`.
    /// Blank values at any level are skipped.
    #[must_use]
    pub fn resolve(explicit: Option<&str>) -> Option<Self> {
        if let Some(credential) = explicit.and_then(Self::new) {
            return Some(credential);
        }
        TOKEN_ENV_VARS
            .iter()
            .filter_map(|var| std::env::var(var).ok())
            .find_map(Self::new)
    }

    /// Returns the raw credential for use in an `Authorization` header.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Returns a masked form safe for logging (`ghp_****abcd`).
    #[must_use]
    pub fn masked(&self) -> String {
        let chars: Vec<char> = self.0.chars().collect();
        if chars.len() <= 8 {
            return "****".to_string();
        }
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{head}{}{tail}", "*".repeat(chars.len() - 8))
    }

    /// Infers the credential kind from its prefix and length.
    #[must_use]
    pub fn kind(&self) -> CredentialKind {
        let raw = self.0.as_str();
        if raw.starts_with("ghp_") {
            CredentialKind::PersonalClassic
        } else if raw.starts_with("github_pat_") {
            CredentialKind::PersonalFineGrained
        } else if raw.starts_with("ghs_") {
            CredentialKind::AppToken
        } else if raw.len() == 40 && raw.chars().all(|c| c.is_ascii_hexdigit()) {
            CredentialKind::Legacy
        } else {
            CredentialKind::Unknown
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Credential").field(&self.masked()).finish()
    }
}
