//! Branch candidates and selection.

use super::RepositoryError;
use bstr::ByteSlice;

/// Conventional default branch names, in the order they are tried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchCandidate {
    Main,
    Master,
    Develop,
    Dev,
    GhPages,
}

impl BranchCandidate {
    /// Every candidate in priority order.
    pub const ALL: [Self; 5] = [
        Self::Main,
        Self::Master,
        Self::Develop,
        Self::Dev,
        Self::GhPages,
    ];

    /// Returns the branch name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Main => "main",
            Self::Master => "master",
            Self::Develop => "develop",
            Self::Dev => "dev",
            Self::GhPages => "gh-pages",
        }
    }
}

/// Which branch(es) a retrieval should try.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum BranchSelection {
    /// Walk [`BranchCandidate::ALL`].
    #[default]
    Auto,
    /// Try only this branch.
    Explicit(String),
}

impl BranchSelection {
    /// Builds a selection from an optional caller-supplied branch name.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::InvalidBranch`] if the name is not a valid
    /// partial git reference.
    pub fn from_option(branch: Option<&str>) -> Result<Self, RepositoryError> {
        match branch.map(str::trim).filter(|b| !b.is_empty()) {
            None => Ok(Self::Auto),
            Some(branch) => {
                gix_validate::reference::name_partial(branch.as_bytes().as_bstr()).map_err(
                    |e| RepositoryError::InvalidBranch {
                        branch: branch.to_string(),
                        message: e.to_string(),
                    },
                )?;
                Ok(Self::Explicit(branch.to_string()))
            }
        }
    }

    /// Branch names to try, in order.
    #[must_use]
    pub fn candidates(&self) -> Vec<String> {
        match self {
            Self::Auto => BranchCandidate::ALL
                .iter()
                .map(|c| c.as_str().to_string())
                .collect(),
            Self::Explicit(branch) => vec![branch.clone()],
        }
    }
}
