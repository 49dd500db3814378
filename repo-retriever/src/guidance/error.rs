//! Guidance rendering error types.

use thiserror::Error;

/// Errors that can occur during guidance rendering.
#[derive(Debug, Error)]
pub enum GuidanceError {
    /// Handlebars render error.
    #[error("Guidance render error: {0}")]
    RenderError(#[from] handlebars::RenderError),
}
