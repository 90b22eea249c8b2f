//! Renderer errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("No node for element {0}")]
    MissingNode(String),
    #[error("SVG output failed: {0}")]
    Format(#[from] std::fmt::Error),
}

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RenderError>;
