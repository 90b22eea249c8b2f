//! Board errors and removal diagnostics.

use thiserror::Error;

/// Errors surfaced to callers of the board API.
#[derive(Debug, Error)]
pub enum BoardError {
    #[error("Unknown element kind: {0}")]
    UnknownElementKind(String),
    #[error("Board container is missing")]
    MissingContainer,
    #[error("Element not found: {0}")]
    NotFound(String),
    #[error("Parent reference does not resolve to an element: {0}")]
    UnresolvedParent(String),
    #[error("Invalid parents for {kind}: {reason}")]
    InvalidParents { kind: String, reason: String },
    #[error("Element id already registered: {0}")]
    DuplicateId(String),
    #[error("Dependency token was issued by board {token_board}, not {board}")]
    ForeignToken { token_board: String, board: String },
    #[error("Expected a {expected} element, got {actual}")]
    KindMismatch { expected: String, actual: String },
    #[error("Options error: {0}")]
    Options(#[from] serde_json::Error),
}

impl BoardError {
    pub(crate) fn invalid_parents(kind: &str, reason: impl Into<String>) -> Self {
        Self::InvalidParents {
            kind: kind.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type for board operations.
pub type BoardResult<T> = Result<T, BoardError>;

/// A problem that was suppressed at the removal boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// A child set listed an id that no longer resolves.
    DanglingChild { parent: String, child: String },
    /// A group listed a member that no longer resolves.
    DanglingGroupMember { group: String, member: String },
    /// The renderer had no node for a removed element.
    RendererMissingNode(String),
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Diagnostic::DanglingChild { parent, child } => {
                write!(f, "{} lists unknown child {}", parent, child)
            }
            Diagnostic::DanglingGroupMember { group, member } => {
                write!(f, "group {} lists unknown member {}", group, member)
            }
            Diagnostic::RendererMissingNode(id) => write!(f, "renderer has no node for {}", id),
        }
    }
}
