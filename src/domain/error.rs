//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Domain errors represent violations of the site hierarchy rules.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("site has no name (child #{position} of {parent})")]
    EmptyName { parent: String, position: usize },

    #[error("duplicate site name: {0}")]
    DuplicateName(String),

    #[error("unknown parent for site: {0}")]
    UnknownParent(String),

    #[error("parent site not found: {parent} (referenced by {site})")]
    MissingParentSite { site: String, parent: String },

    #[error("cycle detected in hierarchy: {0}")]
    CycleDetected(String),
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
