//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into
//! [`ModHubError`] via `#[from]`.

use crate::rule::ValidationIssue;

/// Base error for every fallible domain and application operation.
#[derive(Debug, thiserror::Error)]
pub enum ModHubError {
    #[error("validation error")]
    Validation(#[from] ValidationError),

    #[error("invalid condition")]
    InvalidCondition(#[from] InvalidConditionError),

    #[error("not found")]
    NotFound(#[from] NotFoundError),

    #[error("storage error")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// A domain invariant was violated.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("name must not be empty")]
    EmptyName,

    #[error("invalid {kind} id {value:?}")]
    InvalidId { kind: &'static str, value: String },

    #[error("rule rejected with {} issue(s)", issues.len())]
    Rejected { issues: Vec<ValidationIssue> },
}

/// A lookup by identifier found nothing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{entity} {id} not found")]
pub struct NotFoundError {
    pub entity: &'static str,
    pub id: String,
}

/// A condition definition cannot be turned into an evaluable condition.
///
/// Raised for unknown kinds or operations and for missing or ill-typed
/// required fields. A malformed condition never evaluates to `true`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidConditionError {
    #[error("unknown condition type {0:?}")]
    UnknownKind(String),

    #[error("unknown operation {operation:?} for {kind} condition")]
    UnknownOperation {
        kind: &'static str,
        operation: String,
    },

    #[error("{kind} condition is missing required field `{field}`")]
    MissingField {
        kind: &'static str,
        field: &'static str,
    },

    #[error("{kind} condition has an invalid `{field}`: {reason}")]
    InvalidField {
        kind: &'static str,
        field: &'static str,
        reason: String,
    },
}
