//! Error types shared by every stage of the recommendation pipeline.
//!
//! There is one taxonomy for all external collaborators:
//! - `ServiceUnavailable` for transport or server failures
//! - `NotFound` when the collaborator has no matching entity
//! - `Unauthenticated` when no principal is signed in
//!
//! Clients map their transport errors into these variants so the orchestrator
//! only ever has to reason about three outcomes.

use thiserror::Error;

/// Errors that can occur while talking to an external collaborator
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    /// Transport failure, timeout, or a server-side error
    #[error("{service} is unavailable: {reason}")]
    ServiceUnavailable {
        service: &'static str,
        reason: String,
    },

    /// The collaborator answered, but has no such entity
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// No principal is currently signed in
    #[error("no authenticated principal")]
    Unauthenticated,

    /// A precondition on the input was violated before any call was made
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl PipelineError {
    /// Shorthand for a `ServiceUnavailable` error
    pub fn unavailable(service: &'static str, reason: impl ToString) -> Self {
        Self::ServiceUnavailable {
            service,
            reason: reason.to_string(),
        }
    }

    /// Shorthand for a `NotFound` error
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Convenience type alias for Results across the workspace
pub type Result<T> = std::result::Result<T, PipelineError>;
