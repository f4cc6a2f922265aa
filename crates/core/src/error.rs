use crate::types::DbId;

/// Domain-level errors shared by every layer.
///
/// All variants are expected, user-facing outcomes except [`CoreError::Internal`].
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The entity exists but its current status does not permit the operation.
    #[error("{entity} {id} is not available (status: {status})")]
    Unavailable {
        entity: &'static str,
        id: DbId,
        status: &'static str,
    },

    #[error("Invalid {entity} status transition: {from} -> {to}")]
    InvalidTransition {
        entity: &'static str,
        from: &'static str,
        to: &'static str,
    },

    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
