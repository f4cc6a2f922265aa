//! Workflow error type: domain failures versus infrastructure failures.

use lostfound_core::error::CoreError;

#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    /// A business rule rejected the operation.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The database failed.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl WorkflowError {
    /// Domain errors are the caller's to fix (4xx); the rest are ours (5xx).
    pub fn is_domain(&self) -> bool {
        matches!(self, WorkflowError::Core(e) if !matches!(e, CoreError::Internal(_)))
    }
}

impl From<validator::ValidationErrors> for WorkflowError {
    fn from(errors: validator::ValidationErrors) -> Self {
        WorkflowError::Core(CoreError::Validation(errors.to_string()))
    }
}

/// Shorthand for a missing row.
pub(crate) fn not_found(entity: &'static str, id: lostfound_core::types::DbId) -> WorkflowError {
    WorkflowError::Core(CoreError::NotFound { entity, id })
}
