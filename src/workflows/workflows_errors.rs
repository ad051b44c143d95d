use diesel::result::Error as DieselError;
use thiserror::Error;

use super::workflows_model::{RequestKind, RequestStatus};

/// Custom error type for workflow-engine operations
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid data: {0}")]
    InvalidData(String),
    #[error("{kind} request cannot transition from {from} to {to}")]
    InvalidTransition {
        kind: RequestKind,
        from: RequestStatus,
        to: RequestStatus,
    },
    #[error("Duplicate request: {0}")]
    DuplicatePending(String),
}

impl From<DieselError> for WorkflowError {
    fn from(err: DieselError) -> Self {
        match err {
            DieselError::NotFound => WorkflowError::NotFound("Record not found".to_string()),
            _ => WorkflowError::DatabaseError(err.to_string()),
        }
    }
}
