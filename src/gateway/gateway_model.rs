use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::errors::Error;
use crate::ledger::LedgerError;
use crate::loans::LoanError;
use crate::users::{Role, UserError};
use crate::workflows::WorkflowError;

/// Identity resolved from a boundary token
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthContext {
    pub user_id: String,
    pub role: Role,
}

impl AuthContext {
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

/// Boundary error: a specific error kind plus the HTTP status an HTTP host
/// maps it to. A known kind is never collapsed into a generic 500.
#[derive(Debug, Error, Serialize)]
#[error("{code}: {message}")]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    pub status: u16,
    pub code: &'static str,
    pub message: String,
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

impl ApiError {
    pub fn new(status: u16, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(403, "AUTHORIZATION_ERROR", message)
    }

    /// JSON body an HTTP host can return as-is
    pub fn body(&self) -> serde_json::Value {
        serde_json::json!({
            "error": {
                "code": self.code,
                "message": self.message,
            }
        })
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        let message = err.to_string();
        match &err {
            Error::Validation(_) => ApiError::new(400, "VALIDATION_ERROR", message),
            Error::Authorization(_) => ApiError::new(403, "AUTHORIZATION_ERROR", message),
            Error::Database(_) => ApiError::new(503, "STORE_UNAVAILABLE", message),

            Error::User(e) => match e {
                UserError::NotFound(_) => ApiError::new(404, "NOT_FOUND", message),
                UserError::DuplicateEmail(_) => ApiError::new(409, "CONFLICT", message),
                UserError::InvalidData(_) => ApiError::new(400, "VALIDATION_ERROR", message),
                UserError::DatabaseError(_) => ApiError::new(503, "STORE_UNAVAILABLE", message),
            },

            Error::Loan(e) => match e {
                LoanError::NotFound(_) => ApiError::new(404, "NOT_FOUND", message),
                LoanError::DuplicateLoan(_) => ApiError::new(409, "CONFLICT", message),
                LoanError::InvalidData(_) => ApiError::new(400, "VALIDATION_ERROR", message),
                LoanError::DatabaseError(_) => ApiError::new(503, "STORE_UNAVAILABLE", message),
            },

            Error::Ledger(e) => match e {
                LedgerError::NotFound(_) => ApiError::new(404, "NOT_FOUND", message),
                LedgerError::InsufficientFunds(_) => {
                    ApiError::new(400, "INSUFFICIENT_FUNDS", message)
                }
                LedgerError::InvalidData(_) => ApiError::new(400, "VALIDATION_ERROR", message),
                LedgerError::DatabaseError(_) => ApiError::new(503, "STORE_UNAVAILABLE", message),
            },

            Error::Workflow(e) => match e {
                WorkflowError::NotFound(_) => ApiError::new(404, "NOT_FOUND", message),
                WorkflowError::InvalidTransition { .. } => {
                    ApiError::new(409, "INVALID_TRANSITION", message)
                }
                WorkflowError::DuplicatePending(_) => ApiError::new(409, "CONFLICT", message),
                WorkflowError::InvalidData(_) => ApiError::new(400, "VALIDATION_ERROR", message),
                WorkflowError::DatabaseError(_) => {
                    ApiError::new(503, "STORE_UNAVAILABLE", message)
                }
            },
        }
    }
}
