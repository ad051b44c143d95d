use diesel::result::DatabaseErrorKind;
use diesel::result::Error as DieselError;
use thiserror::Error;

/// Custom error type for ledger-store operations
#[derive(Debug, Error)]
pub enum LoanError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid data: {0}")]
    InvalidData(String),
    #[error("Duplicate loan: {0}")]
    DuplicateLoan(String),
}

impl From<DieselError> for LoanError {
    fn from(err: DieselError) -> Self {
        match err {
            DieselError::NotFound => LoanError::NotFound("Record not found".to_string()),
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                LoanError::DuplicateLoan(info.message().to_string())
            }
            _ => LoanError::DatabaseError(err.to_string()),
        }
    }
}
