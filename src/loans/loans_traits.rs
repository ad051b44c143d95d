use super::loans_model::{Loan, LoanSummary, LoanUpdate, NewLoan};
use crate::errors::Result;

/// Trait defining the contract for loan repository operations.
pub trait LoanRepositoryTrait: Send + Sync {
    fn create(&self, new_loan: NewLoan) -> Result<Loan>;
    fn get_by_id(&self, loan_id: &str) -> Result<Loan>;
    fn get_by_user(&self, user_id: &str) -> Result<Loan>;
    fn update_fields(&self, update: &LoanUpdate) -> Result<Loan>;
    fn delete(&self, loan_id: &str) -> Result<usize>;
    fn list_with_summary(&self) -> Result<Vec<LoanSummary>>;
}

/// Trait defining the contract for ledger-store service operations.
pub trait LoanServiceTrait: Send + Sync {
    fn create_loan(&self, new_loan: NewLoan) -> Result<Loan>;
    fn get_loan(&self, loan_id: &str) -> Result<Loan>;
    fn get_loan_by_user(&self, user_id: &str) -> Result<Loan>;
    fn update_loan_fields(&self, update: LoanUpdate) -> Result<Loan>;
    fn delete_loan(&self, loan_id: &str) -> Result<()>;
    fn list_loans_with_summary(&self) -> Result<Vec<LoanSummary>>;
}
