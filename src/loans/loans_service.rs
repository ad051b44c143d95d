use log::{debug, warn};
use std::sync::Arc;

use crate::errors::Result;

use super::loans_model::{Loan, LoanSummary, LoanUpdate, NewLoan};
use super::loans_traits::{LoanRepositoryTrait, LoanServiceTrait};

/// Service for managing loan accounts
pub struct LoanService {
    loan_repository: Arc<dyn LoanRepositoryTrait>,
}

impl LoanService {
    /// Creates a new LoanService instance with an injected repository
    pub fn new(loan_repository: Arc<dyn LoanRepositoryTrait>) -> Self {
        Self { loan_repository }
    }
}

impl LoanServiceTrait for LoanService {
    fn create_loan(&self, new_loan: NewLoan) -> Result<Loan> {
        debug!(
            "Creating loan for user {} with principal {}",
            new_loan.user_id, new_loan.principal_amount
        );
        self.loan_repository.create(new_loan)
    }

    fn get_loan(&self, loan_id: &str) -> Result<Loan> {
        self.loan_repository.get_by_id(loan_id)
    }

    fn get_loan_by_user(&self, user_id: &str) -> Result<Loan> {
        self.loan_repository.get_by_user(user_id)
    }

    fn update_loan_fields(&self, update: LoanUpdate) -> Result<Loan> {
        if update.current_balance.is_some() {
            // Direct balance overwrite bypasses the derived-balance invariant
            warn!(
                "Administrative balance overwrite on loan {}: {:?}",
                update.id, update.current_balance
            );
        }
        self.loan_repository.update_fields(&update)
    }

    fn delete_loan(&self, loan_id: &str) -> Result<()> {
        debug!("Deleting loan {} and its transactions", loan_id);
        self.loan_repository.delete(loan_id)?;
        Ok(())
    }

    fn list_loans_with_summary(&self) -> Result<Vec<LoanSummary>> {
        self.loan_repository.list_with_summary()
    }
}
