use super::ledger_model::{LedgerTransaction, NewLedgerTransaction};
use crate::errors::Result;

/// Trait defining the contract for ledger repository operations.
pub trait LedgerRepositoryTrait: Send + Sync {
    fn add(&self, new_transaction: &NewLedgerTransaction) -> Result<LedgerTransaction>;
    fn list(&self, loan_id: &str, limit: i64) -> Result<Vec<LedgerTransaction>>;
}

/// Trait defining the contract for transaction-processor operations.
pub trait LedgerServiceTrait: Send + Sync {
    fn add_transaction(&self, new_transaction: NewLedgerTransaction)
        -> Result<LedgerTransaction>;
    fn list_transactions(
        &self,
        loan_id: &str,
        limit: Option<i64>,
    ) -> Result<Vec<LedgerTransaction>>;
}
