use log::debug;
use std::sync::Arc;

use crate::constants::DEFAULT_TRANSACTION_LIMIT;
use crate::errors::Result;

use super::ledger_model::{LedgerTransaction, NewLedgerTransaction};
use super::ledger_traits::{LedgerRepositoryTrait, LedgerServiceTrait};

/// Service validating and applying ledger entries
pub struct LedgerService {
    ledger_repository: Arc<dyn LedgerRepositoryTrait>,
}

impl LedgerService {
    /// Creates a new LedgerService instance with an injected repository
    pub fn new(ledger_repository: Arc<dyn LedgerRepositoryTrait>) -> Self {
        Self { ledger_repository }
    }
}

impl LedgerServiceTrait for LedgerService {
    fn add_transaction(
        &self,
        new_transaction: NewLedgerTransaction,
    ) -> Result<LedgerTransaction> {
        new_transaction.validate()?;
        debug!(
            "Recording {} of {} against loan {}",
            new_transaction.transaction_type, new_transaction.amount, new_transaction.loan_id
        );
        self.ledger_repository.add(&new_transaction)
    }

    fn list_transactions(
        &self,
        loan_id: &str,
        limit: Option<i64>,
    ) -> Result<Vec<LedgerTransaction>> {
        self.ledger_repository
            .list(loan_id, limit.unwrap_or(DEFAULT_TRANSACTION_LIMIT))
    }
}
