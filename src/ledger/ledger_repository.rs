use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use rust_decimal::Decimal;
use std::sync::Arc;

use crate::db::{get_connection, DbPool};
use crate::errors::{Error, Result};
use crate::ledger::LedgerError;
use crate::loans::loans_model::LoanDB;
use crate::schema::{ledger_transactions, loans};
use crate::utils::parse_stored_decimal;

use super::ledger_model::{
    LedgerTransaction, LedgerTransactionDB, NewLedgerTransaction, TransactionType,
};
use super::ledger_traits::LedgerRepositoryTrait;

/// Inserts one ledger row on an existing connection. Used both by the
/// processor below and by loan creation, which writes the disbursement row
/// inside the loan-insert transaction.
pub(crate) fn insert_transaction_row(
    conn: &mut SqliteConnection,
    row: &LedgerTransactionDB,
) -> QueryResult<usize> {
    diesel::insert_into(ledger_transactions::table)
        .values(row)
        .execute(conn)
}

/// Applies one entry to its loan on an existing connection: balance guard,
/// loan aggregate update and row insert. Callers own the enclosing
/// transaction, so a failure here rolls back whatever they committed with it.
pub(crate) fn apply_transaction(
    conn: &mut SqliteConnection,
    new_transaction: &NewLedgerTransaction,
) -> Result<LedgerTransaction> {
    let loan_db = loans::table
        .find(&new_transaction.loan_id)
        .first::<LoanDB>(conn)
        .map_err(|e| match e {
            diesel::result::Error::NotFound => Error::from(LedgerError::NotFound(format!(
                "Loan with id {} not found",
                new_transaction.loan_id
            ))),
            _ => Error::from(LedgerError::DatabaseError(e.to_string())),
        })?;

    let balance = parse_stored_decimal(&loan_db.current_balance, "current_balance");
    let bonuses = parse_stored_decimal(&loan_db.total_bonuses, "total_bonuses");
    let withdrawals = parse_stored_decimal(&loan_db.total_withdrawals, "total_withdrawals");

    let new_balance = balance
        + new_transaction
            .transaction_type
            .balance_delta(new_transaction.amount);

    if new_transaction.transaction_type == TransactionType::Withdrawal
        && new_balance < Decimal::ZERO
    {
        return Err(LedgerError::InsufficientFunds(format!(
            "Withdrawal of {} exceeds current balance {}",
            new_transaction.amount, balance
        ))
        .into());
    }

    let new_bonuses = match new_transaction.transaction_type {
        TransactionType::Bonus => bonuses + new_transaction.amount,
        _ => bonuses,
    };
    let new_withdrawals = match new_transaction.transaction_type {
        TransactionType::Withdrawal => withdrawals + new_transaction.amount,
        _ => withdrawals,
    };

    diesel::update(loans::table.find(&new_transaction.loan_id))
        .set((
            loans::current_balance.eq(new_balance.to_string()),
            loans::total_bonuses.eq(new_bonuses.to_string()),
            loans::total_withdrawals.eq(new_withdrawals.to_string()),
            loans::updated_at.eq(chrono::Utc::now().naive_utc()),
        ))
        .execute(conn)
        .map_err(LedgerError::from)?;

    let row = LedgerTransactionDB::from(new_transaction);
    insert_transaction_row(conn, &row).map_err(LedgerError::from)?;

    Ok(row.into())
}

/// Repository for recording and reading ledger entries
pub struct LedgerRepository {
    pool: Arc<DbPool>,
}

impl LedgerRepository {
    /// Creates a new LedgerRepository instance
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }
}

impl LedgerRepositoryTrait for LedgerRepository {
    /// Applies a new entry to its loan.
    ///
    /// The row insert and the loan aggregate update commit together inside
    /// one IMMEDIATE transaction: the write lock is taken before the balance
    /// is read, so two concurrent adds on the same loan serialize and the
    /// read-modify-write never loses an update.
    fn add(&self, new_transaction: &NewLedgerTransaction) -> Result<LedgerTransaction> {
        let mut conn = get_connection(&self.pool)?;

        conn.immediate_transaction::<_, Error, _>(|conn| {
            apply_transaction(conn, new_transaction)
        })
    }

    fn list(&self, loan_id: &str, limit: i64) -> Result<Vec<LedgerTransaction>> {
        let mut conn = get_connection(&self.pool)?;

        let results = ledger_transactions::table
            .filter(ledger_transactions::loan_id.eq(loan_id))
            .order((
                ledger_transactions::transaction_date.desc(),
                ledger_transactions::created_at.desc(),
            ))
            .limit(limit)
            .load::<LedgerTransactionDB>(&mut conn)
            .map_err(LedgerError::from)?;

        Ok(results.into_iter().map(LedgerTransaction::from).collect())
    }
}
