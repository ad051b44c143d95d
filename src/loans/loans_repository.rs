use chrono::NaiveDateTime;
use diesel::dsl::{count_star, max};
use diesel::prelude::*;
use rand::Rng;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;

use crate::constants::ACCOUNT_NUMBER_DIGITS;
use crate::db::{get_connection, DbPool};
use crate::errors::{Error, Result};
use crate::ledger::ledger_model::{LedgerTransactionDB, NewLedgerTransaction, TransactionType};
use crate::ledger::ledger_repository::insert_transaction_row;
use crate::loans::LoanError;
use crate::schema::{ledger_transactions, loans};

use super::loans_model::{Loan, LoanDB, LoanFieldsChangeset, LoanSummary, LoanUpdate, NewLoan};
use super::loans_traits::LoanRepositoryTrait;

/// Repository for managing loan accounts in the database
pub struct LoanRepository {
    pool: Arc<DbPool>,
}

impl LoanRepository {
    /// Creates a new LoanRepository instance
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }
}

/// Generates an unguessable numeric account number. Uniqueness is enforced
/// by the column constraint; collisions are retried by the caller.
fn generate_account_number() -> String {
    let mut rng = rand::thread_rng();
    (0..ACCOUNT_NUMBER_DIGITS)
        .map(|_| char::from(b'0' + rng.gen_range(0..10)))
        .collect()
}

impl LoanRepositoryTrait for LoanRepository {
    /// Creates the loan row and its opening disbursement entry in one
    /// transaction. Fails with a duplicate-loan error if the user already
    /// has a loan (one loan per user).
    fn create(&self, new_loan: NewLoan) -> Result<Loan> {
        new_loan.validate()?;

        let mut conn = get_connection(&self.pool)?;

        conn.immediate_transaction::<_, Error, _>(|conn| {
            let existing = loans::table
                .filter(loans::user_id.eq(&new_loan.user_id))
                .first::<LoanDB>(conn)
                .optional()
                .map_err(LoanError::from)?;
            if existing.is_some() {
                return Err(LoanError::DuplicateLoan(format!(
                    "User {} already has a loan",
                    new_loan.user_id
                ))
                .into());
            }

            let principal = new_loan.principal_amount;
            let mut loan_db: LoanDB = new_loan.into();
            loan_db.id = uuid::Uuid::new_v4().to_string();
            loan_db.account_number = generate_account_number();

            // A random-collision retry on the account number; the unique
            // constraint is the arbiter
            let mut attempts = 0;
            loop {
                match diesel::insert_into(loans::table)
                    .values(&loan_db)
                    .execute(conn)
                {
                    Ok(_) => break,
                    Err(diesel::result::Error::DatabaseError(
                        diesel::result::DatabaseErrorKind::UniqueViolation,
                        info,
                    )) if attempts < 3 && info.message().contains("account_number") => {
                        attempts += 1;
                        loan_db.account_number = generate_account_number();
                    }
                    Err(e) => return Err(LoanError::from(e).into()),
                }
            }

            if principal > Decimal::ZERO {
                let disbursement = NewLedgerTransaction {
                    loan_id: loan_db.id.clone(),
                    transaction_type: TransactionType::Loan,
                    amount: principal,
                    description: Some("Initial disbursement".to_string()),
                    bonus_percentage: None,
                    transaction_date: loan_db.created_at,
                };
                insert_transaction_row(conn, &LedgerTransactionDB::from(&disbursement))
                    .map_err(LoanError::from)?;
            }

            Ok(loan_db.into())
        })
    }

    fn get_by_id(&self, loan_id: &str) -> Result<Loan> {
        let mut conn = get_connection(&self.pool)?;

        let loan = loans::table
            .find(loan_id)
            .first::<LoanDB>(&mut conn)
            .map_err(|e| match e {
                diesel::result::Error::NotFound => {
                    LoanError::NotFound(format!("Loan with id {} not found", loan_id))
                }
                _ => LoanError::DatabaseError(e.to_string()),
            })?;

        Ok(loan.into())
    }

    fn get_by_user(&self, user_id: &str) -> Result<Loan> {
        let mut conn = get_connection(&self.pool)?;

        let loan = loans::table
            .filter(loans::user_id.eq(user_id))
            .first::<LoanDB>(&mut conn)
            .map_err(|e| match e {
                diesel::result::Error::NotFound => {
                    LoanError::NotFound(format!("No loan found for user {}", user_id))
                }
                _ => LoanError::DatabaseError(e.to_string()),
            })?;

        Ok(loan.into())
    }

    /// Direct overwrite of the provided fields only. No recomputation and no
    /// balance-sign check: the administrative escape hatch. The RETURNING
    /// clause hands back the row this statement wrote, not a re-read that a
    /// concurrent writer could have moved on.
    fn update_fields(&self, update: &LoanUpdate) -> Result<Loan> {
        update.validate()?;

        let mut conn = get_connection(&self.pool)?;

        let changeset = LoanFieldsChangeset::from(update);
        let updated = diesel::update(loans::table.find(&update.id))
            .set(&changeset)
            .get_result::<LoanDB>(&mut conn)
            .map_err(|e| match e {
                diesel::result::Error::NotFound => {
                    LoanError::NotFound(format!("Loan with id {} not found", update.id))
                }
                _ => LoanError::from(e),
            })?;

        Ok(updated.into())
    }

    /// Deletes the loan and all of its ledger entries in one transaction.
    /// Irreversible; callers own any confirmation step.
    fn delete(&self, loan_id: &str) -> Result<usize> {
        let mut conn = get_connection(&self.pool)?;

        conn.immediate_transaction::<_, Error, _>(|conn| {
            diesel::delete(
                ledger_transactions::table.filter(ledger_transactions::loan_id.eq(loan_id)),
            )
            .execute(conn)
            .map_err(LoanError::from)?;

            let affected = diesel::delete(loans::table.find(loan_id))
                .execute(conn)
                .map_err(LoanError::from)?;

            if affected == 0 {
                return Err(
                    LoanError::NotFound(format!("Loan with id {} not found", loan_id)).into(),
                );
            }

            Ok(affected)
        })
    }

    fn list_with_summary(&self) -> Result<Vec<LoanSummary>> {
        let mut conn = get_connection(&self.pool)?;

        let all_loans = loans::table
            .order(loans::created_at.asc())
            .load::<LoanDB>(&mut conn)
            .map_err(LoanError::from)?;

        let aggregates: Vec<(String, i64, Option<NaiveDateTime>)> = ledger_transactions::table
            .group_by(ledger_transactions::loan_id)
            .select((
                ledger_transactions::loan_id,
                count_star(),
                max(ledger_transactions::transaction_date),
            ))
            .load(&mut conn)
            .map_err(LoanError::from)?;

        let mut by_loan: HashMap<String, (i64, Option<NaiveDateTime>)> = aggregates
            .into_iter()
            .map(|(loan_id, count, last)| (loan_id, (count, last)))
            .collect();

        Ok(all_loans
            .into_iter()
            .map(|db| {
                let (transaction_count, last_transaction_date) =
                    by_loan.remove(&db.id).unwrap_or((0, None));
                LoanSummary {
                    loan: db.into(),
                    transaction_count,
                    last_transaction_date,
                }
            })
            .collect())
    }
}
