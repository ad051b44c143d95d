use chrono::NaiveDateTime;
use diesel::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::ledger::ledger_constants::*;
use crate::ledger::LedgerError;
use crate::utils::parse_stored_decimal;

/// Kind of a ledger entry. Amounts are always stored positive; the sign of
/// the balance effect is implied by the type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    Loan,
    MonthlyPayment,
    Bonus,
    Withdrawal,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Loan => TRANSACTION_TYPE_LOAN,
            TransactionType::MonthlyPayment => TRANSACTION_TYPE_MONTHLY_PAYMENT,
            TransactionType::Bonus => TRANSACTION_TYPE_BONUS,
            TransactionType::Withdrawal => TRANSACTION_TYPE_WITHDRAWAL,
        }
    }

    /// Signed effect of an entry of this type on the loan balance.
    /// `LOAN` rows are disbursement audit records and apply no delta.
    pub fn balance_delta(&self, amount: Decimal) -> Decimal {
        match self {
            TransactionType::Loan => Decimal::ZERO,
            TransactionType::MonthlyPayment | TransactionType::Bonus => amount,
            TransactionType::Withdrawal => -amount,
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            TRANSACTION_TYPE_LOAN => Ok(TransactionType::Loan),
            TRANSACTION_TYPE_MONTHLY_PAYMENT => Ok(TransactionType::MonthlyPayment),
            TRANSACTION_TYPE_BONUS => Ok(TransactionType::Bonus),
            TRANSACTION_TYPE_WITHDRAWAL => Ok(TransactionType::Withdrawal),
            other => Err(LedgerError::InvalidData(format!(
                "Unknown transaction type: {}",
                other
            ))),
        }
    }
}

/// Domain model representing one immutable ledger entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerTransaction {
    pub id: String,
    pub loan_id: String,
    pub transaction_type: TransactionType,
    pub amount: Decimal,
    pub description: Option<String>,
    /// Stored as a fraction (0.005 = 0.5%); only meaningful for `BONUS`
    pub bonus_percentage: Option<Decimal>,
    pub transaction_date: NaiveDateTime,
    pub created_at: NaiveDateTime,
}

/// Input model for recording a new ledger entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLedgerTransaction {
    pub loan_id: String,
    pub transaction_type: TransactionType,
    pub amount: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bonus_percentage: Option<Decimal>,
    /// Caller-supplied; backdating is allowed
    pub transaction_date: NaiveDateTime,
}

impl NewLedgerTransaction {
    /// Validates the new entry data
    pub fn validate(&self) -> Result<(), LedgerError> {
        if self.loan_id.trim().is_empty() {
            return Err(LedgerError::InvalidData(
                "Loan ID cannot be empty".to_string(),
            ));
        }
        if self.amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidData(
                "Amount must be greater than zero".to_string(),
            ));
        }
        if let Some(pct) = self.bonus_percentage {
            if self.transaction_type != TransactionType::Bonus {
                return Err(LedgerError::InvalidData(
                    "Bonus percentage is only valid for BONUS transactions".to_string(),
                ));
            }
            if pct.is_sign_negative() || pct >= Decimal::ONE {
                return Err(LedgerError::InvalidData(
                    "Bonus percentage must be a fraction in [0, 1)".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Database model for ledger entries
#[derive(Queryable, Identifiable, Insertable, Selectable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::ledger_transactions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct LedgerTransactionDB {
    pub id: String,
    pub loan_id: String,
    pub transaction_type: String,
    pub amount: String,
    pub description: Option<String>,
    pub bonus_percentage: Option<String>,
    pub transaction_date: NaiveDateTime,
    pub created_at: NaiveDateTime,
}

impl From<LedgerTransactionDB> for LedgerTransaction {
    fn from(db: LedgerTransactionDB) -> Self {
        Self {
            id: db.id,
            // Rows with an unknown stored type should never exist; surface
            // them as disbursement records rather than invent a delta
            transaction_type: TransactionType::from_str(&db.transaction_type)
                .unwrap_or(TransactionType::Loan),
            loan_id: db.loan_id,
            amount: parse_stored_decimal(&db.amount, "amount"),
            description: db.description,
            bonus_percentage: db
                .bonus_percentage
                .as_deref()
                .map(|p| parse_stored_decimal(p, "bonus_percentage")),
            transaction_date: db.transaction_date,
            created_at: db.created_at,
        }
    }
}

impl From<&NewLedgerTransaction> for LedgerTransactionDB {
    fn from(domain: &NewLedgerTransaction) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            loan_id: domain.loan_id.clone(),
            transaction_type: domain.transaction_type.as_str().to_string(),
            amount: domain.amount.to_string(),
            description: domain.description.clone(),
            bonus_percentage: domain.bonus_percentage.map(|p| p.to_string()),
            transaction_date: domain.transaction_date,
            created_at: chrono::Utc::now().naive_utc(),
        }
    }
}
