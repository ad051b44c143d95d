use chrono::NaiveDateTime;
use diesel::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::loans::LoanError;
use crate::utils::parse_stored_decimal;

/// Domain model representing a loan account.
///
/// `current_balance` is normally derived by replaying the loan's ledger
/// transactions on top of the principal; `LoanUpdate` is the administrative
/// override path that can set it directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Loan {
    pub id: String,
    pub user_id: String,
    pub account_number: String,
    pub principal_amount: Decimal,
    pub current_balance: Decimal,
    /// Monthly rate stored as a fraction in [0, 1); UI displays x100
    pub monthly_rate: Decimal,
    pub total_bonuses: Decimal,
    pub total_withdrawals: Decimal,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Input model for creating a new loan
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLoan {
    pub user_id: String,
    pub principal_amount: Decimal,
    pub monthly_rate: Decimal,
}

impl NewLoan {
    /// Validates the new loan data
    pub fn validate(&self) -> Result<(), LoanError> {
        if self.user_id.trim().is_empty() {
            return Err(LoanError::InvalidData(
                "User ID cannot be empty".to_string(),
            ));
        }
        if self.principal_amount.is_sign_negative() {
            return Err(LoanError::InvalidData(
                "Principal amount cannot be negative".to_string(),
            ));
        }
        if self.monthly_rate.is_sign_negative() || self.monthly_rate >= Decimal::ONE {
            return Err(LoanError::InvalidData(
                "Monthly rate must be a fraction in [0, 1)".to_string(),
            ));
        }
        Ok(())
    }
}

/// Partial-update payload for the administrative edit path.
///
/// Only fields present in the payload are written; omitted fields keep their
/// stored values, so stale client state cannot overwrite concurrent edits.
/// No recomputation or balance-sign check is performed here — this is the
/// documented escape hatch around the derived-balance invariant.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanUpdate {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub principal_amount: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_balance: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monthly_rate: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_bonuses: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_withdrawals: Option<Decimal>,
}

impl LoanUpdate {
    /// Validates the update payload
    pub fn validate(&self) -> Result<(), LoanError> {
        if self.id.trim().is_empty() {
            return Err(LoanError::InvalidData(
                "Loan ID is required for updates".to_string(),
            ));
        }
        if self.principal_amount.is_none()
            && self.current_balance.is_none()
            && self.monthly_rate.is_none()
            && self.total_bonuses.is_none()
            && self.total_withdrawals.is_none()
        {
            return Err(LoanError::InvalidData(
                "At least one field must be provided".to_string(),
            ));
        }
        if let Some(principal) = self.principal_amount {
            if principal.is_sign_negative() {
                return Err(LoanError::InvalidData(
                    "Principal amount cannot be negative".to_string(),
                ));
            }
        }
        if let Some(rate) = self.monthly_rate {
            if rate.is_sign_negative() || rate >= Decimal::ONE {
                return Err(LoanError::InvalidData(
                    "Monthly rate must be a fraction in [0, 1)".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Read-only aggregate view for the admin loan list
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanSummary {
    #[serde(flatten)]
    pub loan: Loan,
    pub transaction_count: i64,
    pub last_transaction_date: Option<NaiveDateTime>,
}

/// Database model for loans
#[derive(
    Queryable, Identifiable, Insertable, AsChangeset, Selectable, PartialEq, Debug, Clone,
)]
#[diesel(table_name = crate::schema::loans)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct LoanDB {
    pub id: String,
    pub user_id: String,
    pub account_number: String,
    pub principal_amount: String,
    pub current_balance: String,
    pub monthly_rate: String,
    pub total_bonuses: String,
    pub total_withdrawals: String,
    #[diesel(skip_insertion)]
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Changeset for the partial-update path; `None` fields are left untouched
#[derive(AsChangeset, Debug, Clone)]
#[diesel(table_name = crate::schema::loans)]
pub struct LoanFieldsChangeset {
    pub principal_amount: Option<String>,
    pub current_balance: Option<String>,
    pub monthly_rate: Option<String>,
    pub total_bonuses: Option<String>,
    pub total_withdrawals: Option<String>,
    pub updated_at: NaiveDateTime,
}

impl From<&LoanUpdate> for LoanFieldsChangeset {
    fn from(update: &LoanUpdate) -> Self {
        Self {
            principal_amount: update.principal_amount.map(|d| d.to_string()),
            current_balance: update.current_balance.map(|d| d.to_string()),
            monthly_rate: update.monthly_rate.map(|d| d.to_string()),
            total_bonuses: update.total_bonuses.map(|d| d.to_string()),
            total_withdrawals: update.total_withdrawals.map(|d| d.to_string()),
            updated_at: chrono::Utc::now().naive_utc(),
        }
    }
}

impl From<LoanDB> for Loan {
    fn from(db: LoanDB) -> Self {
        Self {
            id: db.id,
            user_id: db.user_id,
            account_number: db.account_number,
            principal_amount: parse_stored_decimal(&db.principal_amount, "principal_amount"),
            current_balance: parse_stored_decimal(&db.current_balance, "current_balance"),
            monthly_rate: parse_stored_decimal(&db.monthly_rate, "monthly_rate"),
            total_bonuses: parse_stored_decimal(&db.total_bonuses, "total_bonuses"),
            total_withdrawals: parse_stored_decimal(&db.total_withdrawals, "total_withdrawals"),
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

impl From<NewLoan> for LoanDB {
    fn from(domain: NewLoan) -> Self {
        let now = chrono::Utc::now().naive_utc();
        Self {
            id: String::new(),
            user_id: domain.user_id,
            account_number: String::new(),
            principal_amount: domain.principal_amount.to_string(),
            // Opening balance equals the disbursed principal
            current_balance: domain.principal_amount.to_string(),
            monthly_rate: domain.monthly_rate.to_string(),
            total_bonuses: "0".to_string(),
            total_withdrawals: "0".to_string(),
            created_at: now,
            updated_at: now,
        }
    }
}
