/// Transaction types
///
/// Each constant represents one of the supported ledger entry categories.

/// Initial disbursement written when a loan is created. Audit record only:
/// the principal is already part of the opening balance, so it applies no
/// balance delta.
pub const TRANSACTION_TYPE_LOAN: &str = "LOAN";

/// Recurring interest payment credited to the loan. Increases the balance.
pub const TRANSACTION_TYPE_MONTHLY_PAYMENT: &str = "MONTHLY_PAYMENT";

/// Bonus credited to the loan. Increases the balance and the bonus total.
pub const TRANSACTION_TYPE_BONUS: &str = "BONUS";

/// Funds paid out to the owner. Decreases the balance and increases the
/// withdrawal total.
pub const TRANSACTION_TYPE_WITHDRAWAL: &str = "WITHDRAWAL";
