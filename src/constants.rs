/// Number of digits in a generated loan account number
pub const ACCOUNT_NUMBER_DIGITS: usize = 12;

/// TTL for gateway read caches (user detail, loan list)
pub const READ_CACHE_TTL_SECS: u64 = 300;

/// Upper bound on cached read entries
pub const READ_CACHE_MAX_ENTRIES: usize = 10_000;

/// Default page size for transaction listings when the caller gives no limit
pub const DEFAULT_TRANSACTION_LIMIT: i64 = 100;
