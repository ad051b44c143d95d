pub mod db;

pub mod gateway;
pub mod ledger;
pub mod loans;
pub mod users;
pub mod workflows;

pub mod constants;
pub mod errors;
pub mod schema;
pub mod utils;

pub use errors::{Error, Result};
