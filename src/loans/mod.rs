// Module declarations
pub(crate) mod loans_errors;
pub(crate) mod loans_model;
pub(crate) mod loans_repository;
pub(crate) mod loans_service;
pub(crate) mod loans_traits;

// Re-export the public interface
pub use loans_errors::LoanError;
pub use loans_model::{Loan, LoanDB, LoanSummary, LoanUpdate, NewLoan};
pub use loans_repository::LoanRepository;
pub use loans_service::LoanService;
pub use loans_traits::{LoanRepositoryTrait, LoanServiceTrait};
