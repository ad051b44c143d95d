// Module declarations
pub(crate) mod gateway_cache;
pub(crate) mod gateway_model;
pub(crate) mod gateway_service;
pub(crate) mod gateway_traits;

// Re-export the public interface
pub use gateway_cache::TtlCache;
pub use gateway_model::{ApiError, ApiResult, AuthContext};
pub use gateway_service::Gateway;
pub use gateway_traits::Authenticator;
