use super::users_model::{NewUser, User};
use crate::errors::Result;

/// Trait defining the contract for directory repository operations.
pub trait UserRepositoryTrait: Send + Sync {
    fn create(&self, new_user: NewUser) -> Result<User>;
    fn get_by_id(&self, user_id: &str) -> Result<User>;
    fn get_by_email(&self, email: &str) -> Result<User>;
    fn list(&self) -> Result<Vec<User>>;
    fn set_verified(&self, user_id: &str, verified: bool) -> Result<User>;
}

/// Trait defining the contract for directory service operations.
pub trait UserServiceTrait: Send + Sync {
    fn create_user(&self, new_user: NewUser) -> Result<User>;
    fn get_user(&self, user_id: &str) -> Result<User>;
    fn get_user_by_email(&self, email: &str) -> Result<User>;
    fn list_users(&self) -> Result<Vec<User>>;
    fn set_verified(&self, user_id: &str, verified: bool) -> Result<User>;
    fn is_admin(&self, user_id: &str) -> Result<bool>;
}
