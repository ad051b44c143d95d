use log::debug;
use std::sync::Arc;

use crate::errors::Result;

use super::users_model::{NewUser, User};
use super::users_traits::{UserRepositoryTrait, UserServiceTrait};

/// Service for the account directory
pub struct UserService {
    user_repository: Arc<dyn UserRepositoryTrait>,
}

impl UserService {
    /// Creates a new UserService instance with an injected repository
    pub fn new(user_repository: Arc<dyn UserRepositoryTrait>) -> Self {
        Self { user_repository }
    }
}

impl UserServiceTrait for UserService {
    fn create_user(&self, new_user: NewUser) -> Result<User> {
        debug!("Creating directory record for email {}", new_user.email);
        self.user_repository.create(new_user)
    }

    fn get_user(&self, user_id: &str) -> Result<User> {
        self.user_repository.get_by_id(user_id)
    }

    fn get_user_by_email(&self, email: &str) -> Result<User> {
        self.user_repository.get_by_email(email)
    }

    fn list_users(&self) -> Result<Vec<User>> {
        self.user_repository.list()
    }

    fn set_verified(&self, user_id: &str, verified: bool) -> Result<User> {
        debug!("Setting account_verified={} for user {}", verified, user_id);
        self.user_repository.set_verified(user_id, verified)
    }

    fn is_admin(&self, user_id: &str) -> Result<bool> {
        Ok(self.user_repository.get_by_id(user_id)?.role.is_admin())
    }
}
