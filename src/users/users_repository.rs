use diesel::prelude::*;
use std::sync::Arc;

use crate::db::{get_connection, DbPool};
use crate::errors::Result;
use crate::schema::users;
use crate::schema::users::dsl::*;
use crate::users::UserError;

use super::users_model::{NewUser, User, UserDB};
use super::users_traits::UserRepositoryTrait;

/// Repository for managing directory records in the database
pub struct UserRepository {
    pool: Arc<DbPool>,
}

impl UserRepository {
    /// Creates a new UserRepository instance
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }
}

impl UserRepositoryTrait for UserRepository {
    /// Inserts a new directory record. A caller-supplied id is kept (hosts
    /// mirror identities from an external identity provider); otherwise one
    /// is generated.
    fn create(&self, new_user: NewUser) -> Result<User> {
        new_user.validate()?;

        let mut user_db: UserDB = new_user.into();
        if user_db.id.trim().is_empty() {
            user_db.id = uuid::Uuid::new_v4().to_string();
        }

        let mut conn = get_connection(&self.pool)?;

        diesel::insert_into(users::table)
            .values(&user_db)
            .execute(&mut conn)
            .map_err(UserError::from)?;

        Ok(user_db.into())
    }

    fn get_by_id(&self, user_id: &str) -> Result<User> {
        let mut conn = get_connection(&self.pool)?;

        let user = users
            .find(user_id)
            .first::<UserDB>(&mut conn)
            .map_err(|e| match e {
                diesel::result::Error::NotFound => {
                    UserError::NotFound(format!("User with id {} not found", user_id))
                }
                _ => UserError::DatabaseError(e.to_string()),
            })?;

        Ok(user.into())
    }

    fn get_by_email(&self, user_email: &str) -> Result<User> {
        let mut conn = get_connection(&self.pool)?;

        let user = users
            .filter(email.eq(user_email))
            .first::<UserDB>(&mut conn)
            .map_err(|e| match e {
                diesel::result::Error::NotFound => {
                    UserError::NotFound(format!("User with email {} not found", user_email))
                }
                _ => UserError::DatabaseError(e.to_string()),
            })?;

        Ok(user.into())
    }

    fn list(&self) -> Result<Vec<User>> {
        let mut conn = get_connection(&self.pool)?;

        let results = users
            .order(created_at.asc())
            .load::<UserDB>(&mut conn)
            .map_err(UserError::from)?;

        Ok(results.into_iter().map(User::from).collect())
    }

    /// Sets the verification flag. Writing the same value twice is a no-op,
    /// which keeps the verification-approval hook replay-safe.
    fn set_verified(&self, user_id: &str, verified: bool) -> Result<User> {
        let mut conn = get_connection(&self.pool)?;

        let affected = diesel::update(users.find(user_id))
            .set(account_verified.eq(verified))
            .execute(&mut conn)
            .map_err(UserError::from)?;

        if affected == 0 {
            return Err(
                UserError::NotFound(format!("User with id {} not found", user_id)).into(),
            );
        }

        self.get_by_id(user_id)
    }
}
