use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::users::UserError;

/// Role granted to a directory record. Only admins may drive workflow
/// transitions and ledger mutations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "USER",
            Role::Admin => "ADMIN",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Role {
    type Err = UserError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "USER" => Ok(Role::User),
            "ADMIN" => Ok(Role::Admin),
            other => Err(UserError::InvalidData(format!("Unknown role: {}", other))),
        }
    }
}

/// Domain model representing a user in the account directory
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub account_verified: bool,
    pub created_at: NaiveDateTime,
}

/// Input model for creating a new directory record
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    /// Externally-assigned identity id; generated when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub email: String,
    pub name: String,
    #[serde(default)]
    pub role: Role,
}

impl NewUser {
    /// Validates the new user data
    pub fn validate(&self) -> Result<(), UserError> {
        if self.email.trim().is_empty() || !self.email.contains('@') {
            return Err(UserError::InvalidData(
                "A valid email address is required".to_string(),
            ));
        }
        if self.name.trim().is_empty() {
            return Err(UserError::InvalidData(
                "User name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Database model for users
#[derive(
    Queryable, Identifiable, Insertable, AsChangeset, Selectable, PartialEq, Debug, Clone,
)]
#[diesel(table_name = crate::schema::users)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct UserDB {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: String,
    pub account_verified: bool,
    #[diesel(skip_insertion)]
    pub created_at: NaiveDateTime,
}

impl From<UserDB> for User {
    fn from(db: UserDB) -> Self {
        Self {
            id: db.id,
            email: db.email,
            name: db.name,
            // Unknown roles in storage are treated as unprivileged
            role: Role::from_str(&db.role).unwrap_or(Role::User),
            account_verified: db.account_verified,
            created_at: db.created_at,
        }
    }
}

impl From<NewUser> for UserDB {
    fn from(domain: NewUser) -> Self {
        Self {
            id: domain.id.unwrap_or_default(),
            email: domain.email,
            name: domain.name,
            role: domain.role.as_str().to_string(),
            account_verified: false,
            created_at: chrono::Utc::now().naive_utc(),
        }
    }
}
