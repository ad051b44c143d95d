use async_trait::async_trait;

use super::gateway_model::AuthContext;
use crate::errors::Result;

/// External authentication collaborator. The core never sees credentials;
/// it receives an opaque token and gets back an identity and role.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self, token: &str) -> Result<AuthContext>;
}
