use async_trait::async_trait;

use crate::domain::UserId;

use super::RepositoryError;

#[derive(Debug, Clone)]
pub struct SessionUser {
    pub user_id: UserId,
    pub display_name: String,
}

/// Resolves a bearer token to the signed-in user. Session issuance lives
/// elsewhere; this side only checks.
#[async_trait]
pub trait SessionVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<Option<SessionUser>, RepositoryError>;
}
