use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Row};
use tracing::instrument;

use crate::application::ports::{RepositoryError, SessionUser, SessionVerifier};
use crate::domain::UserId;

/// Bearer-token session lookup backed by the sessions table. Tokens are
/// issued by the auth collaborator; this side only resolves and expires.
pub struct PgSessionStore {
    pool: PgPool,
}

impl PgSessionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionVerifier for PgSessionStore {
    #[instrument(skip(self, token))]
    async fn verify(&self, token: &str) -> Result<Option<SessionUser>, RepositoryError> {
        let row = sqlx::query(
            "SELECT user_id, display_name FROM sessions WHERE token = $1 AND expires_at > $2",
        )
        .bind(token)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        match row {
            Some(row) => Ok(Some(SessionUser {
                user_id: UserId::from_uuid(
                    row.try_get("user_id")
                        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?,
                ),
                display_name: row
                    .try_get("display_name")
                    .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?,
            })),
            None => Ok(None),
        }
    }
}
