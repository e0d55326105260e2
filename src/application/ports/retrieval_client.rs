use async_trait::async_trait;

use crate::domain::{ProjectId, UserId};

#[derive(Debug, thiserror::Error)]
pub enum RetrievalError {
    #[error("request failed: {0}")]
    RequestFailed(String),
    #[error("retrieval service returned HTTP {0}")]
    BadStatus(u16),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// External retrieval service that grounds answers in project documents.
/// Every failure here is treated as enrichment loss, never a turn failure.
#[async_trait]
pub trait RetrievalClient: Send + Sync {
    async fn retrieve(
        &self,
        message: &str,
        project: ProjectId,
        user: UserId,
    ) -> Result<Vec<String>, RetrievalError>;
}
