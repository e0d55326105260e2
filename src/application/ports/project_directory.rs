use async_trait::async_trait;

use crate::domain::{MembershipLookup, ProjectId, TaskSummary, UserId};

#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("lookup failed: {0}")]
    LookupFailed(String),
}

/// Read-side view of project membership and task assignment.
#[async_trait]
pub trait ProjectDirectory: Send + Sync {
    async fn membership(
        &self,
        project: ProjectId,
        user: UserId,
    ) -> Result<MembershipLookup, DirectoryError>;

    /// The caller's non-terminal assigned tasks, reduced to id and title,
    /// at most `limit` of them.
    async fn active_tasks(
        &self,
        project: ProjectId,
        user: UserId,
        limit: usize,
    ) -> Result<Vec<TaskSummary>, DirectoryError>;
}
