use async_trait::async_trait;
use sqlx::{PgPool, Row};
use tracing::instrument;

use crate::application::ports::{DirectoryError, ProjectDirectory};
use crate::domain::{MembershipLookup, ProjectId, TaskStatus, TaskSummary, UserId};

pub struct PgProjectDirectory {
    pool: PgPool,
}

impl PgProjectDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProjectDirectory for PgProjectDirectory {
    #[instrument(skip(self), fields(project_id = %project.as_uuid(), user_id = %user.as_uuid()))]
    async fn membership(
        &self,
        project: ProjectId,
        user: UserId,
    ) -> Result<MembershipLookup, DirectoryError> {
        let row = sqlx::query(
            "SELECT role FROM project_members WHERE project_id = $1 AND user_id = $2",
        )
        .bind(project.as_uuid())
        .bind(user.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DirectoryError::LookupFailed(e.to_string()))?;

        match row {
            Some(row) => {
                let role: String = row
                    .try_get("role")
                    .map_err(|e| DirectoryError::LookupFailed(e.to_string()))?;
                Ok(MembershipLookup::Member { role })
            }
            None => Ok(MembershipLookup::NotFound),
        }
    }

    #[instrument(skip(self), fields(project_id = %project.as_uuid(), user_id = %user.as_uuid()))]
    async fn active_tasks(
        &self,
        project: ProjectId,
        user: UserId,
        limit: usize,
    ) -> Result<Vec<TaskSummary>, DirectoryError> {
        let rows = sqlx::query(
            r#"
            SELECT id, title
            FROM tasks
            WHERE project_id = $1 AND assignee_id = $2 AND status NOT IN ($3, $4)
            ORDER BY id
            LIMIT $5
            "#,
        )
        .bind(project.as_uuid())
        .bind(user.as_uuid())
        .bind(TaskStatus::Done.as_str())
        .bind(TaskStatus::Canceled.as_str())
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DirectoryError::LookupFailed(e.to_string()))?;

        rows.into_iter()
            .map(|row| {
                Ok(TaskSummary {
                    id: row
                        .try_get("id")
                        .map_err(|e| DirectoryError::LookupFailed(e.to_string()))?,
                    title: row
                        .try_get("title")
                        .map_err(|e| DirectoryError::LookupFailed(e.to_string()))?,
                })
            })
            .collect()
    }
}
