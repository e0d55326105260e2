use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use tracing::instrument;

use crate::application::ports::{ConversationRepository, RepositoryError};
use crate::domain::{
    Conversation, ConversationId, Message, MessageId, MessageRole, ProjectId, UserId,
};

pub struct PgConversationRepository {
    pool: PgPool,
}

impl PgConversationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn conversation_from_row(row: &PgRow) -> Result<Conversation, RepositoryError> {
        Ok(Conversation {
            id: ConversationId::from_uuid(
                row.try_get("id")
                    .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?,
            ),
            user_id: UserId::from_uuid(
                row.try_get("user_id")
                    .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?,
            ),
            project_id: ProjectId::from_uuid(
                row.try_get("project_id")
                    .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?,
            ),
            title: row
                .try_get("title")
                .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?,
            messages: Vec::new(),
            created_at: row
                .try_get("created_at")
                .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?,
            updated_at: row
                .try_get("updated_at")
                .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?,
        })
    }

    fn message_from_row(row: &PgRow) -> Result<Message, RepositoryError> {
        let role: String = row
            .try_get("role")
            .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;
        let attachments: Json<Vec<String>> = row
            .try_get("attachments")
            .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;
        let created_at: DateTime<Utc> = row
            .try_get("created_at")
            .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        Ok(Message {
            id: MessageId::from_uuid(
                row.try_get("id")
                    .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?,
            ),
            role: role.parse::<MessageRole>().map_err(RepositoryError::QueryFailed)?,
            content: row
                .try_get("content")
                .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?,
            created_at,
            attachments: attachments.0,
        })
    }

    async fn messages_for(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Vec<Message>, RepositoryError> {
        let rows = sqlx::query(
            r#"
            SELECT id, role, content, attachments, created_at
            FROM messages
            WHERE conversation_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(conversation_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        rows.iter().map(Self::message_from_row).collect()
    }
}

#[async_trait]
impl ConversationRepository for PgConversationRepository {
    #[instrument(skip(self, conversation), fields(conversation_id = %conversation.id.as_uuid()))]
    async fn create(&self, conversation: &Conversation) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO conversations (id, user_id, project_id, title, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(conversation.id.as_uuid())
        .bind(conversation.user_id.as_uuid())
        .bind(conversation.project_id.as_uuid())
        .bind(&conversation.title)
        .bind(conversation.created_at)
        .bind(conversation.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        Ok(())
    }

    #[instrument(skip(self), fields(conversation_id = %id.as_uuid()))]
    async fn fetch_for_owner(
        &self,
        id: ConversationId,
        owner: UserId,
    ) -> Result<Option<Conversation>, RepositoryError> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, project_id, title, created_at, updated_at
            FROM conversations
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id.as_uuid())
        .bind(owner.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        match row {
            Some(row) => {
                let mut conversation = Self::conversation_from_row(&row)?;
                conversation.messages = self.messages_for(id).await?;
                Ok(Some(conversation))
            }
            None => Ok(None),
        }
    }

    #[instrument(skip(self, messages), fields(conversation_id = %id.as_uuid(), count = messages.len()))]
    async fn append_messages(
        &self,
        id: ConversationId,
        messages: &[Message],
    ) -> Result<(), RepositoryError> {
        for message in messages {
            sqlx::query(
                r#"
                INSERT INTO messages (id, conversation_id, role, content, attachments, created_at)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(message.id.as_uuid())
            .bind(id.as_uuid())
            .bind(message.role.as_str())
            .bind(&message.content)
            .bind(Json(message.attachments.clone()))
            .bind(message.created_at)
            .execute(&self.pool)
            .await
            .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;
        }

        sqlx::query("UPDATE conversations SET updated_at = $1 WHERE id = $2")
            .bind(Utc::now())
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        Ok(())
    }

    #[instrument(skip(self, title), fields(conversation_id = %id.as_uuid()))]
    async fn set_title_if_absent(
        &self,
        id: ConversationId,
        title: &str,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE conversations
            SET title = $2, updated_at = $3
            WHERE id = $1 AND title IS NULL
            "#,
        )
        .bind(id.as_uuid())
        .bind(title)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self), fields(project_id = %project.as_uuid()))]
    async fn list_for_owner_in_project(
        &self,
        owner: UserId,
        project: ProjectId,
    ) -> Result<Vec<Conversation>, RepositoryError> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, project_id, title, created_at, updated_at
            FROM conversations
            WHERE user_id = $1 AND project_id = $2
            ORDER BY updated_at DESC
            "#,
        )
        .bind(owner.as_uuid())
        .bind(project.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        rows.iter().map(Self::conversation_from_row).collect()
    }
}
