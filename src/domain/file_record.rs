use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{ConversationId, ProjectId, UserId};

/// Linkage written when a staged file becomes part of a conversation.
#[derive(Debug, Clone)]
pub struct NewFileRecord {
    pub project_id: ProjectId,
    pub task_id: Option<String>,
    pub uploader_id: UserId,
    pub conversation_id: ConversationId,
    pub storage_provider: String,
    pub storage_path: String,
    pub public_url: Option<String>,
    pub filename: String,
    pub content_type: String,
    pub size: i64,
}

#[derive(Debug, Clone)]
pub struct FileRecord {
    pub id: Uuid,
    pub project_id: ProjectId,
    pub task_id: Option<String>,
    pub uploader_id: UserId,
    pub conversation_id: ConversationId,
    pub storage_provider: String,
    pub storage_path: String,
    pub public_url: Option<String>,
    pub filename: String,
    pub content_type: String,
    pub size: i64,
    pub created_at: DateTime<Utc>,
}
