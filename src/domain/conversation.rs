use chrono::{DateTime, Utc};

use super::{ConversationId, Message, ProjectId, UserId};

/// A user's chat thread within a project. The title starts absent and is
/// assigned automatically at most once, after the first substantive turn.
#[derive(Debug, Clone)]
pub struct Conversation {
    pub id: ConversationId,
    pub user_id: UserId,
    pub project_id: ProjectId,
    pub title: Option<String>,
    pub messages: Vec<Message>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    pub fn new(user_id: UserId, project_id: ProjectId) -> Self {
        let now = Utc::now();
        Self {
            id: ConversationId::new(),
            user_id,
            project_id,
            title: None,
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}
