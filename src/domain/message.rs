use chrono::{DateTime, Utc};

use super::{ConversationId, MessageId, MessageRole};

#[derive(Debug, Clone)]
pub struct Message {
    pub id: MessageId,
    pub role: MessageRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
    /// Durable file record ids attached to this message, empty for most.
    pub attachments: Vec<String>,
}

impl Message {
    pub fn new(role: MessageRole, content: String) -> Self {
        Self {
            id: MessageId::new(),
            role,
            content,
            created_at: Utc::now(),
            attachments: Vec::new(),
        }
    }

    /// Server-constructed context message for a single turn. Carries a
    /// conversation-and-time derived id and is never persisted.
    pub fn synthetic(conversation_id: ConversationId, content: String) -> Self {
        let now = Utc::now();
        Self {
            id: MessageId::synthetic(conversation_id, now),
            role: MessageRole::System,
            content,
            created_at: now,
            attachments: Vec::new(),
        }
    }
}
