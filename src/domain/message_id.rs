use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::ConversationId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageId(Uuid);

impl MessageId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Deterministic identifier for per-turn synthetic messages, derived
    /// from the conversation and the moment the turn ran. Synthetic
    /// messages are never persisted, so collisions across turns don't
    /// matter; distinctness within one turn does.
    pub fn synthetic(conversation_id: ConversationId, at: DateTime<Utc>) -> Self {
        let name = format!("{}:{}", conversation_id.as_uuid(), at.timestamp_nanos_opt().unwrap_or_default());
        Self(Uuid::new_v5(&conversation_id.as_uuid(), name.as_bytes()))
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}
