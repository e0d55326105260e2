use async_trait::async_trait;

use crate::domain::{Conversation, ConversationId, Message, ProjectId, UserId};

use super::RepositoryError;

/// Single source of truth for conversations. Every read and write is scoped
/// to the owning user so one tenant can never touch another's thread.
#[async_trait]
pub trait ConversationRepository: Send + Sync {
    async fn create(&self, conversation: &Conversation) -> Result<(), RepositoryError>;

    async fn fetch_for_owner(
        &self,
        id: ConversationId,
        owner: UserId,
    ) -> Result<Option<Conversation>, RepositoryError>;

    /// Appends are additive, so concurrent turns on the same conversation
    /// interleave without losing messages.
    async fn append_messages(
        &self,
        id: ConversationId,
        messages: &[Message],
    ) -> Result<(), RepositoryError>;

    /// Returns true when the title was written, false when one already
    /// existed. The condition lives in the store, not the caller.
    async fn set_title_if_absent(
        &self,
        id: ConversationId,
        title: &str,
    ) -> Result<bool, RepositoryError>;

    async fn list_for_owner_in_project(
        &self,
        owner: UserId,
        project: ProjectId,
    ) -> Result<Vec<Conversation>, RepositoryError>;
}
