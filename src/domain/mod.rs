mod completion;
mod conversation;
mod conversation_id;
mod file_record;
mod membership;
mod message;
mod message_id;
mod message_role;
mod project_id;
mod staged_file;
mod task;
mod user_id;

pub use completion::{CompletionResult, FinishReason, TokenUsage};
pub use conversation::Conversation;
pub use conversation_id::ConversationId;
pub use file_record::{FileRecord, NewFileRecord};
pub use membership::MembershipLookup;
pub use message::Message;
pub use message_id::MessageId;
pub use message_role::MessageRole;
pub use project_id::ProjectId;
pub use staged_file::StagedFileMetadata;
pub use task::{TaskStatus, TaskSummary};
pub use user_id::UserId;
