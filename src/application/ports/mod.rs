mod chat_model;
mod conversation_repository;
mod file_record_store;
mod project_directory;
mod repository_error;
mod retrieval_client;
mod session_verifier;

pub use chat_model::{ChatModel, ChatModelError, ChatRequest, CompletionStream, ModelOptions, StreamEvent};
pub use conversation_repository::ConversationRepository;
pub use file_record_store::FileRecordStore;
pub use project_directory::{DirectoryError, ProjectDirectory};
pub use repository_error::RepositoryError;
pub use retrieval_client::{RetrievalClient, RetrievalError};
pub use session_verifier::{SessionUser, SessionVerifier};
