mod auth;
mod chat;
mod conversations;
mod health;

pub use auth::{authenticate, error_response, ErrorResponse};
pub use chat::chat_turn_handler;
pub use conversations::{create_conversation_handler, list_conversations_handler};
pub use health::health_handler;
