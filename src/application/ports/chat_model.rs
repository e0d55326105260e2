use std::pin::Pin;

use async_trait::async_trait;
use futures::stream::Stream;

use crate::domain::{CompletionResult, Message};

#[derive(Debug, thiserror::Error)]
pub enum ChatModelError {
    #[error("model quota exhausted: {0}")]
    QuotaExhausted(String),
    #[error("model permission denied: {0}")]
    PermissionDenied(String),
    #[error("invalid model API key: {0}")]
    InvalidApiKey(String),
    #[error("api request failed: {0}")]
    RequestFailed(String),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// One element of a model completion stream. `Done` arrives exactly once,
/// after the final token, carrying the accumulated result.
#[derive(Debug, Clone)]
pub enum StreamEvent {
    Token(String),
    Done(CompletionResult),
}

pub type CompletionStream =
    Pin<Box<dyn Stream<Item = Result<StreamEvent, ChatModelError>> + Send + 'static>>;

/// Every recognized model knob, spelled out. No loose option bags.
#[derive(Debug, Clone)]
pub struct ModelOptions {
    pub chat_model: String,
    pub title_model: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
}

pub struct ChatRequest {
    pub messages: Vec<Message>,
    pub system_instruction: String,
    pub options: ModelOptions,
}

#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn stream_chat(&self, request: ChatRequest) -> Result<CompletionStream, ChatModelError>;

    /// Short (3-5 word) conversation title for the given opening message.
    async fn generate_title(
        &self,
        first_message: &str,
        options: &ModelOptions,
    ) -> Result<String, ChatModelError>;
}
