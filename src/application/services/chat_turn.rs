use std::pin::Pin;
use std::sync::Arc;

use futures::stream::{Stream, StreamExt};
use tokio::sync::mpsc;

use crate::application::ports::{
    ChatModel, ChatModelError, ChatRequest, ConversationRepository, ModelOptions, SessionUser,
    StreamEvent,
};
use crate::domain::{
    CompletionResult, ConversationId, Message, MessageRole, ProjectId, StagedFileMetadata, UserId,
};

use super::{assemble, ContextAggregator, ContextError, SYSTEM_INSTRUCTION};

const TITLE_MAX_CHARS: usize = 50;
const TITLE_MIN_MESSAGE_CHARS: usize = 5;

/// One validated chat turn, ready to run.
pub struct TurnRequest {
    pub conversation_id: ConversationId,
    pub project_id: ProjectId,
    pub caller: SessionUser,
    /// Conversation history as sent by the client, ending in the caller's
    /// latest user message.
    pub history: Vec<Message>,
    pub staged_files: Vec<StagedFileMetadata>,
}

#[derive(Debug, thiserror::Error)]
pub enum TurnError {
    #[error("message history must end in a user message")]
    EmptyHistory,
    #[error("user is not a member of the project")]
    NotProjectMember,
    #[error("context lookup failed: {0}")]
    Context(String),
    #[error(transparent)]
    Model(#[from] ChatModelError),
}

pub type TurnTokenStream =
    Pin<Box<dyn Stream<Item = Result<String, ChatModelError>> + Send + 'static>>;

/// Sequences one chat turn: context gathering, prompt assembly, model
/// streaming, and the deferred persistence that follows a completed stream.
pub struct ChatTurnService {
    conversations: Arc<dyn ConversationRepository>,
    aggregator: ContextAggregator,
    model: Arc<dyn ChatModel>,
    options: ModelOptions,
}

impl ChatTurnService {
    pub fn new(
        conversations: Arc<dyn ConversationRepository>,
        aggregator: ContextAggregator,
        model: Arc<dyn ChatModel>,
        options: ModelOptions,
    ) -> Self {
        Self {
            conversations,
            aggregator,
            model,
            options,
        }
    }

    /// Runs the turn and returns the token stream for the client. The model
    /// stream is driven by a spawned task, so a client disconnect neither
    /// cancels the in-flight completion nor drops the post-stream
    /// persistence work.
    #[tracing::instrument(
        skip(self, request),
        fields(
            conversation_id = %request.conversation_id.as_uuid(),
            project_id = %request.project_id.as_uuid()
        )
    )]
    pub async fn run(&self, request: TurnRequest) -> Result<TurnTokenStream, TurnError> {
        let user_message = request
            .history
            .last()
            .cloned()
            .ok_or(TurnError::EmptyHistory)?;

        tracing::debug!("Gathering turn context");
        let bundle = self
            .aggregator
            .gather(
                request.project_id,
                &request.caller,
                request.conversation_id,
                &request.staged_files,
                &user_message.content,
            )
            .await
            .map_err(|e| match e {
                ContextError::NotAMember => TurnError::NotProjectMember,
                ContextError::Directory(d) => TurnError::Context(d.to_string()),
            })?;

        // Persist the raw user message without blocking the turn; a failure
        // here is logged and invisible to the response path. Runs only for
        // authorized turns, so a rejected caller leaves no trace.
        self.spawn_user_message_persist(request.conversation_id, user_message.clone());

        let first_turn = request
            .history
            .iter()
            .filter(|m| m.role == MessageRole::User)
            .count()
            == 1;
        let first_message = user_message.content.clone();

        let messages = assemble(
            request.conversation_id,
            &request.caller,
            &bundle,
            request.history,
        );
        tracing::debug!(message_count = messages.len(), "Prompt assembled");

        let model_stream = self
            .model
            .stream_chat(ChatRequest {
                messages,
                system_instruction: SYSTEM_INSTRUCTION.to_string(),
                options: self.options.clone(),
            })
            .await?;
        tracing::debug!("Streaming model response");

        let (tx, mut rx) = mpsc::channel::<Result<String, ChatModelError>>(32);
        let conversations = Arc::clone(&self.conversations);
        let model = Arc::clone(&self.model);
        let options = self.options.clone();
        let conversation_id = request.conversation_id;
        let owner = request.caller.user_id;

        tokio::spawn(async move {
            let mut model_stream = model_stream;
            let mut completion: Option<CompletionResult> = None;

            while let Some(event) = model_stream.next().await {
                match event {
                    Ok(StreamEvent::Token(token)) => {
                        // A closed receiver means the client went away; keep
                        // draining so the completion still lands server-side.
                        let _ = tx.send(Ok(token)).await;
                    }
                    Ok(StreamEvent::Done(result)) => {
                        completion = Some(result);
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Model stream error");
                        let _ = tx.send(Err(e)).await;
                        return;
                    }
                }
            }
            drop(tx);

            if let Some(result) = completion {
                finalize_turn(
                    conversations,
                    model,
                    options,
                    conversation_id,
                    owner,
                    first_turn,
                    first_message,
                    result,
                )
                .await;
            }
        });

        Ok(Box::pin(async_stream::stream! {
            while let Some(item) = rx.recv().await {
                yield item;
            }
        }))
    }

    fn spawn_user_message_persist(&self, conversation_id: ConversationId, message: Message) {
        let conversations = Arc::clone(&self.conversations);
        tokio::spawn(async move {
            if let Err(e) = conversations
                .append_messages(conversation_id, &[message])
                .await
            {
                tracing::warn!(
                    error = %e,
                    conversation_id = %conversation_id.as_uuid(),
                    "Failed to persist user message"
                );
            }
        });
    }
}

/// Post-stream side effects, run exactly once after a naturally finished
/// stream. The client response has already committed by now, so failures
/// are logged and nothing is surfaced or retried.
#[allow(clippy::too_many_arguments)]
async fn finalize_turn(
    conversations: Arc<dyn ConversationRepository>,
    model: Arc<dyn ChatModel>,
    options: ModelOptions,
    conversation_id: ConversationId,
    owner: UserId,
    first_turn: bool,
    first_message: String,
    result: CompletionResult,
) {
    tracing::debug!(
        conversation_id = %conversation_id.as_uuid(),
        finish_reason = result.finish_reason.as_str(),
        total_tokens = result.usage.total_tokens,
        "Turn completed"
    );

    let assistant = Message::new(MessageRole::Assistant, result.text);
    if let Err(e) = conversations
        .append_messages(conversation_id, &[assistant])
        .await
    {
        tracing::warn!(
            error = %e,
            conversation_id = %conversation_id.as_uuid(),
            "Failed to persist assistant message"
        );
    }

    if !first_turn || !should_generate_title(&first_message) {
        return;
    }

    // Re-check against the store before generating: a concurrent turn may
    // have titled the conversation while we streamed.
    match conversations.fetch_for_owner(conversation_id, owner).await {
        Ok(Some(conversation)) if conversation.title.is_none() => {
            match model.generate_title(&first_message, &options).await {
                Ok(raw) => {
                    let title = normalize_title(&raw);
                    if title.is_empty() {
                        return;
                    }
                    match conversations
                        .set_title_if_absent(conversation_id, &title)
                        .await
                    {
                        Ok(true) => {
                            tracing::info!(
                                conversation_id = %conversation_id.as_uuid(),
                                title = %title,
                                "Conversation title assigned"
                            );
                        }
                        Ok(false) => {}
                        Err(e) => {
                            tracing::warn!(error = %e, "Failed to persist conversation title");
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Title generation failed");
                }
            }
        }
        Ok(_) => {}
        Err(e) => {
            tracing::warn!(error = %e, "Title re-check failed");
        }
    }
}

/// Trivial openers don't deserve a model round trip.
pub fn should_generate_title(first_message: &str) -> bool {
    let trimmed = first_message.trim();
    if trimmed.chars().count() < TITLE_MIN_MESSAGE_CHARS {
        return false;
    }
    !matches!(trimmed.to_lowercase().as_str(), "hi" | "hello")
}

/// Strips the quoting models like to add and caps the length.
pub fn normalize_title(raw: &str) -> String {
    let trimmed = raw
        .trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .trim()
        .to_string();
    if trimmed.chars().count() <= TITLE_MAX_CHARS {
        return trimmed;
    }
    trimmed.chars().take(TITLE_MAX_CHARS).collect()
}
