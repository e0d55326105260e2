use axum::body::Body;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::application::ports::ChatModelError;
use crate::application::services::{TurnError, TurnRequest};
use crate::domain::{
    ConversationId, Message, MessageRole, ProjectId, StagedFileMetadata,
};
use crate::infrastructure::observability::sanitize_prompt;
use crate::presentation::state::AppState;

use super::{authenticate, error_response};

#[derive(Deserialize)]
pub struct ChatTurnBody {
    #[serde(default)]
    pub messages: Vec<IncomingMessage>,
    #[serde(default)]
    pub data: Option<ChatTurnData>,
}

#[derive(Deserialize)]
pub struct IncomingMessage {
    pub role: String,
    pub content: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatTurnData {
    pub conversation_id: Option<Uuid>,
    pub project_id: Option<Uuid>,
    #[serde(default)]
    pub staged_files_data: Vec<StagedFilePayload>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StagedFilePayload {
    pub name: String,
    pub path: String,
    pub url: Option<String>,
    pub content_type: String,
    pub size: i64,
}

/// One chat turn: authenticate, validate, then hand off to the turn service
/// and stream its tokens back as a chunked plain-text body.
#[tracing::instrument(skip(state, headers, body))]
pub async fn chat_turn_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<ChatTurnBody>,
) -> Response {
    let caller = match authenticate(state.sessions.as_ref(), &headers).await {
        Ok(caller) => caller,
        Err(response) => return response,
    };

    let Some(data) = body.data else {
        return error_response(
            StatusCode::BAD_REQUEST,
            "conversationId and projectId are required",
        );
    };
    let (Some(conversation_id), Some(project_id)) = (data.conversation_id, data.project_id) else {
        return error_response(
            StatusCode::BAD_REQUEST,
            "conversationId and projectId are required",
        );
    };

    if body.messages.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "messages must not be empty");
    }

    let mut history = Vec::with_capacity(body.messages.len());
    for message in &body.messages {
        let role: MessageRole = match message.role.parse() {
            Ok(role) => role,
            Err(_) => {
                return error_response(
                    StatusCode::BAD_REQUEST,
                    &format!("Unknown message role: {}", message.role),
                );
            }
        };
        history.push(Message::new(role, message.content.clone()));
    }

    match history.last() {
        Some(last) if last.role == MessageRole::User => {
            tracing::debug!(
                prompt = %sanitize_prompt(&last.content),
                "Processing chat turn"
            );
        }
        _ => {
            return error_response(
                StatusCode::BAD_REQUEST,
                "The last message must be from the user",
            );
        }
    }

    let staged_files = data
        .staged_files_data
        .into_iter()
        .map(|f| StagedFileMetadata {
            name: f.name,
            path: f.path,
            url: f.url,
            content_type: f.content_type,
            size: f.size,
        })
        .collect();

    let request = TurnRequest {
        conversation_id: ConversationId::from_uuid(conversation_id),
        project_id: ProjectId::from_uuid(project_id),
        caller,
        history,
        staged_files,
    };

    match state.chat_turns.run(request).await {
        Ok(stream) => (
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            Body::from_stream(stream),
        )
            .into_response(),
        Err(e) => turn_error_response(e),
    }
}

fn turn_error_response(error: TurnError) -> Response {
    match error {
        TurnError::EmptyHistory => {
            error_response(StatusCode::BAD_REQUEST, "messages must not be empty")
        }
        TurnError::NotProjectMember => error_response(
            StatusCode::FORBIDDEN,
            "You are not a member of this project",
        ),
        TurnError::Context(message) => {
            tracing::error!(error = %message, "Context gathering failed");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to prepare chat context",
            )
        }
        TurnError::Model(model_error) => {
            tracing::error!(error = %model_error, "Model invocation failed");
            match model_error {
                ChatModelError::QuotaExhausted(_) => error_response(
                    StatusCode::TOO_MANY_REQUESTS,
                    "The assistant is over capacity right now. Please try again shortly.",
                ),
                ChatModelError::PermissionDenied(_) => error_response(
                    StatusCode::FORBIDDEN,
                    "The assistant does not have access to the requested model",
                ),
                ChatModelError::InvalidApiKey(_) => error_response(
                    StatusCode::UNAUTHORIZED,
                    "The assistant is not configured with a valid model API key",
                ),
                ChatModelError::RequestFailed(_) | ChatModelError::InvalidResponse(_) => {
                    error_response(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "The assistant failed to respond",
                    )
                }
            }
        }
    }
}
