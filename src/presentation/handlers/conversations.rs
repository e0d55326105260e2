use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{Conversation, ProjectId};
use crate::presentation::state::AppState;

use super::{authenticate, error_response};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSummary {
    pub id: Uuid,
    pub project_id: Uuid,
    pub title: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Conversation> for ConversationSummary {
    fn from(conversation: &Conversation) -> Self {
        Self {
            id: conversation.id.as_uuid(),
            project_id: conversation.project_id.as_uuid(),
            title: conversation.title.clone(),
            created_at: conversation.created_at,
            updated_at: conversation.updated_at,
        }
    }
}

#[tracing::instrument(skip(state, headers))]
pub async fn list_conversations_handler(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
    headers: HeaderMap,
) -> Response {
    let caller = match authenticate(state.sessions.as_ref(), &headers).await {
        Ok(caller) => caller,
        Err(response) => return response,
    };

    match state
        .conversations
        .list_for_owner_in_project(caller.user_id, ProjectId::from_uuid(project_id))
        .await
    {
        Ok(conversations) => {
            let summaries: Vec<ConversationSummary> =
                conversations.iter().map(ConversationSummary::from).collect();
            (StatusCode::OK, Json(summaries)).into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "Conversation listing failed");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to list conversations",
            )
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateConversationBody {
    pub project_id: Option<Uuid>,
}

#[tracing::instrument(skip(state, headers, body))]
pub async fn create_conversation_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<CreateConversationBody>,
) -> Response {
    let caller = match authenticate(state.sessions.as_ref(), &headers).await {
        Ok(caller) => caller,
        Err(response) => return response,
    };

    let Some(project_id) = body.project_id else {
        return error_response(StatusCode::BAD_REQUEST, "projectId is required");
    };

    let conversation = Conversation::new(caller.user_id, ProjectId::from_uuid(project_id));
    match state.conversations.create(&conversation).await {
        Ok(()) => (
            StatusCode::CREATED,
            Json(ConversationSummary::from(&conversation)),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Conversation creation failed");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to create conversation",
            )
        }
    }
}
