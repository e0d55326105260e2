use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::application::ports::{SessionUser, SessionVerifier};

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub fn error_response(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
        .into_response()
}

/// Resolves the caller from the bearer token. Auth runs before anything
/// else a handler does; a missing or dead session is its own failure class,
/// distinct from request validation.
pub async fn authenticate(
    sessions: &dyn SessionVerifier,
    headers: &HeaderMap,
) -> Result<SessionUser, Response> {
    let token = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());

    let Some(token) = token else {
        return Err(error_response(
            StatusCode::UNAUTHORIZED,
            "Authentication required",
        ));
    };

    match sessions.verify(token).await {
        Ok(Some(user)) => Ok(user),
        Ok(None) => Err(error_response(
            StatusCode::UNAUTHORIZED,
            "Invalid or expired session",
        )),
        Err(e) => {
            tracing::error!(error = %e, "Session lookup failed");
            Err(error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to verify session",
            ))
        }
    }
}
