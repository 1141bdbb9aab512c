//! Axum Handlers for the Companion API
//!
//! The companion endpoint never fails on input: it always answers 200 with
//! some message. The only error response is 405 for unsupported methods.

use axum::{
    body::{Body, to_bytes},
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;
use tracing::{info, warn};

use crate::{
    models::{CompanionPayload, CompanionReply, ErrorResponse},
    state::AppState,
};

pub enum ApiError {
    MethodNotAllowed,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::MethodNotAllowed => (
                StatusCode::METHOD_NOT_ALLOWED,
                Json(ErrorResponse {
                    error: "Method not allowed".to_string(),
                }),
            )
                .into_response(),
        }
    }
}

/// Bodies larger than this are not parsed; the request is answered as if it
/// carried no fields.
pub const MAX_BODY_BYTES: usize = 64 * 1024;

/// Get a short study-buddy message for a student.
#[utoipa::path(
    post,
    path = "/api/companion",
    request_body = CompanionPayload,
    responses(
        (status = 200, description = "A generated or fallback message", body = CompanionReply),
        (status = 405, description = "Method not allowed", body = ErrorResponse)
    )
)]
pub async fn companion(State(state): State<Arc<AppState>>, body: Body) -> Json<CompanionReply> {
    let payload = match to_bytes(body, MAX_BODY_BYTES).await {
        Ok(bytes) => CompanionPayload::from_body(&bytes),
        Err(e) => {
            warn!(error = %e, limit = MAX_BODY_BYTES, "Unreadable request body; using defaults");
            CompanionPayload::default()
        }
    };
    let request = payload.into_request();
    let student_name = request.subject_name.clone();

    let response = state
        .pipeline
        .get_message(&request, state.config.time_budget)
        .await;
    info!(
        message_type = %request.message_type,
        using_fallback = response.used_fallback,
        "Companion message served"
    );

    Json(CompanionReply::new(student_name, response))
}

pub async fn method_not_allowed() -> ApiError {
    warn!("Rejected request with unsupported method");
    ApiError::MethodNotAllowed
}
