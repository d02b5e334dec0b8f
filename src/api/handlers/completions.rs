//! Activity completion write handler.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};

use crate::api::dto::RecordCompletionResponse;
use crate::app_state::AppState;
use crate::domain::NewActivityCompletion;
use crate::error::{EngineError, ErrorResponse};

/// `POST /activity-completions`: Append one attempt to the log.
///
/// # Errors
///
/// Returns [`EngineError::InvalidRequest`] for malformed attempts and a
/// not-found error for unknown students or games.
#[utoipa::path(
    post,
    path = "/api/v1/activity-completions",
    tag = "Activity Log",
    summary = "Record an activity attempt",
    description = "Appends an attempt, computing its running point total, and returns the stored row with the student's updated progress.",
    request_body = NewActivityCompletion,
    responses(
        (status = 201, description = "Attempt recorded", body = RecordCompletionResponse),
        (status = 400, description = "Invalid attempt", body = ErrorResponse),
        (status = 404, description = "Student or game not found", body = ErrorResponse),
    )
)]
pub async fn record_completion(
    State(state): State<AppState>,
    Json(req): Json<NewActivityCompletion>,
) -> Result<impl IntoResponse, EngineError> {
    let (record, progress) = state.progress_service.record_completion(req).await?;
    Ok((
        StatusCode::CREATED,
        Json(RecordCompletionResponse { record, progress }),
    ))
}

/// Activity log routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/activity-completions", post(record_completion))
}
