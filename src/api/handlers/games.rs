//! Game-wide statistics handler.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::app_state::AppState;
use crate::domain::GameId;
use crate::error::{EngineError, ErrorResponse};
use crate::service::GameStatistics;

/// `GET /games/{id}/statistics`: Statistics across every student.
///
/// # Errors
///
/// Returns [`EngineError::GameNotFound`] for unknown games.
#[utoipa::path(
    get,
    path = "/api/v1/games/{id}/statistics",
    tag = "Games",
    summary = "Game statistics",
    description = "Returns distinct students, mean peak points, pooled accuracy and pooled completion rate, plus one line per student.",
    params(
        ("id" = String, Path, description = "Game id"),
    ),
    responses(
        (status = 200, description = "Game statistics", body = GameStatistics),
        (status = 404, description = "Game not found", body = ErrorResponse),
    )
)]
pub async fn get_game_statistics(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, EngineError> {
    let stats = state
        .progress_service
        .get_game_statistics(&GameId::new(id))
        .await?;
    Ok(Json(stats))
}

/// Game routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/games/{id}/statistics", get(get_game_statistics))
}
