//! Student progress handlers.

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::{
    StudentGameProgressResponse, StudentProgressQuery, StudentProgressResponse,
    StudentStatisticsResponse,
};
use crate::app_state::AppState;
use crate::domain::{GameId, StudentId};
use crate::error::{EngineError, ErrorResponse};

/// `GET /students/{id}/progress`: Per-game progress reports for a student.
///
/// # Errors
///
/// Returns [`EngineError::StudentNotFound`] or [`EngineError::GameNotFound`]
/// for unknown ids.
#[utoipa::path(
    get,
    path = "/api/v1/students/{id}/progress",
    tag = "Students",
    summary = "Student progress by game",
    description = "Returns unlocked level, points, completion rate, accuracy and raw attempts for every game the student played, or for the game given in `game_id`.",
    params(
        ("id" = String, Path, description = "Student id"),
        StudentProgressQuery,
    ),
    responses(
        (status = 200, description = "Progress reports", body = StudentProgressResponse),
        (status = 404, description = "Student or game not found", body = ErrorResponse),
    )
)]
pub async fn get_student_progress(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<StudentProgressQuery>,
) -> Result<impl IntoResponse, EngineError> {
    let student_id = StudentId::new(id);
    let games = state
        .progress_service
        .get_student_progress(&student_id, query.game_id.as_ref())
        .await?;
    Ok(Json(StudentProgressResponse { student_id, games }))
}

/// `GET /students/{id}/games/{game_id}/progress`: Headline progress in one game.
///
/// # Errors
///
/// Returns [`EngineError::StudentNotFound`] or [`EngineError::GameNotFound`]
/// for unknown ids.
#[utoipa::path(
    get,
    path = "/api/v1/students/{id}/games/{game_id}/progress",
    tag = "Students",
    summary = "Student progress in one game",
    description = "Returns the progress percentage and max unlocked level of a student in a game.",
    params(
        ("id" = String, Path, description = "Student id"),
        ("game_id" = String, Path, description = "Game id"),
    ),
    responses(
        (status = 200, description = "Headline progress", body = StudentGameProgressResponse),
        (status = 404, description = "Student or game not found", body = ErrorResponse),
    )
)]
pub async fn get_student_game_progress(
    State(state): State<AppState>,
    Path((id, game_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, EngineError> {
    let student_id = StudentId::new(id);
    let game_id = GameId::new(game_id);
    let progress = state
        .progress_service
        .student_game_progress(&student_id, &game_id)
        .await?;
    Ok(Json(StudentGameProgressResponse {
        student_id,
        game_id,
        percentage: progress.percentage,
        max_unlocked_level: progress.max_unlocked_level,
    }))
}

/// `GET /students/{id}/statistics`: Aggregated statistics across games.
///
/// # Errors
///
/// Returns [`EngineError::StudentNotFound`] for unknown students.
#[utoipa::path(
    get,
    path = "/api/v1/students/{id}/statistics",
    tag = "Students",
    summary = "Student statistics",
    description = "Returns per-game completed counts, time, attempts and progress, plus totals across all games.",
    params(
        ("id" = String, Path, description = "Student id"),
    ),
    responses(
        (status = 200, description = "Aggregated statistics", body = StudentStatisticsResponse),
        (status = 404, description = "Student not found", body = ErrorResponse),
    )
)]
pub async fn get_student_statistics(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, EngineError> {
    let student_id = StudentId::new(id);
    let statistics = state
        .progress_service
        .get_student_statistics(&student_id)
        .await?;
    Ok(Json(StudentStatisticsResponse {
        student_id,
        statistics,
    }))
}

/// Student routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/students/{id}/progress", get(get_student_progress))
        .route("/students/{id}/statistics", get(get_student_statistics))
        .route(
            "/students/{id}/games/{game_id}/progress",
            get(get_student_game_progress),
        )
}
