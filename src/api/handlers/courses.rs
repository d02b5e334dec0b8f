//! Course rollup handlers.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::{CourseProgressResponse, CourseStudentsProgressResponse};
use crate::app_state::AppState;
use crate::domain::CourseId;
use crate::error::{EngineError, ErrorResponse};

/// `GET /courses/{id}/progress`: Average progress per enabled game.
///
/// # Errors
///
/// Returns [`EngineError::CourseNotFound`] for unknown courses.
#[utoipa::path(
    get,
    path = "/api/v1/courses/{id}/progress",
    tag = "Courses",
    summary = "Course progress by game",
    description = "For each enabled game of the course, averages every enrolled student's progress percentage and counts students with any progress.",
    params(
        ("id" = String, Path, description = "Course id"),
    ),
    responses(
        (status = 200, description = "Per-game rollup", body = CourseProgressResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
    )
)]
pub async fn get_course_progress(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, EngineError> {
    let course_id = CourseId::new(id);
    let games = state
        .progress_service
        .get_course_progress_by_game(&course_id)
        .await?;
    Ok(Json(CourseProgressResponse { course_id, games }))
}

/// `GET /courses/{id}/students/progress`: Every student in every course game.
///
/// # Errors
///
/// Returns [`EngineError::CourseNotFound`] for unknown courses.
#[utoipa::path(
    get,
    path = "/api/v1/courses/{id}/students/progress",
    tag = "Courses",
    summary = "Per-student course progress",
    description = "Returns, for each enrolled student, a progress entry for every game attached to the course, including games the student never played.",
    params(
        ("id" = String, Path, description = "Course id"),
    ),
    responses(
        (status = 200, description = "Per-student view", body = CourseStudentsProgressResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
    )
)]
pub async fn get_course_students_progress(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, EngineError> {
    let course_id = CourseId::new(id);
    let students = state
        .progress_service
        .get_course_student_progress(&course_id)
        .await?;
    Ok(Json(CourseStudentsProgressResponse {
        course_id,
        students,
    }))
}

/// Course routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/courses/{id}/progress", get(get_course_progress))
        .route(
            "/courses/{id}/students/progress",
            get(get_course_students_progress),
        )
}
