//! REST API layer: route handlers, DTOs, router composition and the OpenAPI
//! document.
//!
//! All resource endpoints are mounted under `/api/v1`.

pub mod dto;
pub mod handlers;

use std::time::Duration;

use axum::Router;
use axum::http::StatusCode;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use crate::app_state::AppState;

/// OpenAPI description of every endpoint.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "progress-engine",
        description = "Progress and statistics aggregation over the activity completion log."
    ),
    paths(
        handlers::students::get_student_progress,
        handlers::students::get_student_game_progress,
        handlers::students::get_student_statistics,
        handlers::courses::get_course_progress,
        handlers::courses::get_course_students_progress,
        handlers::games::get_game_statistics,
        handlers::completions::record_completion,
        handlers::system::health_handler,
    ),
    tags(
        (name = "Students", description = "Per-student progress and statistics"),
        (name = "Courses", description = "Course-wide rollups"),
        (name = "Games", description = "Game-wide rollups"),
        (name = "Activity Log", description = "Append-only attempt log"),
        (name = "System", description = "Operational endpoints"),
    )
)]
pub struct ApiDoc;

/// Builds the complete API router with all REST endpoints.
pub fn build_router() -> Router<AppState> {
    Router::new()
        .nest("/api/v1", handlers::routes())
        .merge(handlers::system::routes())
}

/// Builds the servable application: routes, optional Swagger UI, and the
/// tracing, timeout and CORS layers.
pub fn build_app(state: AppState, request_timeout: Duration) -> Router {
    let router = build_router();

    #[cfg(feature = "swagger-ui")]
    let router = router.merge(
        utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
            .url("/api-docs/openapi.json", ApiDoc::openapi()),
    );

    router
        .layer(TraceLayer::new_for_http())
        .layer(timeout_layer(request_timeout))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Answers `408 Request Timeout` once a request outlives `request_timeout`.
fn timeout_layer(request_timeout: Duration) -> TimeoutLayer {
    TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, request_timeout)
}
