//! REST endpoint handlers organized by resource.

pub mod completions;
pub mod courses;
pub mod games;
pub mod students;
pub mod system;

use axum::Router;

use crate::app_state::AppState;

/// Composes all resource routes under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(students::routes())
        .merge(courses::routes())
        .merge(games::routes())
        .merge(completions::routes())
}
