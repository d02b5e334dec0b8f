//! Course rollup DTOs.

use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::CourseId;
use crate::service::{CourseGameProgress, CourseStudentProgress};

/// Response body for `GET /courses/{id}/progress`.
#[derive(Debug, Serialize, ToSchema)]
pub struct CourseProgressResponse {
    /// Course reported on.
    pub course_id: CourseId,
    /// One row per enabled game.
    pub games: Vec<CourseGameProgress>,
}

/// Response body for `GET /courses/{id}/students/progress`.
#[derive(Debug, Serialize, ToSchema)]
pub struct CourseStudentsProgressResponse {
    /// Course reported on.
    pub course_id: CourseId,
    /// One entry per enrolled student.
    pub students: Vec<CourseStudentProgress>,
}
