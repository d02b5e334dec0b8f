//! Service layer: query orchestration over the repositories.
//!
//! [`ProgressService`] reads the activity log, the level catalog and course
//! membership through injected traits and runs the domain computations.

pub mod progress_service;
pub mod reports;

pub use progress_service::ProgressService;
pub use reports::{
    CourseGameEntry, CourseGameProgress, CourseStudentProgress, GameProgressReport,
    GameStatistics, LastActivity, StudentGameStatistics,
};
