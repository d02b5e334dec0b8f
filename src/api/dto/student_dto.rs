//! Student-scoped DTOs.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{GameId, StudentId, StudentStatistics};
use crate::service::GameProgressReport;

/// Query parameters for `GET /students/{id}/progress`.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StudentProgressQuery {
    /// Restrict the report to one game.
    #[serde(default)]
    pub game_id: Option<GameId>,
}

/// Response body for `GET /students/{id}/progress`.
#[derive(Debug, Serialize, ToSchema)]
pub struct StudentProgressResponse {
    /// Student reported on.
    pub student_id: StudentId,
    /// One report per game.
    pub games: Vec<GameProgressReport>,
}

/// Response body for `GET /students/{id}/games/{game_id}/progress`.
#[derive(Debug, Serialize, ToSchema)]
pub struct StudentGameProgressResponse {
    /// Student reported on.
    pub student_id: StudentId,
    /// Game reported on.
    pub game_id: GameId,
    /// Share of the game finished at least once, 0–100.
    pub percentage: u32,
    /// Level the student may play next.
    pub max_unlocked_level: u32,
}

/// Response body for `GET /students/{id}/statistics`.
#[derive(Debug, Serialize, ToSchema)]
pub struct StudentStatisticsResponse {
    /// Student reported on.
    pub student_id: StudentId,
    /// Aggregated statistics across every game played.
    pub statistics: StudentStatistics,
}
