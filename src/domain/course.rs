//! Course membership as seen by the rollups.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::GameId;

/// A game attached to a course.
///
/// Disabled games stay attached: they are skipped by the course-by-game
/// rollup but still appear in per-student course views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CourseGame {
    /// Attached game.
    pub game_id: GameId,
    /// Whether the course currently offers the game.
    pub enabled: bool,
}

impl CourseGame {
    /// An enabled attachment.
    #[must_use]
    pub fn enabled(game_id: GameId) -> Self {
        Self {
            game_id,
            enabled: true,
        }
    }

    /// A disabled attachment.
    #[must_use]
    pub fn disabled(game_id: GameId) -> Self {
        Self {
            game_id,
            enabled: false,
        }
    }
}
