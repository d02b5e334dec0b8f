//! Level catalog rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::GameId;

/// Metadata for one level of one game.
///
/// Read-only from the engine's point of view; administrators maintain the
/// catalog elsewhere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct GameLevel {
    /// Catalog row identifier.
    pub id: uuid::Uuid,
    /// Owning game.
    pub game_id: GameId,
    /// Level number, unique per game.
    pub level: u32,
    /// Display name.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// Difficulty label (e.g. `"easy"`).
    pub difficulty: String,
    /// Number of activities that make up the level.
    pub activities_count: u32,
    /// Opaque generation parameters for the game client.
    #[schema(value_type = Object)]
    pub config: serde_json::Value,
    /// Soft-delete flag. Inactive levels still count toward the game size.
    pub is_active: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl GameLevel {
    /// Builds an active level with empty metadata.
    #[must_use]
    pub fn new(game_id: GameId, level: u32, activities_count: u32) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4(),
            game_id,
            level,
            name: format!("Level {level}"),
            description: String::new(),
            difficulty: String::new(),
            activities_count,
            config: serde_json::Value::Null,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}
