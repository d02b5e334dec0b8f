//! Database row types and their conversion into domain values.
//!
//! PostgreSQL has no unsigned integers, so counters are stored as `INT4` /
//! `INT8` and checked on the way in and out.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{ActivityCompletionRecord, GameId, GameLevel, RecordId, StudentId};
use crate::error::EngineError;

/// A row of the `activity_completions` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ActivityCompletionRow {
    /// Record identifier.
    pub id: Uuid,
    /// Student reference.
    pub student_id: String,
    /// Game reference.
    pub game_id: String,
    /// Level number.
    pub level: i32,
    /// Activity position within the level.
    pub activity: i32,
    /// Points of this attempt.
    pub points: i32,
    /// Running total at write time.
    pub total_points: i64,
    /// Client retry counter.
    pub attempts: i32,
    /// Attempt outcome.
    pub is_completed: bool,
    /// Client-asserted unlocked level.
    pub max_unlocked_level: i32,
    /// Correct answers, if reported.
    pub correct_answers: Option<i32>,
    /// Questions asked, if reported.
    pub total_questions: Option<i32>,
    /// Seconds spent, if reported.
    pub completion_time: Option<i32>,
    /// Insert timestamp.
    pub created_at: DateTime<Utc>,
    /// Update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<ActivityCompletionRow> for ActivityCompletionRecord {
    type Error = EngineError;

    fn try_from(row: ActivityCompletionRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: RecordId::from_uuid(row.id),
            student_id: StudentId::new(row.student_id),
            game_id: GameId::new(row.game_id),
            level: from_db(row.level, "level")?,
            activity: from_db(row.activity, "activity")?,
            points: from_db(row.points, "points")?,
            total_points: u64::try_from(row.total_points).map_err(|_| negative("total_points"))?,
            attempts: from_db(row.attempts, "attempts")?,
            is_completed: row.is_completed,
            max_unlocked_level: from_db(row.max_unlocked_level, "max_unlocked_level")?,
            correct_answers: row
                .correct_answers
                .map(|v| from_db(v, "correct_answers"))
                .transpose()?,
            total_questions: row
                .total_questions
                .map(|v| from_db(v, "total_questions"))
                .transpose()?,
            completion_time: row
                .completion_time
                .map(|v| from_db(v, "completion_time"))
                .transpose()?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// A row of the `game_levels` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct GameLevelRow {
    /// Row identifier.
    pub id: Uuid,
    /// Owning game.
    pub game_id: String,
    /// Level number.
    pub level: i32,
    /// Display name.
    pub name: String,
    /// Description.
    pub description: String,
    /// Difficulty label.
    pub difficulty: String,
    /// Activities in the level.
    pub activities_count: i32,
    /// Opaque JSONB configuration.
    pub config: serde_json::Value,
    /// Soft-delete flag.
    pub is_active: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<GameLevelRow> for GameLevel {
    type Error = EngineError;

    fn try_from(row: GameLevelRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            game_id: GameId::new(row.game_id),
            level: from_db(row.level, "level")?,
            name: row.name,
            description: row.description,
            difficulty: row.difficulty,
            activities_count: from_db(row.activities_count, "activities_count")?,
            config: row.config,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Converts a stored `INT4` into an unsigned domain value.
pub(crate) fn from_db(value: i32, column: &str) -> Result<u32, EngineError> {
    u32::try_from(value).map_err(|_| negative(column))
}

/// Converts an unsigned domain value into an `INT4` bind parameter.
pub(crate) fn to_db(value: u32, column: &str) -> Result<i32, EngineError> {
    i32::try_from(value)
        .map_err(|_| EngineError::InvalidRequest(format!("{column} out of range: {value}")))
}

fn negative(column: &str) -> EngineError {
    EngineError::PersistenceError(format!("negative value stored in {column}"))
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn row() -> ActivityCompletionRow {
        let now = Utc::now();
        ActivityCompletionRow {
            id: Uuid::new_v4(),
            student_id: "ana".to_string(),
            game_id: "sums".to_string(),
            level: 2,
            activity: 3,
            points: 10,
            total_points: 40,
            attempts: 1,
            is_completed: true,
            max_unlocked_level: 2,
            correct_answers: Some(4),
            total_questions: Some(5),
            completion_time: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn row_converts_to_record() {
        let Ok(record) = ActivityCompletionRecord::try_from(row()) else {
            panic!("conversion failed");
        };
        assert_eq!(record.position(), (2, 3));
        assert_eq!(record.total_points, 40);
        assert_eq!(record.accuracy(), Some(80.0));
    }

    #[test]
    fn negative_counters_are_rejected() {
        let mut bad = row();
        bad.points = -1;
        assert!(ActivityCompletionRecord::try_from(bad).is_err());
    }

    #[test]
    fn oversized_values_do_not_bind() {
        assert!(to_db(u32::MAX, "points").is_err());
        assert_eq!(to_db(7, "points").ok(), Some(7));
    }
}
