//! PostgreSQL implementation of the repository traits.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use super::models::{ActivityCompletionRow, GameLevelRow, to_db};
use super::{ActivityLog, CourseDirectory, LevelCatalog};
use crate::config::EngineConfig;
use crate::domain::{
    ActivityCompletionRecord, CourseGame, CourseId, GameId, GameLevel, NewActivityCompletion,
    StudentId,
};
use crate::error::EngineError;

const RECORD_COLUMNS: &str = "id, student_id, game_id, level, activity, points, total_points, \
     attempts, is_completed, max_unlocked_level, correct_answers, total_questions, \
     completion_time, created_at, updated_at";

/// PostgreSQL-backed store using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a store over an existing connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a connection pool sized from the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::PersistenceError`] if the database cannot be
    /// reached.
    pub async fn connect(config: &EngineConfig) -> Result<Self, EngineError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .min_connections(config.database_min_connections)
            .acquire_timeout(Duration::from_secs(config.database_connect_timeout_secs))
            .connect(&config.database_url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Applies the embedded schema migrations.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::PersistenceError`] if a migration fails.
    pub async fn migrate(&self) -> Result<(), EngineError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| EngineError::PersistenceError(e.to_string()))
    }

    async fn exists(&self, sql: &str, id: &str) -> Result<bool, EngineError> {
        let found = sqlx::query_scalar::<_, bool>(sql)
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(found)
    }
}

fn into_records(
    rows: Vec<ActivityCompletionRow>,
) -> Result<Vec<ActivityCompletionRecord>, EngineError> {
    rows.into_iter().map(TryInto::try_into).collect()
}

#[async_trait]
impl ActivityLog for PostgresStore {
    async fn records_for(
        &self,
        student_id: &StudentId,
        game_id: Option<&GameId>,
    ) -> Result<Vec<ActivityCompletionRecord>, EngineError> {
        let rows = if let Some(game_id) = game_id {
            sqlx::query_as::<_, ActivityCompletionRow>(&format!(
                "SELECT {RECORD_COLUMNS} FROM activity_completions \
                 WHERE student_id = $1 AND game_id = $2 ORDER BY created_at ASC"
            ))
            .bind(student_id.as_str())
            .bind(game_id.as_str())
            .fetch_all(&self.pool)
            .await
        } else {
            sqlx::query_as::<_, ActivityCompletionRow>(&format!(
                "SELECT {RECORD_COLUMNS} FROM activity_completions \
                 WHERE student_id = $1 ORDER BY created_at ASC"
            ))
            .bind(student_id.as_str())
            .fetch_all(&self.pool)
            .await
        }?;
        into_records(rows)
    }

    async fn records_for_game(
        &self,
        game_id: &GameId,
    ) -> Result<Vec<ActivityCompletionRecord>, EngineError> {
        let rows = sqlx::query_as::<_, ActivityCompletionRow>(&format!(
            "SELECT {RECORD_COLUMNS} FROM activity_completions \
             WHERE game_id = $1 ORDER BY created_at ASC"
        ))
        .bind(game_id.as_str())
        .fetch_all(&self.pool)
        .await?;
        into_records(rows)
    }

    async fn append(
        &self,
        attempt: NewActivityCompletion,
        now: DateTime<Utc>,
    ) -> Result<ActivityCompletionRecord, EngineError> {
        let mut record = attempt.into_record(0, now);
        let mut tx = self.pool.begin().await?;

        // Appends for the same student and game serialize on this lock until
        // commit, so each one sees every earlier row in its SUM.
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1 || ':' || $2))")
            .bind(record.student_id.as_str())
            .bind(record.game_id.as_str())
            .execute(&mut *tx)
            .await?;

        let total: i64 = sqlx::query_scalar(&format!(
            "INSERT INTO activity_completions ({RECORD_COLUMNS}) \
             SELECT $1, $2, $3, $4, $5, $6, COALESCE(SUM(points), 0) + $6, $7, $8, $9, \
                    $10, $11, $12, $13, $13 \
             FROM activity_completions WHERE student_id = $2 AND game_id = $3 \
             RETURNING total_points"
        ))
        .bind(record.id.as_uuid())
        .bind(record.student_id.as_str())
        .bind(record.game_id.as_str())
        .bind(to_db(record.level, "level")?)
        .bind(to_db(record.activity, "activity")?)
        .bind(i64::from(record.points))
        .bind(to_db(record.attempts, "attempts")?)
        .bind(record.is_completed)
        .bind(to_db(record.max_unlocked_level, "max_unlocked_level")?)
        .bind(record.correct_answers.map(|v| to_db(v, "correct_answers")).transpose()?)
        .bind(record.total_questions.map(|v| to_db(v, "total_questions")).transpose()?)
        .bind(record.completion_time.map(|v| to_db(v, "completion_time")).transpose()?)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        record.total_points = u64::try_from(total).map_err(|_| {
            EngineError::PersistenceError("negative running total".to_string())
        })?;
        Ok(record)
    }
}

#[async_trait]
impl LevelCatalog for PostgresStore {
    async fn levels_for(&self, game_id: &GameId) -> Result<Vec<GameLevel>, EngineError> {
        let rows = sqlx::query_as::<_, GameLevelRow>(
            "SELECT id, game_id, level, name, description, difficulty, activities_count, \
             config, is_active, created_at, updated_at \
             FROM game_levels WHERE game_id = $1 ORDER BY level ASC",
        )
        .bind(game_id.as_str())
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn total_activities(&self, game_id: &GameId) -> Result<u64, EngineError> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(activities_count), 0)::INT8 FROM game_levels WHERE game_id = $1",
        )
        .bind(game_id.as_str())
        .fetch_one(&self.pool)
        .await?;
        u64::try_from(total)
            .map_err(|_| EngineError::PersistenceError("negative activity total".to_string()))
    }

    async fn game_exists(&self, game_id: &GameId) -> Result<bool, EngineError> {
        self.exists(
            "SELECT EXISTS (SELECT 1 FROM games WHERE id = $1)",
            game_id.as_str(),
        )
        .await
    }
}

#[async_trait]
impl CourseDirectory for PostgresStore {
    async fn student_exists(&self, student_id: &StudentId) -> Result<bool, EngineError> {
        self.exists(
            "SELECT EXISTS (SELECT 1 FROM students WHERE id = $1)",
            student_id.as_str(),
        )
        .await
    }

    async fn course_exists(&self, course_id: &CourseId) -> Result<bool, EngineError> {
        self.exists(
            "SELECT EXISTS (SELECT 1 FROM courses WHERE id = $1)",
            course_id.as_str(),
        )
        .await
    }

    async fn enrolled_students(
        &self,
        course_id: &CourseId,
    ) -> Result<Vec<StudentId>, EngineError> {
        let ids = sqlx::query_scalar::<_, String>(
            "SELECT student_id FROM course_students WHERE course_id = $1 ORDER BY student_id",
        )
        .bind(course_id.as_str())
        .fetch_all(&self.pool)
        .await?;
        Ok(ids.into_iter().map(StudentId::new).collect())
    }

    async fn course_games(&self, course_id: &CourseId) -> Result<Vec<CourseGame>, EngineError> {
        let rows = sqlx::query_as::<_, (String, bool)>(
            "SELECT game_id, enabled FROM course_games WHERE course_id = $1 ORDER BY game_id",
        )
        .bind(course_id.as_str())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|(game_id, enabled)| CourseGame {
                game_id: GameId::new(game_id),
                enabled,
            })
            .collect())
    }
}
