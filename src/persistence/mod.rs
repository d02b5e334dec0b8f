//! Persistence layer: read interfaces over the activity log, the level
//! catalog and course membership.
//!
//! The service layer only talks to the [`ActivityLog`], [`LevelCatalog`] and
//! [`CourseDirectory`] traits. Two implementations are provided:
//! [`MemoryStore`] for tests and local runs, and [`PostgresStore`] backed by
//! `sqlx::PgPool`.

pub mod memory;
pub mod models;
pub mod postgres;

use std::fmt::Debug;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub use memory::{MemorySeed, MemoryStore};
pub use postgres::PostgresStore;

use crate::domain::metrics;
use crate::domain::{
    ActivityCompletionRecord, CourseGame, CourseId, GameId, GameLevel, NewActivityCompletion,
    StudentId,
};
use crate::error::EngineError;

/// Append-only log of activity attempts.
#[async_trait]
pub trait ActivityLog: Debug + Send + Sync {
    /// Records of one student, optionally restricted to one game, oldest
    /// first.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::PersistenceError`] on storage failure.
    async fn records_for(
        &self,
        student_id: &StudentId,
        game_id: Option<&GameId>,
    ) -> Result<Vec<ActivityCompletionRecord>, EngineError>;

    /// Records of every student for one game, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::PersistenceError`] on storage failure.
    async fn records_for_game(
        &self,
        game_id: &GameId,
    ) -> Result<Vec<ActivityCompletionRecord>, EngineError>;

    /// Appends one attempt, stamping its id, timestamps and the running
    /// `total_points` snapshot for the student and game.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::PersistenceError`] on storage failure.
    async fn append(
        &self,
        attempt: NewActivityCompletion,
        now: DateTime<Utc>,
    ) -> Result<ActivityCompletionRecord, EngineError>;
}

/// Per-game level metadata.
#[async_trait]
pub trait LevelCatalog: Debug + Send + Sync {
    /// Levels of a game ordered by level number. Empty for unknown games.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::PersistenceError`] on storage failure.
    async fn levels_for(&self, game_id: &GameId) -> Result<Vec<GameLevel>, EngineError>;

    /// Σ `activities_count` over every level of the game.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::PersistenceError`] on storage failure.
    async fn total_activities(&self, game_id: &GameId) -> Result<u64, EngineError> {
        let levels = self.levels_for(game_id).await?;
        Ok(metrics::total_activities(&levels))
    }

    /// Whether the game is known to the platform.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::PersistenceError`] on storage failure.
    async fn game_exists(&self, game_id: &GameId) -> Result<bool, EngineError>;
}

/// Students, courses and what connects them.
#[async_trait]
pub trait CourseDirectory: Debug + Send + Sync {
    /// Whether the student is known to the platform.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::PersistenceError`] on storage failure.
    async fn student_exists(&self, student_id: &StudentId) -> Result<bool, EngineError>;

    /// Whether the course is known to the platform.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::PersistenceError`] on storage failure.
    async fn course_exists(&self, course_id: &CourseId) -> Result<bool, EngineError>;

    /// Students enrolled in the course.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::PersistenceError`] on storage failure.
    async fn enrolled_students(&self, course_id: &CourseId)
    -> Result<Vec<StudentId>, EngineError>;

    /// Every game attached to the course, enabled or not.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::PersistenceError`] on storage failure.
    async fn course_games(&self, course_id: &CourseId) -> Result<Vec<CourseGame>, EngineError>;
}
