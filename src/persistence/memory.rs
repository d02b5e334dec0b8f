//! In-memory implementation of every repository trait.
//!
//! All state lives behind a single [`tokio::sync::RwLock`]. Reads take the
//! shared lock; appends take the exclusive lock so the running
//! `total_points` snapshot is computed and written atomically.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tokio::sync::RwLock;

use super::{ActivityLog, CourseDirectory, LevelCatalog};
use crate::domain::{
    ActivityCompletionRecord, CourseGame, CourseId, GameId, GameLevel, NewActivityCompletion,
    StudentId,
};
use crate::error::EngineError;

/// Process-local store for students, games, courses and the activity log.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

#[derive(Debug, Default)]
struct MemoryState {
    students: BTreeSet<StudentId>,
    levels: BTreeMap<GameId, Vec<GameLevel>>,
    courses: BTreeMap<CourseId, CourseMembers>,
    records: Vec<ActivityCompletionRecord>,
}

#[derive(Debug, Default)]
struct CourseMembers {
    students: Vec<StudentId>,
    games: Vec<CourseGame>,
}

/// Seed document for the in-memory backend.
///
/// ```json
/// {
///   "students": ["ana"],
///   "games": [{ "game_id": "sums", "levels": [5, 5, 8] }],
///   "courses": [{ "course_id": "4b", "students": ["ana"], "games": [{ "game_id": "sums", "enabled": true }] }]
/// }
/// ```
#[derive(Debug, Default, Deserialize)]
pub struct MemorySeed {
    /// Known students.
    #[serde(default)]
    pub students: Vec<StudentId>,
    /// Known games with their level sizes.
    #[serde(default)]
    pub games: Vec<SeedGame>,
    /// Courses with enrolment and attached games.
    #[serde(default)]
    pub courses: Vec<SeedCourse>,
}

/// A game in a [`MemorySeed`].
#[derive(Debug, Deserialize)]
pub struct SeedGame {
    /// Game identifier.
    pub game_id: GameId,
    /// `activities_count` of levels 1, 2, … in order.
    #[serde(default)]
    pub levels: Vec<u32>,
}

/// A course in a [`MemorySeed`].
#[derive(Debug, Deserialize)]
pub struct SeedCourse {
    /// Course identifier.
    pub course_id: CourseId,
    /// Enrolled students.
    #[serde(default)]
    pub students: Vec<StudentId>,
    /// Attached games.
    #[serde(default)]
    pub games: Vec<CourseGame>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from a seed document.
    pub async fn from_seed(seed: MemorySeed) -> Self {
        let store = Self::new();
        for student in seed.students {
            store.add_student(student).await;
        }
        for game in seed.games {
            let levels = game
                .levels
                .iter()
                .zip(1_u32..)
                .map(|(&count, level)| GameLevel::new(game.game_id.clone(), level, count))
                .collect();
            store.add_game(game.game_id, levels).await;
        }
        for course in seed.courses {
            store.add_course(course.course_id.clone()).await;
            for student in course.students {
                store.enroll(&course.course_id, student).await;
            }
            for game in course.games {
                store.attach_game(&course.course_id, game).await;
            }
        }
        store
    }

    /// Reads a JSON seed document from disk.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Internal`] if the file cannot be read or is not
    /// a valid seed document.
    pub async fn load_seed(path: &Path) -> Result<Self, EngineError> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| EngineError::Internal(format!("reading {}: {e}", path.display())))?;
        let seed: MemorySeed = serde_json::from_str(&raw)
            .map_err(|e| EngineError::Internal(format!("parsing {}: {e}", path.display())))?;
        Ok(Self::from_seed(seed).await)
    }

    /// Registers a student.
    pub async fn add_student(&self, student_id: StudentId) {
        self.state.write().await.students.insert(student_id);
    }

    /// Registers a game, replacing any previous level catalog for it.
    pub async fn add_game(&self, game_id: GameId, mut levels: Vec<GameLevel>) {
        levels.sort_by_key(|l| l.level);
        self.state.write().await.levels.insert(game_id, levels);
    }

    /// Registers an empty course.
    pub async fn add_course(&self, course_id: CourseId) {
        self.state.write().await.courses.entry(course_id).or_default();
    }

    /// Enrols a student in a course, creating the course if needed.
    pub async fn enroll(&self, course_id: &CourseId, student_id: StudentId) {
        let mut state = self.state.write().await;
        let members = state.courses.entry(course_id.clone()).or_default();
        if !members.students.contains(&student_id) {
            members.students.push(student_id);
        }
    }

    /// Attaches a game to a course, creating the course if needed.
    pub async fn attach_game(&self, course_id: &CourseId, game: CourseGame) {
        let mut state = self.state.write().await;
        let members = state.courses.entry(course_id.clone()).or_default();
        members.games.retain(|g| g.game_id != game.game_id);
        members.games.push(game);
    }

    /// Inserts a fully formed record, bypassing the running-total logic.
    ///
    /// Used to replay historical rows whose snapshots were computed
    /// elsewhere.
    pub async fn insert_record(&self, record: ActivityCompletionRecord) {
        self.state.write().await.records.push(record);
    }

    /// Number of records in the log.
    pub async fn record_count(&self) -> usize {
        self.state.read().await.records.len()
    }
}

#[async_trait]
impl ActivityLog for MemoryStore {
    async fn records_for(
        &self,
        student_id: &StudentId,
        game_id: Option<&GameId>,
    ) -> Result<Vec<ActivityCompletionRecord>, EngineError> {
        let state = self.state.read().await;
        Ok(state
            .records
            .iter()
            .filter(|r| &r.student_id == student_id)
            .filter(|r| game_id.is_none_or(|g| &r.game_id == g))
            .cloned()
            .collect())
    }

    async fn records_for_game(
        &self,
        game_id: &GameId,
    ) -> Result<Vec<ActivityCompletionRecord>, EngineError> {
        let state = self.state.read().await;
        Ok(state
            .records
            .iter()
            .filter(|r| &r.game_id == game_id)
            .cloned()
            .collect())
    }

    async fn append(
        &self,
        attempt: NewActivityCompletion,
        now: DateTime<Utc>,
    ) -> Result<ActivityCompletionRecord, EngineError> {
        let mut state = self.state.write().await;
        let previous: u64 = state
            .records
            .iter()
            .filter(|r| r.student_id == attempt.student_id && r.game_id == attempt.game_id)
            .map(|r| u64::from(r.points))
            .sum();
        let record = attempt.into_record(previous, now);
        state.records.push(record.clone());
        Ok(record)
    }
}

#[async_trait]
impl LevelCatalog for MemoryStore {
    async fn levels_for(&self, game_id: &GameId) -> Result<Vec<GameLevel>, EngineError> {
        let state = self.state.read().await;
        Ok(state.levels.get(game_id).cloned().unwrap_or_default())
    }

    async fn game_exists(&self, game_id: &GameId) -> Result<bool, EngineError> {
        Ok(self.state.read().await.levels.contains_key(game_id))
    }
}

#[async_trait]
impl CourseDirectory for MemoryStore {
    async fn student_exists(&self, student_id: &StudentId) -> Result<bool, EngineError> {
        Ok(self.state.read().await.students.contains(student_id))
    }

    async fn course_exists(&self, course_id: &CourseId) -> Result<bool, EngineError> {
        Ok(self.state.read().await.courses.contains_key(course_id))
    }

    async fn enrolled_students(
        &self,
        course_id: &CourseId,
    ) -> Result<Vec<StudentId>, EngineError> {
        let state = self.state.read().await;
        Ok(state
            .courses
            .get(course_id)
            .map(|c| c.students.clone())
            .unwrap_or_default())
    }

    async fn course_games(&self, course_id: &CourseId) -> Result<Vec<CourseGame>, EngineError> {
        let state = self.state.read().await;
        Ok(state
            .courses
            .get(course_id)
            .map(|c| c.games.clone())
            .unwrap_or_default())
    }
}
