//! Values returned by [`ProgressService`](super::ProgressService) queries.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{ActivityCompletionRecord, GameId, GameProgress, StudentId};

/// Where a student last got to in a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct LastActivity {
    /// Level of the furthest attempt.
    pub level: u32,
    /// Activity of the furthest attempt.
    pub activity: u32,
    /// Whether that attempt succeeded.
    pub is_completed: bool,
    /// When it was made.
    pub created_at: DateTime<Utc>,
}

impl From<&ActivityCompletionRecord> for LastActivity {
    fn from(record: &ActivityCompletionRecord) -> Self {
        Self {
            level: record.level,
            activity: record.activity,
            is_completed: record.is_completed,
            created_at: record.created_at,
        }
    }
}

/// One student's standing in one game.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct GameProgressReport {
    /// Game reported on.
    pub game_id: GameId,
    /// Level the student may play next, recomputed from the log.
    pub max_unlocked_level: u32,
    /// Share of the game finished at least once, 0–100.
    pub progress_percentage: u32,
    /// Σ of per-attempt points.
    pub total_points: u64,
    /// Successful attempts over all attempts, 0–100.
    pub completion_rate: f64,
    /// Mean accuracy over attempts with question data, 0–100.
    pub average_accuracy: f64,
    /// Furthest position reached, if any attempt exists.
    pub last_activity: Option<LastActivity>,
    /// Raw attempts, oldest first.
    pub records: Vec<ActivityCompletionRecord>,
}

/// Course-wide progress in one game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct CourseGameProgress {
    /// Game reported on.
    pub game_id: GameId,
    /// Rounded mean of every enrolled student's progress percentage.
    pub average_progress: u32,
    /// Enrolled students.
    pub total_students: usize,
    /// Students with a percentage above zero.
    pub students_with_progress: usize,
}

impl CourseGameProgress {
    /// A row for a game nobody can make progress in.
    #[must_use]
    pub fn empty(game_id: GameId, total_students: usize) -> Self {
        Self {
            game_id,
            average_progress: 0,
            total_students,
            students_with_progress: 0,
        }
    }
}

/// One game inside a per-student course view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct CourseGameEntry {
    /// Attached game.
    pub game_id: GameId,
    /// Whether the course currently offers it.
    pub enabled: bool,
    /// Aggregated activity; all zero for games never played.
    pub progress: GameProgress,
}

/// A student's progress across every game attached to a course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct CourseStudentProgress {
    /// Enrolled student.
    pub student_id: StudentId,
    /// One entry per attached game, in course order.
    pub games: Vec<CourseGameEntry>,
}

/// Per-student line of a game-wide report.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct StudentGameStatistics {
    /// Student reported on.
    pub student_id: StudentId,
    /// Client-asserted level of the student's most advanced record.
    pub max_unlocked_level: u32,
    /// Level of that record.
    pub level: u32,
    /// Activity of that record.
    pub activity: u32,
    /// When that record was written.
    pub last_played: DateTime<Utc>,
    /// Highest running-total snapshot among the student's records.
    pub max_cumulative_points: u64,
    /// Σ of per-attempt points.
    pub total_points: u64,
    /// Attempts logged.
    pub attempts: usize,
    /// Successful attempts over all attempts, 0–100.
    pub completion_rate: f64,
    /// Mean accuracy over attempts with question data, 0–100.
    pub average_accuracy: f64,
}

/// Game-wide statistics across every student who played.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct GameStatistics {
    /// Game reported on.
    pub game_id: GameId,
    /// Distinct students with at least one record.
    pub total_students: usize,
    /// Mean of each student's highest running-total snapshot.
    pub average_points: f64,
    /// Accuracy pooled over every record with question data.
    pub average_accuracy: f64,
    /// Completion rate pooled over every attempt.
    pub completion_rate: f64,
    /// One line per student, ordered by student id.
    pub per_student: Vec<StudentGameStatistics>,
}
