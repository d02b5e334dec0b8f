//! Activity completion log entries.
//!
//! One [`ActivityCompletionRecord`] is written per attempt and never touched
//! again. Several records may share the same `(student, game, level,
//! activity)` tuple; repeated attempts are expected.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{GameId, RecordId, StudentId};
use crate::error::EngineError;

/// A single attempt by a student at one activity of one game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ActivityCompletionRecord {
    /// Unique record identifier.
    pub id: RecordId,
    /// Student who made the attempt.
    pub student_id: StudentId,
    /// Game the activity belongs to.
    pub game_id: GameId,
    /// Level number, starting at 1.
    pub level: u32,
    /// Position of the activity within its level, starting at 1.
    pub activity: u32,
    /// Score earned by this attempt alone.
    pub points: u32,
    /// Running total for this student and game at write time.
    ///
    /// A snapshot taken when the row was appended; summing it across rows
    /// double-counts earlier attempts.
    pub total_points: u64,
    /// Retry counter supplied by the client.
    pub attempts: u32,
    /// Whether this attempt succeeded.
    pub is_completed: bool,
    /// Unlocked level as reported by the client. Advisory only.
    pub max_unlocked_level: u32,
    /// Correctly answered questions, if the game reports them.
    pub correct_answers: Option<u32>,
    /// Questions asked, if the game reports them.
    pub total_questions: Option<u32>,
    /// Seconds spent on the attempt.
    pub completion_time: Option<u32>,
    /// Insert timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp (equal to `created_at` for log rows).
    pub updated_at: DateTime<Utc>,
}

impl ActivityCompletionRecord {
    /// Accuracy of this attempt in percent.
    ///
    /// `None` when the record carries no question data or asked zero
    /// questions.
    #[must_use]
    pub fn accuracy(&self) -> Option<f64> {
        match (self.correct_answers, self.total_questions) {
            (Some(correct), Some(total)) if total > 0 => {
                Some(f64::from(correct) / f64::from(total) * 100.0)
            }
            _ => None,
        }
    }

    /// The `(level, activity)` position this record refers to.
    #[must_use]
    pub const fn position(&self) -> (u32, u32) {
        (self.level, self.activity)
    }
}

/// Input of the "save statistics" write path.
///
/// The log assigns `id`, `total_points` and the timestamps.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NewActivityCompletion {
    /// Student who made the attempt.
    pub student_id: StudentId,
    /// Game the activity belongs to.
    pub game_id: GameId,
    /// Level number, starting at 1.
    pub level: u32,
    /// Position of the activity within its level, starting at 1.
    pub activity: u32,
    /// Score earned by this attempt.
    #[serde(default)]
    pub points: u32,
    /// Retry counter.
    #[serde(default)]
    pub attempts: u32,
    /// Whether this attempt succeeded.
    pub is_completed: bool,
    /// Unlocked level as seen by the client.
    #[serde(default = "default_unlocked_level")]
    pub max_unlocked_level: u32,
    /// Correctly answered questions.
    #[serde(default)]
    pub correct_answers: Option<u32>,
    /// Questions asked.
    #[serde(default)]
    pub total_questions: Option<u32>,
    /// Seconds spent on the attempt.
    #[serde(default)]
    pub completion_time: Option<u32>,
}

const fn default_unlocked_level() -> u32 {
    1
}

impl NewActivityCompletion {
    /// Checks the structural invariants of an attempt.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidRequest`] when `level` or `activity` is
    /// zero, when only one of the question fields is present, or when more
    /// answers are correct than questions were asked.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.level == 0 {
            return Err(EngineError::InvalidRequest(
                "level must be at least 1".to_string(),
            ));
        }
        if self.activity == 0 {
            return Err(EngineError::InvalidRequest(
                "activity must be at least 1".to_string(),
            ));
        }
        match (self.correct_answers, self.total_questions) {
            (Some(correct), Some(total)) if correct > total => Err(EngineError::InvalidRequest(
                format!("correct_answers ({correct}) exceeds total_questions ({total})"),
            )),
            (Some(_), None) | (None, Some(_)) => Err(EngineError::InvalidRequest(
                "correct_answers and total_questions must be given together".to_string(),
            )),
            _ => Ok(()),
        }
    }

    /// Turns the attempt into a log row.
    ///
    /// `previous_total` is the Σ of `points` already logged for the same
    /// student and game.
    #[must_use]
    pub fn into_record(self, previous_total: u64, now: DateTime<Utc>) -> ActivityCompletionRecord {
        ActivityCompletionRecord {
            id: RecordId::new(),
            total_points: previous_total.saturating_add(u64::from(self.points)),
            student_id: self.student_id,
            game_id: self.game_id,
            level: self.level,
            activity: self.activity,
            points: self.points,
            attempts: self.attempts,
            is_completed: self.is_completed,
            max_unlocked_level: self.max_unlocked_level.max(1),
            correct_answers: self.correct_answers,
            total_questions: self.total_questions,
            completion_time: self.completion_time,
            created_at: now,
            updated_at: now,
        }
    }
}
