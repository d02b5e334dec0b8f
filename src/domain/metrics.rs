//! Metric primitives over a student's records for one game.
//!
//! Every function here is pure: it takes the records (already filtered to a
//! single student and game by the caller) and/or the game's catalog rows and
//! returns a number. Empty input always yields zero, never an error.

use std::collections::HashSet;

use super::{ActivityCompletionRecord, GameLevel};

/// Number of distinct `(level, activity)` pairs with at least one
/// successful attempt.
///
/// Repeated successes at the same activity count once.
#[must_use]
pub fn distinct_completed_activities(records: &[ActivityCompletionRecord]) -> usize {
    records
        .iter()
        .filter(|r| r.is_completed)
        .map(ActivityCompletionRecord::position)
        .collect::<HashSet<_>>()
        .len()
}

/// Total number of activities in a game: Σ `activities_count` over all of
/// its levels, active or not.
#[must_use]
pub fn total_activities(levels: &[GameLevel]) -> u64 {
    levels.iter().map(|l| u64::from(l.activities_count)).sum()
}

/// Share of raw attempts that succeeded, in percent.
///
/// Counts attempts, not distinct activities.
#[must_use]
pub fn completion_rate(records: &[ActivityCompletionRecord]) -> f64 {
    if records.is_empty() {
        return 0.0;
    }
    let completed = records.iter().filter(|r| r.is_completed).count();
    ratio_percent(completed, records.len())
}

/// Mean per-record accuracy, in percent, over records that carry question
/// data.
///
/// Records without questions are left out of both the sum and the count.
#[must_use]
pub fn average_accuracy(records: &[ActivityCompletionRecord]) -> f64 {
    let (sum, count) = records
        .iter()
        .filter_map(ActivityCompletionRecord::accuracy)
        .fold((0.0_f64, 0_usize), |(sum, count), acc| (sum + acc, count + 1));
    if count == 0 {
        return 0.0;
    }
    sum / count as f64
}

/// Record at the furthest `(level, activity)` position, regardless of
/// outcome.
///
/// Ties on the position resolve to the most recently created record.
#[must_use]
pub fn last_completed_activity(
    records: &[ActivityCompletionRecord],
) -> Option<&ActivityCompletionRecord> {
    records
        .iter()
        .max_by_key(|r| (r.level, r.activity, r.created_at))
}

/// Σ of per-attempt `points`.
#[must_use]
pub fn total_points(records: &[ActivityCompletionRecord]) -> u64 {
    records.iter().map(|r| u64::from(r.points)).sum()
}

/// `part / whole × 100`, or 0 when `whole` is zero.
pub(crate) fn ratio_percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    part as f64 / whole as f64 * 100.0
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::{DateTime, Duration, TimeZone, Utc};

    use crate::domain::{ActivityCompletionRecord, GameId, RecordId, StudentId};

    pub(crate) fn epoch() -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0)
            .single()
            .unwrap_or_default()
    }

    /// An attempt by `ana` at `sums`, worth 10 points.
    pub(crate) fn record(level: u32, activity: u32, is_completed: bool) -> ActivityCompletionRecord {
        record_at(level, activity, is_completed, 0)
    }

    pub(crate) fn record_at(
        level: u32,
        activity: u32,
        is_completed: bool,
        minutes: i64,
    ) -> ActivityCompletionRecord {
        let at = epoch() + Duration::minutes(minutes);
        ActivityCompletionRecord {
            id: RecordId::new(),
            student_id: StudentId::from("ana"),
            game_id: GameId::from("sums"),
            level,
            activity,
            points: 10,
            total_points: 10,
            attempts: 1,
            is_completed,
            max_unlocked_level: 1,
            correct_answers: None,
            total_questions: None,
            completion_time: None,
            created_at: at,
            updated_at: at,
        }
    }

    pub(crate) fn with_questions(
        mut record: ActivityCompletionRecord,
        correct: u32,
        total: u32,
    ) -> ActivityCompletionRecord {
        record.correct_answers = Some(correct);
        record.total_questions = Some(total);
        record
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::fixtures::{record, record_at, with_questions};
    use super::*;
    use crate::domain::GameId;

    #[test]
    fn distinct_counts_each_position_once() {
        let records = vec![
            record(1, 1, true),
            record(1, 1, true),
            record(1, 1, false),
            record(1, 2, false),
        ];
        assert_eq!(distinct_completed_activities(&records), 1);
    }

    #[test]
    fn distinct_is_zero_for_empty_log() {
        assert_eq!(distinct_completed_activities(&[]), 0);
    }

    #[test]
    fn total_activities_sums_all_levels() {
        let game = GameId::from("sums");
        let mut inactive = GameLevel::new(game.clone(), 3, 4);
        inactive.is_active = false;
        let levels = vec![
            GameLevel::new(game.clone(), 1, 5),
            GameLevel::new(game, 2, 3),
            inactive,
        ];
        assert_eq!(total_activities(&levels), 12);
        assert_eq!(total_activities(&[]), 0);
    }

    #[test]
    fn completion_rate_uses_raw_attempts() {
        let records = vec![record(1, 1, true), record(1, 1, true), record(1, 1, false)];
        let rate = completion_rate(&records);
        assert!((rate - 200.0 / 3.0).abs() < 1e-9);
        assert!(completion_rate(&[]).abs() < f64::EPSILON);
    }

    #[test]
    fn accuracy_skips_records_without_questions() {
        let records = vec![
            with_questions(record(1, 1, true), 3, 4),
            with_questions(record(1, 2, true), 1, 2),
            record(1, 3, true),
            with_questions(record(1, 4, false), 0, 0),
        ];
        let acc = average_accuracy(&records);
        assert!((acc - 62.5).abs() < 1e-9);
        assert!(average_accuracy(&[record(1, 1, true)]).abs() < f64::EPSILON);
    }

    #[test]
    fn rates_stay_within_percent_bounds() {
        let records = vec![
            with_questions(record(1, 1, true), 5, 5),
            with_questions(record(2, 1, true), 5, 5),
        ];
        assert!((completion_rate(&records) - 100.0).abs() < f64::EPSILON);
        assert!((average_accuracy(&records) - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn last_activity_orders_by_level_then_activity() {
        let records = vec![
            record_at(1, 5, true, 0),
            record_at(2, 1, false, 1),
            record_at(1, 9, true, 2),
        ];
        let Some(last) = last_completed_activity(&records) else {
            panic!("expected a record");
        };
        assert_eq!(last.position(), (2, 1));
        assert!(last_completed_activity(&[]).is_none());
    }

    #[test]
    fn last_activity_prefers_latest_on_tie() {
        let records = vec![record_at(2, 3, false, 0), record_at(2, 3, true, 5)];
        let Some(last) = last_completed_activity(&records) else {
            panic!("expected a record");
        };
        assert!(last.is_completed);
    }

    #[test]
    fn total_points_sums_attempt_points() {
        let records = vec![record(1, 1, true), record(1, 2, false)];
        assert_eq!(total_points(&records), 20);
    }
}
