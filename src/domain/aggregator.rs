//! Statistics aggregator.
//!
//! Folds a student's full record set, across all games, into per-game
//! summaries and overall totals. The aggregator has no access to the level
//! catalog, so each game's `average_score` is left at 0 for callers that do
//! (see `ProgressService::get_student_statistics`).

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::{ActivityCompletionRecord, GameId};

/// Summary of one student's activity in one game.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct GameProgress {
    /// Successful attempts (not distinct activities).
    pub completed: u32,
    /// Σ of `completion_time` in seconds; absent times count as 0.
    pub total_time: u64,
    /// Progress percentage, filled in by callers with catalog access.
    pub average_score: u32,
    /// Σ of the per-record `attempts` counters.
    pub total_attempts: u64,
}

/// Aggregated statistics for one student across every game they played.
#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct StudentStatistics {
    /// Per-game summaries keyed by game.
    pub progress_by_game: BTreeMap<GameId, GameProgress>,
    /// Number of distinct games with at least one record.
    pub total_games_played: usize,
    /// Mean of `points` over every record of every game.
    pub average_score: f64,
    /// Latest `created_at` among all records.
    pub last_activity: Option<DateTime<Utc>>,
}

/// Aggregates a student's records.
#[must_use]
pub fn aggregate(records: &[ActivityCompletionRecord]) -> StudentStatistics {
    let mut progress_by_game: BTreeMap<GameId, GameProgress> = BTreeMap::new();
    for record in records {
        let entry = progress_by_game.entry(record.game_id.clone()).or_default();
        if record.is_completed {
            entry.completed = entry.completed.saturating_add(1);
        }
        entry.total_time = entry
            .total_time
            .saturating_add(u64::from(record.completion_time.unwrap_or(0)));
        entry.total_attempts = entry
            .total_attempts
            .saturating_add(u64::from(record.attempts));
    }

    let games: HashSet<&GameId> = records.iter().map(|r| &r.game_id).collect();

    let average_score = if records.is_empty() {
        0.0
    } else {
        let points: u64 = records.iter().map(|r| u64::from(r.points)).sum();
        points as f64 / records.len() as f64
    };

    StudentStatistics {
        progress_by_game,
        total_games_played: games.len(),
        average_score,
        last_activity: records.iter().map(|r| r.created_at).max(),
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::metrics::fixtures::{epoch, record_at};

    #[test]
    fn empty_log_aggregates_to_zero() {
        let stats = aggregate(&[]);
        assert_eq!(stats.total_games_played, 0);
        assert!(stats.average_score.abs() < f64::EPSILON);
        assert!(stats.last_activity.is_none());
        assert!(stats.progress_by_game.is_empty());
    }

    #[test]
    fn groups_by_game() {
        let mut a = record_at(1, 1, true, 0);
        a.completion_time = Some(40);
        a.attempts = 2;
        let mut b = record_at(1, 2, false, 3);
        b.completion_time = None;
        b.attempts = 1;
        let mut c = record_at(1, 1, true, 7);
        c.game_id = GameId::from("times");
        c.points = 40;
        c.completion_time = Some(15);

        let stats = aggregate(&[a, b, c]);
        assert_eq!(stats.total_games_played, 2);

        let Some(sums) = stats.progress_by_game.get(&GameId::from("sums")) else {
            panic!("missing game");
        };
        assert_eq!(sums.completed, 1);
        assert_eq!(sums.total_time, 40);
        assert_eq!(sums.total_attempts, 3);
        assert_eq!(sums.average_score, 0);

        let Some(times) = stats.progress_by_game.get(&GameId::from("times")) else {
            panic!("missing game");
        };
        assert_eq!(times.completed, 1);
        assert_eq!(times.total_time, 15);
    }

    #[test]
    fn average_score_pools_every_record() {
        let a = record_at(1, 1, true, 0);
        let mut b = record_at(1, 2, true, 1);
        b.points = 30;
        let mut c = record_at(1, 1, true, 2);
        c.game_id = GameId::from("times");
        c.points = 50;

        let stats = aggregate(&[a, b, c]);
        assert!((stats.average_score - 30.0).abs() < 1e-9);
    }

    #[test]
    fn last_activity_is_latest_created_at() {
        let records = vec![record_at(3, 1, true, 10), record_at(1, 1, true, 60)];
        let stats = aggregate(&records);
        assert_eq!(
            stats.last_activity,
            Some(epoch() + chrono::Duration::minutes(60))
        );
    }
}
