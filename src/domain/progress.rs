//! Student progress calculator.
//!
//! Combines the [`metrics`](super::metrics) primitives into the two headline
//! numbers shown for a student and a game: how much of the game has been
//! finished at least once, and which level the student may play next.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use utoipa::ToSchema;

use super::metrics::total_activities;
use super::{ActivityCompletionRecord, GameLevel};

/// Headline progress of one student in one game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct StudentProgress {
    /// Distinct completed activities over total activities, rounded, 0–100.
    pub percentage: u32,
    /// Highest cleared level plus one; at least 1.
    pub max_unlocked_level: u32,
}

impl StudentProgress {
    /// Progress of a student who has done nothing yet.
    pub const NONE: Self = Self {
        percentage: 0,
        max_unlocked_level: 1,
    };
}

impl Default for StudentProgress {
    fn default() -> Self {
        Self::NONE
    }
}

/// Computes percentage and max unlocked level from a student's records for
/// one game and that game's catalog.
///
/// Only positions that exist in the catalog count toward the percentage, so
/// it never exceeds 100. A game without activities yields
/// [`StudentProgress::NONE`].
#[must_use]
pub fn calculate_student_progress(
    records: &[ActivityCompletionRecord],
    levels: &[GameLevel],
) -> StudentProgress {
    let total = total_activities(levels);
    if total == 0 {
        return StudentProgress::NONE;
    }
    StudentProgress {
        percentage: progress_percentage(distinct_completed_in_catalog(records, levels), total),
        max_unlocked_level: calculate_max_unlocked_level(records, levels),
    }
}

/// Distinct completed `(level, activity)` positions that the catalog
/// actually contains.
fn distinct_completed_in_catalog(
    records: &[ActivityCompletionRecord],
    levels: &[GameLevel],
) -> usize {
    let sizes: HashMap<u32, u32> = levels.iter().map(|l| (l.level, l.activities_count)).collect();
    records
        .iter()
        .filter(|r| r.is_completed)
        .filter(|r| {
            sizes
                .get(&r.level)
                .is_some_and(|&count| (1..=count).contains(&r.activity))
        })
        .map(ActivityCompletionRecord::position)
        .collect::<HashSet<_>>()
        .len()
}

/// `round(distinct / total × 100)`; 0 when `total` is 0.
#[must_use]
pub fn progress_percentage(distinct_completed: usize, total: u64) -> u32 {
    if total == 0 {
        return 0;
    }
    let pct = (distinct_completed as f64 / total as f64 * 100.0).round();
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let pct = pct as u32;
    pct
}

/// Highest cleared level plus one.
///
/// A level counts as cleared when its final activity (position
/// `activities_count`) has at least one successful attempt. Levels are
/// checked independently: clearing level 3 does not require levels 1 and 2.
#[must_use]
pub fn calculate_max_unlocked_level(
    records: &[ActivityCompletionRecord],
    levels: &[GameLevel],
) -> u32 {
    let completed: HashSet<(u32, u32)> = records
        .iter()
        .filter(|r| r.is_completed)
        .map(ActivityCompletionRecord::position)
        .collect();

    let highest_cleared = levels
        .iter()
        .filter(|l| l.activities_count > 0)
        .filter(|l| completed.contains(&(l.level, l.activities_count)))
        .map(|l| l.level)
        .max()
        .unwrap_or(0);

    highest_cleared.saturating_add(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::GameId;
    use crate::domain::metrics::fixtures::record;

    fn levels(sizes: &[u32]) -> Vec<GameLevel> {
        sizes
            .iter()
            .zip(1_u32..)
            .map(|(&size, level)| GameLevel::new(GameId::from("sums"), level, size))
            .collect()
    }

    #[test]
    fn repeated_attempts_count_once() {
        let catalog = levels(&[5]);
        let records = vec![record(1, 1, true), record(1, 1, true), record(1, 1, false)];
        let progress = calculate_student_progress(&records, &catalog);
        assert_eq!(progress.percentage, 20);
    }

    #[test]
    fn finishing_last_activity_unlocks_next_level() {
        let catalog = levels(&[2, 1]);
        let records = vec![record(1, 1, true), record(1, 2, true)];
        let progress = calculate_student_progress(&records, &catalog);
        assert_eq!(progress.max_unlocked_level, 2);
        assert_eq!(progress.percentage, 67);
    }

    #[test]
    fn earlier_activities_do_not_clear_a_level() {
        let catalog = levels(&[3]);
        let records = vec![record(1, 1, true), record(1, 2, true)];
        assert_eq!(calculate_max_unlocked_level(&records, &catalog), 1);
    }

    #[test]
    fn failed_final_attempt_does_not_clear() {
        let catalog = levels(&[2]);
        let records = vec![record(1, 2, false)];
        assert_eq!(calculate_max_unlocked_level(&records, &catalog), 1);
    }

    #[test]
    fn levels_are_checked_independently() {
        let catalog = levels(&[2, 2, 2]);
        let records = vec![record(3, 2, true)];
        assert_eq!(calculate_max_unlocked_level(&records, &catalog), 4);
    }

    #[test]
    fn empty_game_yields_no_progress() {
        let progress = calculate_student_progress(&[record(1, 1, true)], &[]);
        assert_eq!(progress, StudentProgress::NONE);
    }

    #[test]
    fn empty_log_yields_level_one() {
        let progress = calculate_student_progress(&[], &levels(&[4, 4]));
        assert_eq!(progress.percentage, 0);
        assert_eq!(progress.max_unlocked_level, 1);
    }

    #[test]
    fn percentage_is_monotonic_and_ignores_duplicates() {
        let catalog = levels(&[3, 3]);
        let mut records = Vec::new();
        let mut last = 0;
        let mut last_level = 1;
        for (level, activity) in [(1, 1), (1, 2), (1, 3), (2, 1), (2, 3), (2, 2)] {
            records.push(record(level, activity, true));
            let progress = calculate_student_progress(&records, &catalog);
            assert!(progress.percentage >= last);
            assert!(progress.max_unlocked_level >= last_level);
            last = progress.percentage;
            last_level = progress.max_unlocked_level;

            records.push(record(level, activity, true));
            assert_eq!(calculate_student_progress(&records, &catalog).percentage, last);
        }
        assert_eq!(last, 100);
        assert_eq!(last_level, 3);
    }

    #[test]
    fn positions_outside_the_catalog_are_ignored() {
        let catalog = levels(&[2]);
        let records = vec![
            record(1, 1, true),
            record(1, 2, true),
            record(1, 3, true),
            record(7, 1, true),
            record(7, 9, true),
        ];
        let progress = calculate_student_progress(&records, &catalog);
        assert_eq!(progress.percentage, 100);
        assert_eq!(progress.max_unlocked_level, 2);

        let stray_only = vec![record(1, 3, true), record(2, 1, true)];
        assert_eq!(calculate_student_progress(&stray_only, &catalog).percentage, 0);
    }

    #[test]
    fn percentage_rounds_half_up() {
        assert_eq!(progress_percentage(1, 8), 13);
        assert_eq!(progress_percentage(1, 3), 33);
        assert_eq!(progress_percentage(0, 0), 0);
    }
}
