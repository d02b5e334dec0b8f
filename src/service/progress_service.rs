//! Progress service: per-student queries and course/game rollups.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::Utc;
use futures_util::stream::{self, StreamExt};

use super::reports::{
    CourseGameEntry, CourseGameProgress, CourseStudentProgress, GameProgressReport,
    GameStatistics, LastActivity, StudentGameStatistics,
};
use crate::domain::metrics;
use crate::domain::progress::calculate_student_progress;
use crate::domain::{
    ActivityCompletionRecord, CourseGame, CourseId, GameId, GameLevel, NewActivityCompletion,
    StudentId, StudentProgress, StudentStatistics, aggregator,
};
use crate::error::EngineError;
use crate::persistence::{ActivityLog, CourseDirectory, LevelCatalog};

/// Default bound on concurrent per-student computations in a rollup.
pub const DEFAULT_ROLLUP_CONCURRENCY: usize = 16;

/// Read-side orchestration for progress and statistics.
///
/// Stateless: every query is a fresh fold over the activity log. The
/// repositories are injected, so the same service runs over PostgreSQL in
/// production and over [`MemoryStore`](crate::persistence::MemoryStore) in
/// tests.
///
/// Rollups fan out one computation per student. A failing student is logged
/// and counted as zero; failing to load the course itself aborts the query.
#[derive(Debug, Clone)]
pub struct ProgressService {
    log: Arc<dyn ActivityLog>,
    catalog: Arc<dyn LevelCatalog>,
    directory: Arc<dyn CourseDirectory>,
    rollup_concurrency: usize,
}

impl ProgressService {
    /// Creates a service over the given repositories.
    #[must_use]
    pub fn new(
        log: Arc<dyn ActivityLog>,
        catalog: Arc<dyn LevelCatalog>,
        directory: Arc<dyn CourseDirectory>,
    ) -> Self {
        Self {
            log,
            catalog,
            directory,
            rollup_concurrency: DEFAULT_ROLLUP_CONCURRENCY,
        }
    }

    /// Creates a service over a single store implementing every repository.
    #[must_use]
    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: ActivityLog + LevelCatalog + CourseDirectory + 'static,
    {
        let log: Arc<dyn ActivityLog> = Arc::clone(&store) as Arc<dyn ActivityLog>;
        let catalog: Arc<dyn LevelCatalog> = Arc::clone(&store) as Arc<dyn LevelCatalog>;
        Self::new(log, catalog, store)
    }

    /// Sets the bound on concurrent per-student computations (minimum 1).
    #[must_use]
    pub fn with_rollup_concurrency(mut self, concurrency: usize) -> Self {
        self.rollup_concurrency = concurrency.max(1);
        self
    }

    /// Percentage and max unlocked level of one student in one game.
    ///
    /// A game with no activities short-circuits to
    /// [`StudentProgress::NONE`] without reading the log. Does not check
    /// that the student or game exist; see
    /// [`student_game_progress`](Self::student_game_progress).
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::PersistenceError`] if a repository read fails.
    pub async fn calculate_student_progress(
        &self,
        student_id: &StudentId,
        game_id: &GameId,
    ) -> Result<StudentProgress, EngineError> {
        if self.catalog.total_activities(game_id).await? == 0 {
            return Ok(StudentProgress::NONE);
        }
        let levels = self.catalog.levels_for(game_id).await?;
        let records = self.log.records_for(student_id, Some(game_id)).await?;
        Ok(calculate_student_progress(&records, &levels))
    }

    /// [`calculate_student_progress`](Self::calculate_student_progress) for
    /// a known student and game.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::StudentNotFound`] or
    /// [`EngineError::GameNotFound`] for unknown ids, or a persistence error.
    pub async fn student_game_progress(
        &self,
        student_id: &StudentId,
        game_id: &GameId,
    ) -> Result<StudentProgress, EngineError> {
        self.ensure_student(student_id).await?;
        self.ensure_game(game_id).await?;
        self.calculate_student_progress(student_id, game_id).await
    }

    /// Per-game progress reports for a student.
    ///
    /// Without `game_id`, one report per game the student has records for.
    /// With `game_id`, exactly one report, zero-valued if the student never
    /// played it.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::StudentNotFound`] or
    /// [`EngineError::GameNotFound`] for unknown ids, or a persistence error.
    pub async fn get_student_progress(
        &self,
        student_id: &StudentId,
        game_id: Option<&GameId>,
    ) -> Result<Vec<GameProgressReport>, EngineError> {
        self.ensure_student(student_id).await?;
        if let Some(game_id) = game_id {
            self.ensure_game(game_id).await?;
        }

        let records = self.log.records_for(student_id, game_id).await?;
        let mut by_game: BTreeMap<GameId, Vec<ActivityCompletionRecord>> = BTreeMap::new();
        if let Some(game_id) = game_id {
            by_game.entry(game_id.clone()).or_default();
        }
        for record in records {
            by_game.entry(record.game_id.clone()).or_default().push(record);
        }

        let mut reports = Vec::with_capacity(by_game.len());
        for (game_id, records) in by_game {
            let levels = self.catalog.levels_for(&game_id).await?;
            reports.push(game_report(game_id, records, &levels));
        }
        Ok(reports)
    }

    /// Aggregated statistics for a student across every game played, with
    /// each game's `average_score` set to the student's progress percentage.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::StudentNotFound`] for unknown students, or a
    /// persistence error.
    pub async fn get_student_statistics(
        &self,
        student_id: &StudentId,
    ) -> Result<StudentStatistics, EngineError> {
        self.ensure_student(student_id).await?;
        let records = self.log.records_for(student_id, None).await?;
        let mut stats = aggregator::aggregate(&records);
        let by_game = group_by_game(records);

        for (game_id, summary) in &mut stats.progress_by_game {
            let levels = self.catalog.levels_for(game_id).await?;
            let game_records = by_game.get(game_id).map_or(&[][..], Vec::as_slice);
            summary.average_score = calculate_student_progress(game_records, &levels).percentage;
        }
        Ok(stats)
    }

    /// Course-wide average progress for every enabled game of a course.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::CourseNotFound`] for unknown courses, or a
    /// persistence error if enrolment or the course's games cannot be read.
    /// Failures for individual students or games are logged and reported as
    /// zero instead.
    pub async fn get_course_progress_by_game(
        &self,
        course_id: &CourseId,
    ) -> Result<Vec<CourseGameProgress>, EngineError> {
        self.ensure_course(course_id).await?;
        let students = self.directory.enrolled_students(course_id).await?;
        let games = self.directory.course_games(course_id).await?;

        let mut rows = Vec::with_capacity(games.len());
        for game in games.into_iter().filter(|g| g.enabled) {
            rows.push(self.course_game_progress(game.game_id, &students).await);
        }

        tracing::info!(
            %course_id,
            games = rows.len(),
            students = students.len(),
            "course progress computed"
        );
        Ok(rows)
    }

    /// Every enrolled student's progress in every game attached to a course.
    ///
    /// Games a student never played appear with zeroed counters.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::CourseNotFound`] for unknown courses, or a
    /// persistence error if enrolment or the course's games cannot be read.
    pub async fn get_course_student_progress(
        &self,
        course_id: &CourseId,
    ) -> Result<Vec<CourseStudentProgress>, EngineError> {
        self.ensure_course(course_id).await?;
        let students = self.directory.enrolled_students(course_id).await?;
        let games = self.directory.course_games(course_id).await?;

        let mut levels_by_game: HashMap<GameId, Vec<GameLevel>> =
            HashMap::with_capacity(games.len());
        for game in &games {
            let levels = match self.catalog.levels_for(&game.game_id).await {
                Ok(levels) => levels,
                Err(err) => {
                    tracing::warn!(
                        game_id = %game.game_id,
                        error = %err,
                        "level catalog unavailable; reporting zero progress"
                    );
                    Vec::new()
                }
            };
            levels_by_game.insert(game.game_id.clone(), levels);
        }

        let pending: Vec<_> = students
            .into_iter()
            .map(|student_id| self.student_course_view(student_id, &games, &levels_by_game))
            .collect();
        let views: Vec<CourseStudentProgress> = stream::iter(pending)
            .buffered(self.rollup_concurrency)
            .collect()
            .await;

        tracing::info!(%course_id, students = views.len(), "course student progress computed");
        Ok(views)
    }

    /// Game-wide statistics across every student with records for the game.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::GameNotFound`] for unknown games, or a
    /// persistence error.
    pub async fn get_game_statistics(
        &self,
        game_id: &GameId,
    ) -> Result<GameStatistics, EngineError> {
        self.ensure_game(game_id).await?;
        let records = self.log.records_for_game(game_id).await?;

        let completion_rate = metrics::completion_rate(&records);
        let average_accuracy = metrics::average_accuracy(&records);

        let mut by_student: BTreeMap<StudentId, Vec<ActivityCompletionRecord>> = BTreeMap::new();
        for record in records {
            by_student
                .entry(record.student_id.clone())
                .or_default()
                .push(record);
        }

        let per_student: Vec<StudentGameStatistics> = by_student
            .into_iter()
            .filter_map(|(student_id, records)| student_game_line(student_id, &records))
            .collect();

        let average_points = if per_student.is_empty() {
            0.0
        } else {
            let sum: u64 = per_student.iter().map(|s| s.max_cumulative_points).sum();
            sum as f64 / per_student.len() as f64
        };

        Ok(GameStatistics {
            game_id: game_id.clone(),
            total_students: per_student.len(),
            average_points,
            average_accuracy,
            completion_rate,
            per_student,
        })
    }

    /// Validates and appends one attempt, returning the stored record and the
    /// student's progress in that game afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidRequest`] for malformed attempts or
    /// positions the game's catalog does not contain,
    /// [`EngineError::StudentNotFound`] or [`EngineError::GameNotFound`] for
    /// unknown ids, or a persistence error.
    pub async fn record_completion(
        &self,
        attempt: NewActivityCompletion,
    ) -> Result<(ActivityCompletionRecord, StudentProgress), EngineError> {
        attempt.validate()?;
        self.ensure_student(&attempt.student_id).await?;
        self.ensure_game(&attempt.game_id).await?;

        let levels = self.catalog.levels_for(&attempt.game_id).await?;
        ensure_in_catalog(&attempt, &levels)?;

        let record = self.log.append(attempt, Utc::now()).await?;
        let records = self
            .log
            .records_for(&record.student_id, Some(&record.game_id))
            .await?;
        let progress = calculate_student_progress(&records, &levels);

        if record.max_unlocked_level != progress.max_unlocked_level {
            tracing::debug!(
                student_id = %record.student_id,
                game_id = %record.game_id,
                client_level = record.max_unlocked_level,
                computed_level = progress.max_unlocked_level,
                "client unlocked level differs from computed level"
            );
        }
        tracing::info!(
            record_id = %record.id,
            student_id = %record.student_id,
            game_id = %record.game_id,
            level = record.level,
            activity = record.activity,
            completed = record.is_completed,
            "activity completion recorded"
        );
        Ok((record, progress))
    }

    /// Whether the course directory answers a probe query.
    pub async fn storage_reachable(&self) -> bool {
        match self.directory.course_exists(&CourseId::new("health-probe")).await {
            Ok(_) => true,
            Err(err) => {
                tracing::warn!(error = %err, "storage probe failed");
                false
            }
        }
    }

    async fn course_game_progress(
        &self,
        game_id: GameId,
        students: &[StudentId],
    ) -> CourseGameProgress {
        let levels = match self.catalog.levels_for(&game_id).await {
            Ok(levels) => levels,
            Err(err) => {
                tracing::warn!(%game_id, error = %err, "failed to load levels; reporting zero progress");
                return CourseGameProgress::empty(game_id, students.len());
            }
        };
        if metrics::total_activities(&levels) == 0 {
            return CourseGameProgress::empty(game_id, students.len());
        }

        let pending: Vec<_> = students
            .iter()
            .map(|student_id| self.percentage_or_zero(student_id, &game_id, &levels))
            .collect();
        let percentages: Vec<u32> = stream::iter(pending)
            .buffer_unordered(self.rollup_concurrency)
            .collect()
            .await;

        CourseGameProgress {
            average_progress: mean_rounded(&percentages),
            total_students: students.len(),
            students_with_progress: percentages.iter().filter(|&&p| p > 0).count(),
            game_id,
        }
    }

    async fn percentage_or_zero(
        &self,
        student_id: &StudentId,
        game_id: &GameId,
        levels: &[GameLevel],
    ) -> u32 {
        match self.log.records_for(student_id, Some(game_id)).await {
            Ok(records) => calculate_student_progress(&records, levels).percentage,
            Err(err) => {
                tracing::warn!(%student_id, %game_id, error = %err, "student progress failed; counting as 0");
                0
            }
        }
    }

    async fn student_course_view(
        &self,
        student_id: StudentId,
        games: &[CourseGame],
        levels_by_game: &HashMap<GameId, Vec<GameLevel>>,
    ) -> CourseStudentProgress {
        let records = match self.log.records_for(&student_id, None).await {
            Ok(records) => records,
            Err(err) => {
                tracing::warn!(%student_id, error = %err, "student records unavailable; reporting zero progress");
                Vec::new()
            }
        };
        let stats = aggregator::aggregate(&records);
        let by_game = group_by_game(records);

        let games = games
            .iter()
            .map(|game| {
                let mut progress = stats
                    .progress_by_game
                    .get(&game.game_id)
                    .copied()
                    .unwrap_or_default();
                let game_records = by_game.get(&game.game_id).map_or(&[][..], Vec::as_slice);
                let levels = levels_by_game
                    .get(&game.game_id)
                    .map_or(&[][..], Vec::as_slice);
                progress.average_score = calculate_student_progress(game_records, levels).percentage;
                CourseGameEntry {
                    game_id: game.game_id.clone(),
                    enabled: game.enabled,
                    progress,
                }
            })
            .collect();

        CourseStudentProgress { student_id, games }
    }

    async fn ensure_student(&self, student_id: &StudentId) -> Result<(), EngineError> {
        if self.directory.student_exists(student_id).await? {
            Ok(())
        } else {
            tracing::debug!(%student_id, "unknown student");
            Err(EngineError::StudentNotFound(student_id.to_string()))
        }
    }

    async fn ensure_game(&self, game_id: &GameId) -> Result<(), EngineError> {
        if self.catalog.game_exists(game_id).await? {
            Ok(())
        } else {
            tracing::debug!(%game_id, "unknown game");
            Err(EngineError::GameNotFound(game_id.to_string()))
        }
    }

    async fn ensure_course(&self, course_id: &CourseId) -> Result<(), EngineError> {
        if self.directory.course_exists(course_id).await? {
            Ok(())
        } else {
            tracing::debug!(%course_id, "unknown course");
            Err(EngineError::CourseNotFound(course_id.to_string()))
        }
    }
}

fn ensure_in_catalog(
    attempt: &NewActivityCompletion,
    levels: &[GameLevel],
) -> Result<(), EngineError> {
    let Some(level) = levels.iter().find(|l| l.level == attempt.level) else {
        return Err(EngineError::InvalidRequest(format!(
            "game {} has no level {}",
            attempt.game_id, attempt.level
        )));
    };
    if attempt.activity > level.activities_count {
        return Err(EngineError::InvalidRequest(format!(
            "level {} of game {} has {} activities, got activity {}",
            attempt.level, attempt.game_id, level.activities_count, attempt.activity
        )));
    }
    Ok(())
}

fn game_report(
    game_id: GameId,
    records: Vec<ActivityCompletionRecord>,
    levels: &[GameLevel],
) -> GameProgressReport {
    let progress = calculate_student_progress(&records, levels);
    GameProgressReport {
        game_id,
        max_unlocked_level: progress.max_unlocked_level,
        progress_percentage: progress.percentage,
        total_points: metrics::total_points(&records),
        completion_rate: metrics::completion_rate(&records),
        average_accuracy: metrics::average_accuracy(&records),
        last_activity: metrics::last_completed_activity(&records).map(LastActivity::from),
        records,
    }
}

fn student_game_line(
    student_id: StudentId,
    records: &[ActivityCompletionRecord],
) -> Option<StudentGameStatistics> {
    let most_advanced = records
        .iter()
        .max_by_key(|r| (r.max_unlocked_level, r.created_at))?;
    Some(StudentGameStatistics {
        max_unlocked_level: most_advanced.max_unlocked_level,
        level: most_advanced.level,
        activity: most_advanced.activity,
        last_played: most_advanced.created_at,
        max_cumulative_points: records.iter().map(|r| r.total_points).max().unwrap_or(0),
        total_points: metrics::total_points(records),
        attempts: records.len(),
        completion_rate: metrics::completion_rate(records),
        average_accuracy: metrics::average_accuracy(records),
        student_id,
    })
}

fn group_by_game(
    records: Vec<ActivityCompletionRecord>,
) -> HashMap<GameId, Vec<ActivityCompletionRecord>> {
    let mut by_game: HashMap<GameId, Vec<ActivityCompletionRecord>> = HashMap::new();
    for record in records {
        by_game.entry(record.game_id.clone()).or_default().push(record);
    }
    by_game
}

/// Rounded arithmetic mean; 0 for an empty slice.
fn mean_rounded(values: &[u32]) -> u32 {
    if values.is_empty() {
        return 0;
    }
    let sum: u64 = values.iter().map(|&v| u64::from(v)).sum();
    let mean = (sum as f64 / values.len() as f64).round();
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let mean = mean as u32;
    mean
}
