//! Domain layer: identifiers, log rows, catalog rows and the pure metric
//! computations over them.
//!
//! Nothing in here performs I/O. The [`metrics`] primitives, the
//! [`progress`] calculator and the [`aggregator`] fold slices of records
//! that the service layer fetched through the repository traits.

pub mod activity_record;
pub mod aggregator;
pub mod course;
pub mod game_level;
pub mod ids;
pub mod metrics;
pub mod progress;

pub use activity_record::{ActivityCompletionRecord, NewActivityCompletion};
pub use aggregator::{GameProgress, StudentStatistics};
pub use course::CourseGame;
pub use game_level::GameLevel;
pub use ids::{CourseId, GameId, RecordId, StudentId};
pub use progress::StudentProgress;
