//! # progress-engine
//!
//! Progress and statistics aggregation for an arithmetic games learning
//! platform.
//!
//! Students attempt activities grouped into levels of a game; every attempt
//! is appended to an immutable activity completion log. This crate turns
//! that log, together with each game's level catalog, into a student's
//! unlocked level and completion percentage, per-student dashboards across
//! games, and course-wide and game-wide rollups. Every figure is recomputed
//! from the full log on request.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP)
//!     │
//!     ├── REST Handlers (api/)
//!     │
//!     ├── ProgressService (service/)
//!     │
//!     ├── Metrics · Calculator · Aggregator (domain/)
//!     │
//!     └── ActivityLog · LevelCatalog · CourseDirectory (persistence/)
//!             ├── MemoryStore
//!             └── PostgreSQL
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod persistence;
pub mod service;
