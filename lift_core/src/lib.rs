#![forbid(unsafe_code)]

//! Core domain model and progression analytics for Lift.
//!
//! This crate provides:
//! - Domain types (workout logs, snapshots, trend points, metrics)
//! - Rep/load parsing and e1rm estimation
//! - Snapshot aggregation and analytics merging
//! - Persistence (workout journal, snapshot table, adherence table)
//! - Configuration and logging

pub mod types;
pub mod error;
pub mod config;
pub mod logging;
pub mod layout;
pub mod parse;
pub mod estimate;
pub mod snapshot;
pub mod merge;
pub mod journal;
pub mod snapshot_store;
pub mod adherence;
pub mod history;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use config::Config;
pub use layout::{validate_user_id, DataLayout};
pub use parse::{normalize_exercise_name, parse_load, parse_reps, SetShape, ValidatedSet};
pub use estimate::estimate_e1rm;
pub use snapshot::aggregate_snapshots;
pub use merge::{
    adherence_avg, build_progression_analytics, compute_trend_points, merge_progression_metrics,
};
pub use journal::{JsonlJournal, WorkoutSink};
pub use snapshot_store::{load_snapshots, upsert_snapshots};
pub use history::{load_recent_adherence, load_recent_workouts, load_workout_history};
