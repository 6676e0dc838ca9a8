//! Core domain types for Lift.
//!
//! This module defines the fundamental types used throughout the system:
//! - Workout logs as they arrive from the logging flow (loosely typed)
//! - Derived progression snapshots and trend points
//! - Persisted snapshot and adherence rows
//! - The analytics response body

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Workout Log Input
// ============================================================================

/// A numeric field that may arrive as a JSON number or as free text
/// (`8`, `"8-12"`, `"10 reps"`, `"102.5kg"`).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum LooseNumber {
    Number(f64),
    Text(String),
}

impl From<f64> for LooseNumber {
    fn from(value: f64) -> Self {
        LooseNumber::Number(value)
    }
}

impl From<&str> for LooseNumber {
    fn from(value: &str) -> Self {
        LooseNumber::Text(value.to_string())
    }
}

/// One completed set of an exercise
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Default)]
pub struct PerformedSet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reps: Option<LooseNumber>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight_kg: Option<LooseNumber>,
    /// Reps in reserve
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rir: Option<f64>,
}

/// One exercise within a workout.
///
/// Either `performed_sets` (preferred) or the legacy flat
/// `sets`/`reps`/`weight` fields are populated.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Default)]
pub struct ExerciseLogEntry {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sets: Option<LooseNumber>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reps: Option<LooseNumber>,
    #[serde(default, alias = "weight_kg", skip_serializing_if = "Option::is_none")]
    pub weight: Option<LooseNumber>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub performed_sets: Vec<PerformedSet>,
}

/// One logged training session
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct WorkoutLog {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    /// ISO `YYYY-MM-DD`
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub exercises: Vec<ExerciseLogEntry>,
}

impl WorkoutLog {
    pub fn new(date: impl Into<String>, exercises: Vec<ExerciseLogEntry>) -> Self {
        Self {
            id: Uuid::new_v4(),
            date: date.into(),
            title: None,
            exercises,
        }
    }
}

// ============================================================================
// Derived Progression Types
// ============================================================================

/// Per-exercise aggregate over a training history.
///
/// `total_volume` is the mean per-set volume, not a sum; consumers rely on
/// the averaged value.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ProgressionSnapshot {
    pub exercise_name: String,
    pub e1rm: Option<f64>,
    pub total_volume: f64,
    pub trend_score: f64,
    pub last_performed_date: Option<String>,
    pub sample_size: u32,
}

/// One (date, exercise) observation used for charting
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ProgressionTrendPoint {
    pub date: String,
    pub exercise_name: String,
    pub e1rm: f64,
    pub volume: f64,
}

/// Direction of per-set volume between the first and last observation
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum VolumeLandmark {
    Up,
    Down,
    Stable,
}

/// API-facing metric merging a stored snapshot with fresh trend points.
///
/// `adherence_score` is derived from the sample count, not from adherence
/// rows.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ProgressionMetric {
    pub exercise_name: String,
    pub current_e1rm: Option<f64>,
    pub baseline_e1rm: Option<f64>,
    pub trend_pct: f64,
    pub volume_landmark: VolumeLandmark,
    pub adherence_score: f64,
}

// ============================================================================
// Persisted Rows
// ============================================================================

/// A persisted snapshot row keyed by `(user_id, exercise_name)`.
///
/// Every numeric column is optional on read: rows written by older jobs or
/// by hand may leave any of them blank.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Default)]
pub struct StoredSnapshot {
    pub user_id: String,
    pub exercise_name: String,
    pub e1rm: Option<f64>,
    pub total_volume: Option<f64>,
    pub trend_score: Option<f64>,
    pub sample_size: Option<u32>,
    pub updated_at: Option<String>,
}

/// Daily adherence record, `total_score` expected in 0..1
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct AdherenceRow {
    pub date: String,
    pub total_score: Option<f64>,
}

// ============================================================================
// Response
// ============================================================================

/// Body returned by the analytics request
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ProgressionAnalytics {
    pub period_days: u32,
    pub progression_e1rm_metrics: Vec<ProgressionMetric>,
    pub progression_trend_points: Vec<ProgressionTrendPoint>,
    pub progression_adherence: Option<f64>,
}
