//! Per-exercise snapshot aggregation over a workout history.
//!
//! Aggregation rules:
//! - Sets are grouped by [`normalize_exercise_name`]
//! - `e1rm` and `total_volume` are per-set means, not peaks or sums
//! - `trend_score` compares the mean e1rm of the second half of the samples
//!   against the first half, split in accumulation order
//! - Exercises without a single usable set are left out entirely

use crate::estimate::{mean, round2, round_to};
use crate::{normalize_exercise_name, ProgressionSnapshot, WorkoutLog};
use std::collections::HashMap;

struct ExerciseAccumulator {
    display_name: String,
    e1rms: Vec<f64>,
    volumes: Vec<f64>,
    last_date: Option<String>,
}

impl ExerciseAccumulator {
    fn new(display_name: &str) -> Self {
        Self {
            display_name: display_name.trim().to_string(),
            e1rms: Vec::new(),
            volumes: Vec::new(),
            last_date: None,
        }
    }

    fn record_date(&mut self, date: &str) {
        // ISO dates compare correctly as strings
        match &self.last_date {
            Some(last) if last.as_str() >= date => {}
            _ => self.last_date = Some(date.to_string()),
        }
    }

    fn finish(self) -> ProgressionSnapshot {
        ProgressionSnapshot {
            e1rm: Some(round2(mean(&self.e1rms))),
            total_volume: round2(mean(&self.volumes)),
            trend_score: trend_score(&self.e1rms),
            last_performed_date: self.last_date,
            sample_size: self.e1rms.len() as u32,
            exercise_name: self.display_name,
        }
    }
}

/// Relative change between the two halves of `e1rms`, rounded to 4
/// decimals. An odd middle sample belongs to the second half.
pub fn trend_score(e1rms: &[f64]) -> f64 {
    let mid = e1rms.len() / 2;
    let first_half = mean(&e1rms[..mid]);
    let second_half = mean(&e1rms[mid..]);
    if first_half == 0.0 {
        return 0.0;
    }
    round_to((second_half - first_half) / first_half, 4)
}

/// Fold workout logs (oldest first) into one snapshot per exercise,
/// sorted by display name.
pub fn aggregate_snapshots(logs: &[WorkoutLog]) -> Vec<ProgressionSnapshot> {
    let mut groups: HashMap<String, ExerciseAccumulator> = HashMap::new();

    for log in logs {
        for entry in &log.exercises {
            let key = normalize_exercise_name(&entry.name);
            if key.is_empty() {
                continue;
            }

            let sets = entry.validated_sets();
            if sets.is_empty() {
                continue;
            }

            let group = groups
                .entry(key)
                .or_insert_with(|| ExerciseAccumulator::new(&entry.name));
            for set in sets {
                group.e1rms.push(set.e1rm());
                group.volumes.push(set.volume());
            }
            group.record_date(&log.date);
        }
    }

    let mut snapshots: Vec<ProgressionSnapshot> = groups
        .into_values()
        .map(ExerciseAccumulator::finish)
        .collect();
    snapshots.sort_by_cached_key(|s| (s.exercise_name.to_lowercase(), s.exercise_name.clone()));

    tracing::debug!(
        "Aggregated {} workout logs into {} snapshots",
        logs.len(),
        snapshots.len()
    );

    snapshots
}
