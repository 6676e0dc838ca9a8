//! Merging fresh trend points with stored snapshots and adherence rows.
//!
//! This is the read path behind the analytics response. Stored snapshot
//! rows decide which exercises appear; fresh trend points, when present,
//! override the stored e1rm for the baseline and current values.
//!
//! Two unrelated "adherence" numbers come out of here:
//! - [`ProgressionMetric::adherence_score`], derived from the sample count
//! - [`adherence_avg`], the mean of the daily adherence rows

use crate::estimate::{mean, round2};
use crate::{
    normalize_exercise_name, AdherenceRow, ProgressionAnalytics, ProgressionMetric,
    ProgressionTrendPoint, StoredSnapshot, VolumeLandmark, WorkoutLog,
};
use std::collections::HashMap;

/// Relative volume change that counts as a landmark in either direction
pub const VOLUME_LANDMARK_THRESHOLD: f64 = 0.08;

/// Sample count at which `adherence_score` saturates at 1.0
pub const ADHERENCE_SESSION_CEILING: usize = 12;

struct PointAccumulator {
    display_name: String,
    e1rms: Vec<f64>,
    volumes: Vec<f64>,
}

/// One trend point per (workout, exercise), averaged over that workout's
/// own usable sets.
///
/// Points come out in log order, then in order of first appearance within
/// each log. Entries naming the same exercise twice in one workout share a
/// point.
pub fn compute_trend_points(logs: &[WorkoutLog]) -> Vec<ProgressionTrendPoint> {
    let mut points = Vec::new();

    for log in logs {
        let mut per_exercise: Vec<(String, PointAccumulator)> = Vec::new();

        for entry in &log.exercises {
            let key = normalize_exercise_name(&entry.name);
            if key.is_empty() {
                continue;
            }
            let sets = entry.validated_sets();
            if sets.is_empty() {
                continue;
            }

            let idx = match per_exercise.iter().position(|(k, _)| *k == key) {
                Some(idx) => idx,
                None => {
                    per_exercise.push((
                        key,
                        PointAccumulator {
                            display_name: entry.name.trim().to_string(),
                            e1rms: Vec::new(),
                            volumes: Vec::new(),
                        },
                    ));
                    per_exercise.len() - 1
                }
            };

            let acc = &mut per_exercise[idx].1;
            for set in sets {
                acc.e1rms.push(set.e1rm());
                acc.volumes.push(set.volume());
            }
        }

        points.extend(
            per_exercise
                .into_iter()
                .map(|(_, acc)| ProgressionTrendPoint {
                    date: log.date.clone(),
                    exercise_name: acc.display_name,
                    e1rm: round2(mean(&acc.e1rms)),
                    volume: round2(mean(&acc.volumes)),
                }),
        );
    }

    points
}

/// Classify the change from `start` to `end` against the 8% threshold
pub fn volume_landmark(start: f64, end: f64) -> VolumeLandmark {
    if !(start.is_finite() && start > 0.0) || !end.is_finite() {
        return VolumeLandmark::Stable;
    }
    let change = (end - start) / start;
    if change > VOLUME_LANDMARK_THRESHOLD {
        VolumeLandmark::Up
    } else if change < -VOLUME_LANDMARK_THRESHOLD {
        VolumeLandmark::Down
    } else {
        VolumeLandmark::Stable
    }
}

fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

fn merge_row(row: &StoredSnapshot, points: &[&ProgressionTrendPoint]) -> ProgressionMetric {
    let first = points.first();
    let last = points.last();
    let stored_e1rm = finite(row.e1rm);

    let baseline_e1rm = first.map(|p| p.e1rm).or(stored_e1rm);
    let current_e1rm = last.map(|p| p.e1rm).or(stored_e1rm);

    let trend_pct = match baseline_e1rm {
        Some(baseline) if baseline > 0.0 => {
            round2((current_e1rm.unwrap_or(0.0) - baseline) / baseline * 100.0)
        }
        _ => round2(finite(row.trend_score).unwrap_or(0.0) * 100.0),
    };

    let (volume_start, volume_end) = match (first, last) {
        (Some(first), Some(last)) => (first.volume, last.volume),
        _ => {
            let stored = finite(row.total_volume).unwrap_or(0.0);
            (stored, stored)
        }
    };

    let samples = row
        .sample_size
        .map(|n| n as usize)
        .unwrap_or(points.len());
    let adherence_score =
        round2(samples.min(ADHERENCE_SESSION_CEILING) as f64 / ADHERENCE_SESSION_CEILING as f64);

    ProgressionMetric {
        exercise_name: row.exercise_name.clone(),
        current_e1rm,
        baseline_e1rm,
        trend_pct,
        volume_landmark: volume_landmark(volume_start, volume_end),
        adherence_score,
    }
}

/// One metric per stored snapshot row, most-loaded exercise first.
pub fn merge_progression_metrics(
    points: &[ProgressionTrendPoint],
    stored: &[StoredSnapshot],
) -> Vec<ProgressionMetric> {
    let mut by_exercise: HashMap<String, Vec<&ProgressionTrendPoint>> = HashMap::new();
    for point in points {
        by_exercise
            .entry(normalize_exercise_name(&point.exercise_name))
            .or_default()
            .push(point);
    }
    for group in by_exercise.values_mut() {
        group.sort_by(|a, b| a.date.cmp(&b.date));
    }

    let mut metrics: Vec<ProgressionMetric> = stored
        .iter()
        .map(|row| {
            let group = by_exercise
                .get(&normalize_exercise_name(&row.exercise_name))
                .map(Vec::as_slice)
                .unwrap_or(&[]);
            merge_row(row, group)
        })
        .collect();

    metrics.sort_by(|a, b| {
        b.current_e1rm
            .unwrap_or(0.0)
            .total_cmp(&a.current_e1rm.unwrap_or(0.0))
    });

    metrics
}

/// Mean of the daily adherence scores, each clamped to `[0, 1]`.
///
/// A missing or non-finite score counts as 0. `None` when no rows exist.
pub fn adherence_avg(rows: &[AdherenceRow]) -> Option<f64> {
    if rows.is_empty() {
        return None;
    }
    let scores: Vec<f64> = rows
        .iter()
        .map(|row| finite(row.total_score).unwrap_or(0.0).clamp(0.0, 1.0))
        .collect();
    Some(round2(mean(&scores)))
}

/// Assemble the analytics response from already-loaded rows
pub fn build_progression_analytics(
    period_days: u32,
    logs: &[WorkoutLog],
    stored: &[StoredSnapshot],
    adherence: &[AdherenceRow],
) -> ProgressionAnalytics {
    let points = compute_trend_points(logs);
    let metrics = merge_progression_metrics(&points, stored);
    let adherence = adherence_avg(adherence);

    tracing::debug!(
        "Built analytics over {} days: {} metrics, {} trend points",
        period_days,
        metrics.len(),
        points.len()
    );

    ProgressionAnalytics {
        period_days,
        progression_e1rm_metrics: metrics,
        progression_trend_points: points,
        progression_adherence: adherence,
    }
}
