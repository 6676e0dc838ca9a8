//! Training history loading with a trailing day window.
//!
//! This module turns the raw journal and adherence files into the ordered,
//! deduplicated inputs the analytics pipeline expects.

use crate::{AdherenceRow, Result, WorkoutLog};
use chrono::{Duration, NaiveDate};
use std::collections::HashMap;
use std::path::Path;

/// Parse the leading `YYYY-MM-DD` of a log or adherence date.
///
/// Accepts full timestamps (`2026-02-27T07:30:00Z`) by ignoring everything
/// after the date part.
pub fn parse_log_date(date: &str) -> Option<NaiveDate> {
    let day = date.trim().get(..10)?;
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

/// First day included in a window of `days` ending at `today`.
///
/// Windows reaching past the earliest representable date start there.
pub fn window_start(today: NaiveDate, days: u32) -> NaiveDate {
    today
        .checked_sub_signed(Duration::days(i64::from(days)))
        .unwrap_or(NaiveDate::MIN)
}

/// Load the full workout history, oldest first.
///
/// When the same id appears more than once the last line wins, so a
/// re-logged workout replaces the earlier copy. Workouts with an
/// unparseable date are skipped.
pub fn load_workout_history(journal_path: &Path) -> Result<Vec<WorkoutLog>> {
    let mut logs: Vec<WorkoutLog> = Vec::new();
    let mut seen_ids = HashMap::new();

    for log in crate::journal::read_workouts(journal_path)? {
        if parse_log_date(&log.date).is_none() {
            tracing::warn!("Skipping workout {} with invalid date {:?}", log.id, log.date);
            continue;
        }
        match seen_ids.get(&log.id) {
            Some(&idx) => logs[idx] = log,
            None => {
                seen_ids.insert(log.id, logs.len());
                logs.push(log);
            }
        }
    }

    // Stable: same-day workouts keep journal order
    logs.sort_by(|a, b| a.date.cmp(&b.date));

    tracing::info!("Loaded {} workouts from {:?}", logs.len(), journal_path);
    Ok(logs)
}

/// Load workouts from the last `days` days, oldest first
pub fn load_recent_workouts(
    journal_path: &Path,
    days: u32,
    today: NaiveDate,
) -> Result<Vec<WorkoutLog>> {
    let cutoff = window_start(today, days);
    let logs: Vec<WorkoutLog> = load_workout_history(journal_path)?
        .into_iter()
        .filter(|log| parse_log_date(&log.date).is_some_and(|d| d >= cutoff))
        .collect();

    tracing::info!("{} workouts within the last {} days", logs.len(), days);
    Ok(logs)
}

/// Load adherence rows from the last `days` days
pub fn load_recent_adherence(
    adherence_path: &Path,
    days: u32,
    today: NaiveDate,
) -> Result<Vec<AdherenceRow>> {
    let cutoff = window_start(today, days);
    let rows: Vec<AdherenceRow> = crate::adherence::read_adherence(adherence_path)?
        .into_iter()
        .filter(|row| match parse_log_date(&row.date) {
            Some(date) => date >= cutoff,
            None => {
                tracing::warn!("Skipping adherence row with invalid date {:?}", row.date);
                false
            }
        })
        .collect();

    tracing::debug!("{} adherence rows within the last {} days", rows.len(), days);
    Ok(rows)
}
