//! Append-only workout journal.
//!
//! Workout logs are appended to a JSONL (JSON Lines) file with file locking
//! to ensure safe concurrent access.

use crate::{Result, WorkoutLog};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// Sink for newly logged workouts
pub trait WorkoutSink {
    fn append(&mut self, log: &WorkoutLog) -> Result<()>;
}

/// JSONL-based workout journal with file locking
pub struct JsonlJournal {
    path: PathBuf,
}

impl JsonlJournal {
    /// Create a new journal for the given path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn ensure_parent_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}

impl WorkoutSink for JsonlJournal {
    fn append(&mut self, log: &WorkoutLog) -> Result<()> {
        self.ensure_parent_dir()?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        file.lock_exclusive()?;

        let mut writer = std::io::BufWriter::new(&file);
        let line = serde_json::to_string(log)?;
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        drop(writer);

        file.unlock()?;

        tracing::debug!("Appended workout {} ({}) to journal", log.id, log.date);
        Ok(())
    }
}

/// Read every workout from a journal file, in file order.
///
/// Lines that fail to parse are logged and skipped.
pub fn read_workouts(path: &Path) -> Result<Vec<WorkoutLog>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(path)?;
    file.lock_shared()?;

    let reader = BufReader::new(&file);
    let mut logs = Vec::new();

    for (line_num, line_result) in reader.lines().enumerate() {
        let line = line_result?;
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<WorkoutLog>(&line) {
            Ok(log) => logs.push(log),
            Err(e) => {
                tracing::warn!("Failed to parse workout at line {}: {}", line_num + 1, e);
            }
        }
    }

    file.unlock()?;
    tracing::debug!("Read {} workouts from journal", logs.len());
    Ok(logs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ExerciseLogEntry, LooseNumber};

    fn create_test_log(date: &str) -> WorkoutLog {
        WorkoutLog::new(
            date,
            vec![ExerciseLogEntry {
                name: "Back Squat".into(),
                reps: Some(LooseNumber::Number(5.0)),
                weight: Some(LooseNumber::Number(100.0)),
                ..Default::default()
            }],
        )
    }

    #[test]
    fn test_append_and_read_single_workout() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("user").join("workouts.jsonl");

        let log = create_test_log("2026-02-20");
        let log_id = log.id;

        let mut journal = JsonlJournal::new(&path);
        journal.append(&log).unwrap();

        let logs = read_workouts(&path).unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].id, log_id);
        assert_eq!(logs[0], log);
    }

    #[test]
    fn test_append_multiple_workouts() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("workouts.jsonl");

        let mut journal = JsonlJournal::new(&path);
        for day in 1..=5 {
            journal.append(&create_test_log(&format!("2026-03-0{}", day))).unwrap();
        }

        assert_eq!(read_workouts(&path).unwrap().len(), 5);
    }

    #[test]
    fn test_read_missing_journal() {
        let temp_dir = tempfile::tempdir().unwrap();
        let logs = read_workouts(&temp_dir.path().join("nonexistent.jsonl")).unwrap();
        assert!(logs.is_empty());
    }

    #[test]
    fn test_corrupted_lines_are_skipped() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("workouts.jsonl");

        let mut journal = JsonlJournal::new(&path);
        journal.append(&create_test_log("2026-02-20")).unwrap();
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        writeln!(file, "{{ not json").unwrap();
        journal.append(&create_test_log("2026-02-21")).unwrap();

        let logs = read_workouts(&path).unwrap();
        assert_eq!(logs.len(), 2);
    }

    #[test]
    fn test_missing_id_is_generated() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("workouts.jsonl");
        std::fs::write(&path, "{\"date\":\"2026-02-20\",\"exercises\":[]}\n").unwrap();

        let logs = read_workouts(&path).unwrap();
        assert_eq!(logs.len(), 1);
        assert!(!logs[0].id.is_nil());
    }
}
