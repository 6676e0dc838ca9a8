//! Persisted progression snapshots.
//!
//! Rows live in one CSV table keyed by `(user_id, exercise_name)` with the
//! columns `e1rm, total_volume, trend_score, sample_size, updated_at`.
//! Writes replace the whole table atomically, serialized across processes by
//! an exclusive lock on a `<table>.lock` sidecar:
//! 1. Read every existing row
//! 2. Drop the rows being replaced
//! 3. Write the result to a temp file in the same directory, then sync
//! 4. Rename it over the original

use crate::{normalize_exercise_name, Error, ProgressionSnapshot, Result, StoredSnapshot};
use chrono::{DateTime, Utc};
use fs2::FileExt;
use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

impl StoredSnapshot {
    /// Row for a freshly aggregated snapshot
    pub fn from_snapshot(
        user_id: &str,
        snapshot: &ProgressionSnapshot,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id: user_id.to_string(),
            exercise_name: snapshot.exercise_name.clone(),
            e1rm: snapshot.e1rm,
            total_volume: Some(snapshot.total_volume),
            trend_score: Some(snapshot.trend_score),
            sample_size: Some(snapshot.sample_size),
            updated_at: Some(updated_at.to_rfc3339()),
        }
    }

    fn key(&self) -> (String, String) {
        (
            self.user_id.clone(),
            normalize_exercise_name(&self.exercise_name),
        )
    }
}

/// Sidecar file that writers lock for the whole read-modify-write.
///
/// The table itself is replaced by rename on every write, so a lock held on
/// it would not outlive the write that took it.
fn lock_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".lock");
    PathBuf::from(name)
}

/// Read every row of the table, for all users
fn read_all_rows(path: &Path) -> Result<Vec<StoredSnapshot>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(path)?;
    file.lock_shared()?;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(&file);

    let mut rows = Vec::new();
    for result in reader.deserialize::<StoredSnapshot>() {
        match result {
            Ok(row) => rows.push(row),
            Err(e) => {
                tracing::warn!("Failed to deserialize snapshot row: {}", e);
            }
        }
    }
    drop(reader);

    file.unlock()?;
    Ok(rows)
}

/// Load the stored snapshot rows of one user, in table order
pub fn load_snapshots(path: &Path, user_id: &str) -> Result<Vec<StoredSnapshot>> {
    let rows: Vec<StoredSnapshot> = read_all_rows(path)?
        .into_iter()
        .filter(|row| row.user_id == user_id)
        .collect();

    tracing::debug!(
        "Loaded {} stored snapshots for {} from {:?}",
        rows.len(),
        user_id,
        path
    );
    Ok(rows)
}

/// Insert or replace the rows for `snapshots`.
///
/// Existing rows of the same user whose normalized exercise name matches a
/// new snapshot are replaced; every other row is kept in place. Returns the
/// number of rows written for this user.
pub fn upsert_snapshots(
    path: &Path,
    user_id: &str,
    snapshots: &[ProgressionSnapshot],
    updated_at: DateTime<Utc>,
) -> Result<usize> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent)?;

    let fresh: Vec<StoredSnapshot> = snapshots
        .iter()
        .map(|snapshot| StoredSnapshot::from_snapshot(user_id, snapshot, updated_at))
        .collect();
    let replaced: HashSet<(String, String)> = fresh.iter().map(StoredSnapshot::key).collect();

    let lock_file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(lock_path(path))?;
    lock_file.lock_exclusive()?;

    let mut rows: Vec<StoredSnapshot> = read_all_rows(path)?
        .into_iter()
        .filter(|row| !replaced.contains(&row.key()))
        .collect();
    let kept = rows.len();
    rows.extend(fresh);

    let temp = NamedTempFile::new_in(parent)?;

    {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(true)
            .from_writer(temp.as_file());
        for row in &rows {
            writer.serialize(row)?;
        }
        writer.flush()?;
    }

    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| Error::Io(e.error))?;
    lock_file.unlock()?;

    tracing::info!(
        "Saved {} snapshots for {} ({} other rows kept) to {:?}",
        snapshots.len(),
        user_id,
        kept,
        path
    );

    Ok(snapshots.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn snapshot(name: &str, e1rm: f64) -> ProgressionSnapshot {
        ProgressionSnapshot {
            exercise_name: name.into(),
            e1rm: Some(e1rm),
            total_volume: 500.0,
            trend_score: 0.04,
            last_performed_date: Some("2026-02-27".into()),
            sample_size: 4,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_upsert_and_load_roundtrip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("progression_snapshots.csv");

        let written = upsert_snapshots(&path, "alice", &[snapshot("Back Squat", 121.04)], now())
            .unwrap();
        assert_eq!(written, 1);

        let rows = load_snapshots(&path, "alice").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].exercise_name, "Back Squat");
        assert_eq!(rows[0].e1rm, Some(121.04));
        assert_eq!(rows[0].sample_size, Some(4));
        assert_eq!(rows[0].updated_at.as_deref(), Some("2026-03-01T12:00:00+00:00"));
    }

    #[test]
    fn test_upsert_replaces_same_key_and_keeps_others() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("progression_snapshots.csv");

        upsert_snapshots(
            &path,
            "alice",
            &[snapshot("Back Squat", 100.0), snapshot("Bench Press", 80.0)],
            now(),
        )
        .unwrap();
        upsert_snapshots(&path, "bob", &[snapshot("Back Squat", 150.0)], now()).unwrap();

        // differently cased name still replaces alice's squat row
        upsert_snapshots(&path, "alice", &[snapshot("back  squat", 110.0)], now()).unwrap();

        let alice = load_snapshots(&path, "alice").unwrap();
        assert_eq!(alice.len(), 2);
        assert_eq!(alice[0].exercise_name, "Bench Press");
        assert_eq!(alice[1].exercise_name, "back  squat");
        assert_eq!(alice[1].e1rm, Some(110.0));

        let bob = load_snapshots(&path, "bob").unwrap();
        assert_eq!(bob.len(), 1);
        assert_eq!(bob[0].e1rm, Some(150.0));
    }

    #[test]
    fn test_blank_columns_load_as_none() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("progression_snapshots.csv");
        std::fs::write(
            &path,
            "user_id,exercise_name,e1rm,total_volume,trend_score,sample_size,updated_at\n\
             alice,Deadlift,,,0.1,,\n\
             alice,Broken,not-a-number,,,,\n",
        )
        .unwrap();

        let rows = load_snapshots(&path, "alice").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].exercise_name, "Deadlift");
        assert_eq!(rows[0].e1rm, None);
        assert_eq!(rows[0].trend_score, Some(0.1));
        assert_eq!(rows[0].sample_size, None);
    }

    #[test]
    fn test_load_missing_table() {
        let temp_dir = tempfile::tempdir().unwrap();
        let rows = load_snapshots(&temp_dir.path().join("missing.csv"), "alice").unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_atomic_save_leaves_no_temp_files() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("progression_snapshots.csv");

        upsert_snapshots(&path, "alice", &[snapshot("Row", 90.0)], now()).unwrap();

        let extras: Vec<_> = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.file_name() != "progression_snapshots.csv"
                    && e.file_name() != "progression_snapshots.csv.lock"
            })
            .collect();
        assert!(extras.is_empty(), "unexpected files: {:?}", extras);
    }

    #[test]
    fn test_concurrent_upserts_keep_every_user() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("progression_snapshots.csv");

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let path = path.clone();
                std::thread::spawn(move || {
                    upsert_snapshots(&path, &format!("user{}", i), &[snapshot("Row", 90.0)], now())
                        .unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let users: HashSet<String> = read_all_rows(&path)
            .unwrap()
            .into_iter()
            .map(|row| row.user_id)
            .collect();
        assert_eq!(users.len(), 16, "users persisted: {:?}", users);
    }
}
