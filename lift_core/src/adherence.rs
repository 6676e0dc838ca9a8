//! Daily adherence table.
//!
//! A CSV file of `date,total_score` rows per user. Rows are appended
//! with an exclusive lock; the header is written only when the file is
//! empty.

use crate::{AdherenceRow, Result};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::path::Path;

/// Append one adherence row, creating the file (with headers) if needed
pub fn append_adherence(path: &Path, row: &AdherenceRow) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = OpenOptions::new().create(true).append(true).open(path)?;
    file.lock_exclusive()?;

    // Checked after locking so two writers cannot both emit a header
    let needs_headers = file.metadata()?.len() == 0;

    {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(needs_headers)
            .from_writer(&file);
        writer.serialize(row)?;
        writer.flush()?;
    }

    file.sync_all()?;
    file.unlock()?;

    tracing::debug!("Appended adherence row for {} to {:?}", row.date, path);
    Ok(())
}

/// Read all adherence rows in file order. Malformed rows are skipped.
pub fn read_adherence(path: &Path) -> Result<Vec<AdherenceRow>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(path)?;
    file.lock_shared()?;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(&file);

    let mut rows = Vec::new();
    for result in reader.deserialize::<AdherenceRow>() {
        match result {
            Ok(row) => rows.push(row),
            Err(e) => {
                tracing::warn!("Failed to deserialize adherence row: {}", e);
            }
        }
    }
    drop(reader);

    file.unlock()?;
    tracing::debug!("Read {} adherence rows from {:?}", rows.len(), path);
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(date: &str, score: f64) -> AdherenceRow {
        AdherenceRow {
            date: date.into(),
            total_score: Some(score),
        }
    }

    #[test]
    fn test_append_creates_file_with_header() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("alice").join("adherence.csv");

        append_adherence(&path, &row("2026-03-01", 0.8)).unwrap();
        append_adherence(&path, &row("2026-03-02", 0.6)).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.matches("date,total_score").count(), 1);

        let rows = read_adherence(&path).unwrap();
        assert_eq!(rows, vec![row("2026-03-01", 0.8), row("2026-03-02", 0.6)]);
    }

    #[test]
    fn test_read_missing_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        assert!(read_adherence(&temp_dir.path().join("none.csv"))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_blank_score_and_bad_rows() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("adherence.csv");
        std::fs::write(
            &path,
            "date,total_score\n2026-03-01,\n2026-03-02,great\n2026-03-03,0.7\n",
        )
        .unwrap();

        let rows = read_adherence(&path).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].total_score, None);
        assert_eq!(rows[1].total_score, Some(0.7));
    }
}
