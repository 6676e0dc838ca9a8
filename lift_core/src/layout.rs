//! On-disk layout of the data directory.
//!
//! ```text
//! <data_dir>/progression_snapshots.csv
//! <data_dir>/<user_id>/workouts.jsonl
//! <data_dir>/<user_id>/adherence.csv
//! ```

use crate::{Error, Result};
use std::path::{Path, PathBuf};

/// Resolved file paths for one user
#[derive(Clone, Debug)]
pub struct DataLayout {
    pub snapshots_path: PathBuf,
    pub journal_path: PathBuf,
    pub adherence_path: PathBuf,
}

impl DataLayout {
    pub fn new(data_dir: &Path, user_id: &str) -> Result<Self> {
        validate_user_id(user_id)?;
        let user_dir = data_dir.join(user_id);
        Ok(Self {
            snapshots_path: data_dir.join("progression_snapshots.csv"),
            journal_path: user_dir.join("workouts.jsonl"),
            adherence_path: user_dir.join("adherence.csv"),
        })
    }
}

/// User ids double as directory names, so they must be a single plain
/// path component.
pub fn validate_user_id(user_id: &str) -> Result<()> {
    let trimmed = user_id.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidInput("user id must not be empty".into()));
    }
    if trimmed != user_id
        || user_id == "."
        || user_id == ".."
        || user_id.contains(['/', '\\'])
    {
        return Err(Error::InvalidInput(format!(
            "user id {:?} is not a plain name",
            user_id
        )));
    }
    Ok(())
}
