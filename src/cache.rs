use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use chrono::{DateTime, Utc};
use tracing::debug;
use crate::error::AppError;
use crate::models::{Dataset, MatchRecord, Roster};

const SNAPSHOT_FILE: &str = "snapshot.json";

/// The last successfully downloaded sheet, already normalized.
#[derive(Debug, Serialize, Deserialize)]
pub struct Snapshot {
    pub fetched_at: DateTime<Utc>,
    pub roster: Roster,
    pub matches: Vec<MatchRecord>,
}

pub struct SnapshotCache {
    path: PathBuf,
}

impl SnapshotCache {
    pub fn new(dir: &Path) -> Self {
        SnapshotCache {
            path: dir.join(SNAPSHOT_FILE),
        }
    }

    pub fn default_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".ow_squad")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the snapshot as a dataset. `Ok(None)` when nothing was cached yet.
    pub fn load(&self, roster: &Roster) -> Result<Option<(Dataset, DateTime<Utc>)>, AppError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no snapshot on disk");
                return Ok(None);
            }
            Err(e) => {
                return Err(AppError::SnapshotError(format!(
                    "Failed to read {}: {}",
                    self.path.display(),
                    e
                )));
            }
        };

        let snapshot: Snapshot = serde_json::from_str(&content).map_err(|e| {
            AppError::SnapshotError(format!("Failed to parse snapshot: {}", e))
        })?;

        if &snapshot.roster != roster {
            return Err(AppError::SnapshotError(
                "snapshot was taken with a different roster, run refresh".to_string(),
            ));
        }

        let dataset = Dataset::new(snapshot.roster, snapshot.matches);
        Ok(Some((dataset, snapshot.fetched_at)))
    }

    /// Write via a temporary file and rename, so a reader never sees half a snapshot.
    pub fn save(&self, dataset: &Dataset, fetched_at: DateTime<Utc>) -> Result<(), AppError> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).map_err(|e| {
                AppError::SnapshotError(format!("Failed to create {}: {}", dir.display(), e))
            })?;
        }

        let snapshot = Snapshot {
            fetched_at,
            roster: dataset.roster().clone(),
            matches: dataset.records().to_vec(),
        };
        let json = serde_json::to_string_pretty(&snapshot).map_err(|e| {
            AppError::SnapshotError(format!("Failed to serialize snapshot: {}", e))
        })?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|e| {
            AppError::SnapshotError(format!("Failed to write snapshot: {}", e))
        })?;
        fs::rename(&tmp, &self.path).map_err(|e| {
            AppError::SnapshotError(format!("Failed to replace snapshot: {}", e))
        })?;

        debug!(path = %self.path.display(), matches = snapshot.matches.len(), "snapshot saved");
        Ok(())
    }
}
