use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{info, warn};

use crate::cache::SnapshotCache;
use crate::error::AppError;
use crate::models::{Dataset, Roster};

/// Where a fresh copy of the match table comes from.
pub trait DatasetSource {
    fn fetch(&self, roster: &Roster) -> Result<Dataset, AppError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshSummary {
    pub previous_matches: usize,
    pub matches: usize,
    pub fetched_at: DateTime<Utc>,
}

/// Owns the current match table.
///
/// Readers get an `Arc` to the dataset that was current when they asked;
/// replacement swaps the whole table and never touches what they hold.
pub struct DatasetStore {
    roster: Roster,
    current: Arc<Dataset>,
    refreshed_at: Option<DateTime<Utc>>,
}

impl DatasetStore {
    pub fn new(roster: Roster) -> Self {
        DatasetStore {
            current: Arc::new(Dataset::empty(roster.clone())),
            roster,
            refreshed_at: None,
        }
    }

    pub fn current(&self) -> Arc<Dataset> {
        Arc::clone(&self.current)
    }

    pub fn refreshed_at(&self) -> Option<DateTime<Utc>> {
        self.refreshed_at
    }

    pub fn replace(&mut self, dataset: Dataset) {
        self.current = Arc::new(dataset);
    }

    /// Start-up load from the local snapshot. Returns the number of matches loaded.
    pub fn load_local(&mut self, cache: &SnapshotCache) -> Result<usize, AppError> {
        match cache.load(&self.roster)? {
            Some((dataset, fetched_at)) => {
                let matches = dataset.len();
                self.replace(dataset);
                self.refreshed_at = Some(fetched_at);
                info!(matches, "loaded local snapshot");
                Ok(matches)
            }
            None => Ok(0),
        }
    }

    /// Fetch, persist, then swap. On any failure the current table stays as it was.
    pub fn refresh(
        &mut self,
        source: &dyn DatasetSource,
        cache: &SnapshotCache,
    ) -> Result<RefreshSummary, AppError> {
        let dataset = source.fetch(&self.roster).map_err(|e| {
            warn!(error = %e, "refresh failed, keeping current data");
            e
        })?;

        let fetched_at = Utc::now();
        cache.save(&dataset, fetched_at).map_err(|e| {
            warn!(error = %e, "snapshot write failed, keeping current data");
            e
        })?;

        let summary = RefreshSummary {
            previous_matches: self.current.len(),
            matches: dataset.len(),
            fetched_at,
        };
        self.replace(dataset);
        self.refreshed_at = Some(fetched_at);
        info!(matches = summary.matches, "dataset refreshed");

        Ok(summary)
    }
}
