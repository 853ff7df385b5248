use crate::cache::SnapshotCache;
use crate::error::AppError;
use crate::models::Roster;
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    pub roster: Roster,
    pub sheet_url: Option<String>,
    pub data_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let roster = env::var("OW_ROSTER").map_err(|_| {
            AppError::ConfigError(
                "OW_ROSTER not found in environment or .env file".to_string(),
            )
        })?;
        let roster = Roster::parse(&roster)?;

        let sheet_url = env::var("OW_SHEET_URL")
            .ok()
            .filter(|url| !url.trim().is_empty());

        let data_dir = env::var("OW_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| SnapshotCache::default_dir());

        Ok(Config {
            roster,
            sheet_url,
            data_dir,
        })
    }
}
