use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("HTTP error: {0}")]
    HttpError(String),

    #[error("Rate limited by the sheet host, please try again later")]
    RateLimited,

    #[error("Sheet parsing error: {0}")]
    ParseError(String),

    #[error("Snapshot error: {0}")]
    SnapshotError(String),

    #[error("Unknown player: {0} (not in roster)")]
    UnknownPlayer(String),

    #[error("No remote sheet configured, set OW_SHEET_URL")]
    NoRemoteSource,
}
