use crate::error::AppError;
use crate::models::{Dataset, Roster};
use crate::store::DatasetSource;
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

use super::sheet::parse_csv;

const USER_AGENT: &str = concat!("ow_squad/", env!("CARGO_PKG_VERSION"));
const MAX_RETRIES: u32 = 3;

/// Downloads the CSV export of the group's match sheet.
pub struct SheetClient {
    url: String,
    timeout: Duration,
}

impl SheetClient {
    pub fn new(url: impl Into<String>) -> Self {
        SheetClient {
            url: url.into(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn execute_request(&self) -> Result<String, AppError> {
        let mut retry_count = 0;

        loop {
            let response = ureq::get(&self.url)
                .set("User-Agent", USER_AGENT)
                .timeout(self.timeout)
                .call();

            match response {
                Ok(resp) => {
                    return resp
                        .into_string()
                        .map_err(|e| AppError::HttpError(e.to_string()));
                }
                Err(ureq::Error::Status(429, _)) => {
                    if retry_count >= MAX_RETRIES {
                        return Err(AppError::RateLimited);
                    }
                    let wait_ms = 2000 * (retry_count + 1) as u64;
                    warn!(wait_ms, "sheet host rate limited, retrying");
                    thread::sleep(Duration::from_millis(wait_ms));
                    retry_count += 1;
                }
                Err(e) => {
                    return Err(AppError::HttpError(e.to_string()));
                }
            }
        }
    }

    pub fn fetch_csv(&self) -> Result<String, AppError> {
        debug!(url = %self.url, "downloading match sheet");
        self.execute_request()
    }
}

impl DatasetSource for SheetClient {
    fn fetch(&self, roster: &Roster) -> Result<Dataset, AppError> {
        let body = self.fetch_csv()?;
        parse_csv(&body, roster)
    }
}
