//! File-backed "last shared period" marker.
//!
//! The reporting layer appends one line per month it shares; the latest
//! non-empty line wins. Lines are either `YYYY-MM` or the report name
//! form `Report_<Month>_<YYYY>`.

use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use chrono::Month;

use crate::application::ports::{SharedPeriodPort, StoreError};
use crate::domain::shared::Period;

const MARKER: &str = "share_marker";

/// Reads the share marker file. A missing file means nothing was shared.
#[derive(Debug, Clone)]
pub struct FileShareMarker {
    path: PathBuf,
}

impl FileShareMarker {
    /// Marker backed by `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

fn parse_marker(line: &str) -> Option<Period> {
    if let Ok(period) = line.parse::<Period>() {
        return Some(period);
    }
    let rest = line.strip_prefix("Report_")?;
    let (month, year) = rest.rsplit_once('_')?;
    let month: Month = month.parse().ok()?;
    Period::new(year.parse().ok()?, month.number_from_month()).ok()
}

#[async_trait]
impl SharedPeriodPort for FileShareMarker {
    async fn last_shared_period(&self) -> Result<Option<Period>, StoreError> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(StoreError::Io {
                    table: MARKER.to_string(),
                    message: e.to_string(),
                });
            }
        };

        let Some(last) = contents.lines().map(str::trim).rfind(|l| !l.is_empty()) else {
            return Ok(None);
        };
        parse_marker(last).map(Some).ok_or_else(|| StoreError::Serialization {
            table: MARKER.to_string(),
            message: format!("unrecognized marker line {last:?}"),
        })
    }
}
