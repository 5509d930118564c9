//! Dry-run sink writing records as JSON lines.
//!
//! # Output Structure
//!
//! ```text
//! data_dir/
//! ├── headers.json
//! └── profiles-2025-05-06.jsonl   # one ProfileRow per line
//! ```
//!
//! Each line is the exact column set the Postgres sink would insert, with
//! `null` where the database would get `NULL`.

use super::RecordSink;
use crate::error::{Result, ScrapeError};
use crate::models::FinalRecord;
use chrono::Local;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, instrument};

#[derive(Debug)]
pub struct JsonLinesSink {
    path: PathBuf,
}

impl JsonLinesSink {
    /// Sink for today's file inside `data_dir`.
    pub fn for_today(data_dir: &Path) -> Self {
        let file_name = format!("profiles-{}.jsonl", Local::now().date_naive());
        Self::new(data_dir.join(file_name))
    }

    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RecordSink for JsonLinesSink {
    #[instrument(level = "info", skip_all, fields(url = %record.url, path = %self.path.display()))]
    async fn save(&self, record: &FinalRecord) -> Result<()> {
        let mut line = serde_json::to_string(&record.to_row())
            .map_err(|e| ScrapeError::persistence(&record.url, e))?;
        line.push('\n');

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| ScrapeError::persistence(&record.url, e))?;
        file.write_all(line.as_bytes())
            .await
            .map_err(|e| ScrapeError::persistence(&record.url, e))?;
        file.flush()
            .await
            .map_err(|e| ScrapeError::persistence(&record.url, e))?;

        debug!(bytes = line.len(), "Appended record");
        Ok(())
    }
}
