//! Worklist sources and record sinks.
//!
//! # Submodules
//!
//! - [`postgres`]: Reads the pending-profile view and inserts finished rows
//! - [`json`]: Dry-run sink appending one JSON line per record
//!
//! The batch runner only sees the [`WorkSource`] and [`RecordSink`] traits;
//! [`Source`] and [`Sink`] pick the concrete backend for a run.

pub mod json;
pub mod postgres;

use crate::error::Result;
use crate::models::{FinalRecord, WorkItem};

pub use json::JsonLinesSink;
pub use postgres::{DbSettings, PgStore, TableNames};

/// Yields the full worklist in one call.
pub trait WorkSource {
    async fn load_work_items(&self) -> Result<Vec<WorkItem>>;
}

/// Persists one validated record, all or nothing.
pub trait RecordSink {
    async fn save(&self, record: &FinalRecord) -> Result<()>;
}

/// Worklist given on the command line.
#[derive(Debug, Clone, Default)]
pub struct InlineWorklist(pub Vec<WorkItem>);

impl InlineWorklist {
    pub fn from_urls<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        InlineWorklist(
            urls.into_iter()
                .filter_map(|url| WorkItem::from_row(Some(url.into()), None))
                .collect(),
        )
    }
}

impl WorkSource for InlineWorklist {
    async fn load_work_items(&self) -> Result<Vec<WorkItem>> {
        Ok(self.0.clone())
    }
}

/// Worklist backend selected for a run.
#[derive(Debug)]
pub enum Source<'a> {
    Database(&'a PgStore),
    Inline(InlineWorklist),
}

impl WorkSource for Source<'_> {
    async fn load_work_items(&self) -> Result<Vec<WorkItem>> {
        match self {
            Source::Database(store) => store.load_work_items().await,
            Source::Inline(list) => list.load_work_items().await,
        }
    }
}

/// Record backend selected for a run.
#[derive(Debug)]
pub enum Sink<'a> {
    Database(&'a PgStore),
    JsonLines(JsonLinesSink),
}

impl RecordSink for Sink<'_> {
    async fn save(&self, record: &FinalRecord) -> Result<()> {
        match self {
            Sink::Database(store) => store.save(record).await,
            Sink::JsonLines(sink) => sink.save(record).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_inline_worklist_drops_blank_urls() {
        let list = InlineWorklist::from_urls(["https://a.example.com", "  ", " https://b.example.com "]);
        let items = Source::Inline(list).load_work_items().await.unwrap();
        let urls: Vec<&str> = items.iter().map(|i| i.url.as_str()).collect();
        assert_eq!(urls, vec!["https://a.example.com", "https://b.example.com"]);
        assert!(items.iter().all(|i| i.search_id.is_none()));
    }
}
