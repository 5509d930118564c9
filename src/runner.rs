//! Sequential batch loop over the worklist.
//!
//! The worklist is loaded once. Items run strictly one after another in
//! worklist order; an item's failure is logged and the loop moves on.

use crate::aggregator::ProfileAggregator;
use crate::error::Result;
use crate::fetch::PageFetcher;
use crate::headers::HeaderSet;
use crate::models::{BatchSummary, WorkItem};
use crate::store::{RecordSink, WorkSource};
use tracing::{error, info, instrument, warn};

/// Harvest every pending profile.
///
/// # Errors
///
/// Only a failure to load the worklist is returned; per-item failures are
/// counted in the [`BatchSummary`].
#[instrument(level = "info", skip_all)]
pub async fn run_batch<S, F, K>(
    source: &S,
    fetcher: &F,
    headers: &HeaderSet,
    sink: &K,
) -> Result<BatchSummary>
where
    S: WorkSource,
    F: PageFetcher,
    K: RecordSink,
{
    let items = source.load_work_items().await?;
    let mut summary = BatchSummary {
        total: items.len(),
        ..Default::default()
    };

    if items.is_empty() {
        warn!("No profiles found to process");
        return Ok(summary);
    }

    info!(
        count = items.len(),
        "Processing {} profile{}",
        items.len(),
        if items.len() == 1 { "" } else { "s" }
    );

    let aggregator = ProfileAggregator::new(fetcher, headers);
    for item in &items {
        match process_item(&aggregator, sink, item).await {
            Ok(()) => {
                summary.saved += 1;
                info!(url = %item.url, "Saved profile");
            }
            Err(e) => {
                summary.failed += 1;
                error!(url = %item.url, error = %e, "Failed to process profile");
            }
        }
    }

    info!(
        total = summary.total,
        saved = summary.saved,
        failed = summary.failed,
        "Batch complete"
    );
    Ok(summary)
}

async fn process_item<F, K>(
    aggregator: &ProfileAggregator<'_, F>,
    sink: &K,
    item: &WorkItem,
) -> Result<()>
where
    F: PageFetcher,
    K: RecordSink,
{
    let record = aggregator.aggregate(item).await?;
    sink.save(&record).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::tests::{ScriptedFetcher, episode_page, profile_page};
    use crate::error::ScrapeError;
    use crate::models::FinalRecord;
    use crate::store::InlineWorklist;
    use std::sync::Mutex;

    /// Sink that keeps every saved record in memory.
    #[derive(Default)]
    struct RecordingSink {
        saved: Mutex<Vec<FinalRecord>>,
        reject_url: Option<String>,
    }

    impl RecordingSink {
        fn saved_urls(&self) -> Vec<String> {
            self.saved.lock().unwrap().iter().map(|r| r.url.clone()).collect()
        }
    }

    impl RecordSink for RecordingSink {
        async fn save(&self, record: &FinalRecord) -> Result<()> {
            if self.reject_url.as_deref() == Some(record.url.as_str()) {
                return Err(ScrapeError::persistence(&record.url, "insert rejected"));
            }
            self.saved.lock().unwrap().push(record.clone());
            Ok(())
        }
    }

    struct BrokenSource;

    impl WorkSource for BrokenSource {
        async fn load_work_items(&self) -> Result<Vec<WorkItem>> {
            Err(ScrapeError::Database("view missing".to_string()))
        }
    }

    #[tokio::test]
    async fn test_failed_item_does_not_stop_batch() {
        let source = InlineWorklist::from_urls([
            "https://p.example.com/one",
            "https://p.example.com/two",
            "https://p.example.com/three",
        ]);
        let fetcher = ScriptedFetcher::default()
            .page("https://p.example.com/one", &profile_page("One", &[]))
            .failing("https://p.example.com/two", 503)
            .page("https://p.example.com/three", &profile_page("Three", &[]));
        let sink = RecordingSink::default();

        let summary = run_batch(&source, &fetcher, &HeaderSet::default(), &sink)
            .await
            .unwrap();

        assert_eq!(
            summary,
            BatchSummary {
                total: 3,
                saved: 2,
                failed: 1
            }
        );
        assert_eq!(
            sink.saved_urls(),
            vec!["https://p.example.com/one", "https://p.example.com/three"]
        );
    }

    #[tokio::test]
    async fn test_missing_show_name_never_reaches_sink() {
        let source = InlineWorklist::from_urls(["https://p.example.com/blank"]);
        let fetcher = ScriptedFetcher::default().page(
            "https://p.example.com/blank",
            "<html><body><div class=\"description\">no heading</div></body></html>",
        );
        let sink = RecordingSink::default();

        let summary = run_batch(&source, &fetcher, &HeaderSet::default(), &sink)
            .await
            .unwrap();

        assert_eq!(summary.failed, 1);
        assert!(sink.saved.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_persistence_failure_counts_as_failed_item() {
        let source = InlineWorklist::from_urls(["https://p.example.com/a", "https://p.example.com/b"]);
        let fetcher = ScriptedFetcher::default()
            .page("https://p.example.com/a", &profile_page("A", &[]))
            .page("https://p.example.com/b", &profile_page("B", &[]));
        let sink = RecordingSink {
            reject_url: Some("https://p.example.com/a".to_string()),
            ..Default::default()
        };

        let summary = run_batch(&source, &fetcher, &HeaderSet::default(), &sink)
            .await
            .unwrap();

        assert_eq!(summary.saved, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(sink.saved_urls(), vec!["https://p.example.com/b"]);
    }

    #[tokio::test]
    async fn test_episode_failure_keeps_profile() {
        let source = InlineWorklist::from_urls(["https://p.example.com/show"]);
        let fetcher = ScriptedFetcher::default()
            .page(
                "https://p.example.com/show",
                &profile_page("Show", &["/e/1", "/e/2", "/e/3"]),
            )
            .page("https://p.example.com/e/1", &episode_page("First https://one.example.com"))
            .failing("https://p.example.com/e/2", 500)
            .page("https://p.example.com/e/3", &episode_page("Third team@three.example.com"));
        let sink = RecordingSink::default();

        let summary = run_batch(&source, &fetcher, &HeaderSet::default(), &sink)
            .await
            .unwrap();
        assert_eq!(summary.saved, 1);

        let saved = sink.saved.lock().unwrap();
        let row = saved[0].to_row();
        assert_eq!(row.show_name.as_deref(), Some("Show"));
        assert_eq!(
            row.episode_description.as_deref(),
            Some("First https://one.example.com◙Third team@three.example.com")
        );
        assert_eq!(
            row.links.as_deref(),
            Some("https://show.example.com◙https://one.example.com◙team@three.example.com")
        );
    }

    #[tokio::test]
    async fn test_empty_worklist_is_not_an_error() {
        let fetcher = ScriptedFetcher::default();
        let sink = RecordingSink::default();
        let summary = run_batch(&InlineWorklist::default(), &fetcher, &HeaderSet::default(), &sink)
            .await
            .unwrap();
        assert_eq!(summary, BatchSummary::default());
        assert!(fetcher.requested.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_worklist_failure_is_fatal() {
        let fetcher = ScriptedFetcher::default();
        let sink = RecordingSink::default();
        let err = run_batch(&BrokenSource, &fetcher, &HeaderSet::default(), &sink)
            .await
            .unwrap_err();
        assert!(matches!(err, ScrapeError::Database(_)));
    }
}
