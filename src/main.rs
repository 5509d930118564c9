//! # Podcast Profiles
//!
//! Harvests podcast show profiles from catalog pages. URLs come from a
//! worklist view in Postgres; each profile page is fetched (directly or via
//! a rendering proxy), its show-level fields and episode pages are
//! extracted, and one normalized row per profile is written back.
//!
//! ## Usage
//!
//! ```sh
//! podcast_profiles                       # worklist -> Postgres
//! podcast_profiles --dry-run --url URL   # single page -> data/profiles-<date>.jsonl
//! ```
//!
//! ## Architecture
//!
//! The application follows a sequential pipeline:
//! 1. **Setup**: Load configuration, build the request header set, open the pool
//! 2. **Worklist**: Load every pending URL once
//! 3. **Aggregation**: Per URL, fetch the profile and its episodes and merge them
//! 4. **Persistence**: Validate and write each record in its own transaction
//!
//! A failing item is logged and skipped; only setup and worklist failures
//! end the run with a non-zero exit status.

use clap::Parser;
use std::error::Error;
use tracing::{debug, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod aggregator;
mod cli;
mod error;
mod fetch;
mod headers;
mod links;
mod models;
mod rating;
mod runner;
mod scrapers;
mod store;
mod utils;

use cli::Cli;
use fetch::HttpFetcher;
use headers::HeaderSet;
use store::{InlineWorklist, JsonLinesSink, PgStore, Sink, Source};
use utils::ensure_data_dir;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenvy::dotenv().ok();

    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("podcast_profiles starting up");

    let args = Cli::parse();
    debug!(data_dir = %args.data_dir.display(), dry_run = args.dry_run, urls = args.urls.len(), "Parsed CLI arguments");

    ensure_data_dir(&args.data_dir).await?;

    let overrides = headers::load_overrides(&args.headers_file()).await;
    let headers = HeaderSet::from_defaults(&args.header_defaults()).with_overrides(&overrides);
    info!(count = headers.len(), "Request headers ready");

    let fetcher = HttpFetcher::new(args.fetch_strategy()?)?;
    info!(strategy = ?fetcher.strategy(), "Fetch client ready");

    let store = if args.needs_database() {
        Some(PgStore::connect(&args.db_settings(), args.table_names()).await?)
    } else {
        None
    };

    let source = match (&store, args.urls.is_empty()) {
        (Some(store), true) => Source::Database(store),
        _ => Source::Inline(InlineWorklist::from_urls(args.urls.iter().cloned())),
    };
    let sink = match (&store, args.dry_run) {
        (Some(store), false) => Sink::Database(store),
        _ => {
            let sink = JsonLinesSink::for_today(&args.data_dir);
            info!(path = %sink.path().display(), "Writing records as JSON lines");
            Sink::JsonLines(sink)
        }
    };

    let outcome = runner::run_batch(&source, &fetcher, &headers, &sink).await;

    if let Some(store) = &store {
        store.close().await;
    }
    let summary = outcome?;

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        total = summary.total,
        saved = summary.saved,
        failed = summary.failed,
        "Execution complete"
    );

    Ok(())
}
