//! Profile aggregation: one work item in, one validated record out.
//!
//! Stages run in order:
//!
//! ```text
//! FetchProfile -> ExtractProfile -> DiscoverEpisodes
//!   -> for each episode { FetchEpisode -> ExtractDescription }
//!   -> Merge -> Validate -> Done
//! ```
//!
//! A failure while fetching the profile or at validation fails the whole
//! item. Episode failures are logged and the episode is left out of the
//! merged record.

use crate::error::{Result, ScrapeError};
use crate::fetch::PageFetcher;
use crate::headers::HeaderSet;
use crate::models::{ExtractedProfile, FinalRecord, WorkItem};
use crate::scrapers::episodes::{EpisodeDetails, extract_episode_details, extract_episode_links};
use crate::scrapers::profile::extract_profile_fields;
use scraper::Html;
use tracing::{debug, info, instrument, warn};

/// Aggregation stage, recorded on log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    FetchProfile,
    ExtractProfile,
    DiscoverEpisodes,
    FetchEpisode,
    ExtractDescription,
    Merge,
    Validate,
}

/// Builds a [`FinalRecord`] from a profile page and its episode pages.
#[derive(Debug)]
pub struct ProfileAggregator<'a, F> {
    fetcher: &'a F,
    headers: &'a HeaderSet,
}

impl<'a, F: PageFetcher> ProfileAggregator<'a, F> {
    pub fn new(fetcher: &'a F, headers: &'a HeaderSet) -> Self {
        Self { fetcher, headers }
    }

    /// Run every stage for one work item.
    #[instrument(level = "info", skip_all, fields(url = %item.url))]
    pub async fn aggregate(&self, item: &WorkItem) -> Result<FinalRecord> {
        debug!(stage = ?Stage::FetchProfile);
        let body = self.fetcher.fetch_body(&item.url, self.headers).await?;

        debug!(stage = ?Stage::ExtractProfile);
        let (profile, episode_urls) = parse_profile(&body, &item.url);

        let mut record = FinalRecord::from_profile(profile, item.search_id.clone());
        let discovered = episode_urls.len();

        let mut episodes = Vec::with_capacity(discovered);
        for episode_url in &episode_urls {
            if let Some(details) = self.episode(episode_url).await {
                episodes.push(details);
            }
        }

        debug!(stage = ?Stage::Merge, discovered, extracted = episodes.len());
        merge_episodes(&mut record, episodes);

        debug!(stage = ?Stage::Validate);
        validate(&record)?;

        info!(
            show_name = %record.show_name,
            episodes = record.episode_descriptions.len(),
            links = record.links.len(),
            "Aggregated profile"
        );
        Ok(record)
    }

    /// Fetch and extract one episode. Failures are logged and swallowed.
    async fn episode(&self, episode_url: &str) -> Option<EpisodeDetails> {
        debug!(stage = ?Stage::FetchEpisode, %episode_url);
        let body = match self.fetcher.fetch_body(episode_url, self.headers).await {
            Ok(body) => body,
            Err(e) => {
                warn!(%episode_url, error = %e, "Episode fetch failed; skipping episode");
                return None;
            }
        };

        debug!(stage = ?Stage::ExtractDescription, %episode_url);
        let details = extract_episode_details(&Html::parse_document(&body));
        if details.is_none() {
            warn!(%episode_url, "Episode page has no description; skipping episode");
        }
        details
    }
}

/// Parse a profile body into its fields and episode links.
///
/// Kept synchronous so the parsed document never lives across an await.
fn parse_profile(body: &str, url: &str) -> (ExtractedProfile, Vec<String>) {
    let document = Html::parse_document(body);
    let profile = extract_profile_fields(&document, url);
    debug!(stage = ?Stage::DiscoverEpisodes);
    let episode_urls = extract_episode_links(&document, url);
    (profile, episode_urls)
}

/// Union episode links into the record and append episode descriptions.
fn merge_episodes(record: &mut FinalRecord, episodes: Vec<EpisodeDetails>) {
    for episode in episodes {
        record.links.merge(&episode.links);
        if !episode.description.is_empty() {
            record.episode_descriptions.push(episode.description);
        }
    }
}

/// Reject records missing a show name or URL.
pub fn validate(record: &FinalRecord) -> Result<()> {
    if record.url.trim().is_empty() {
        return Err(ScrapeError::Validation {
            url: record.url.clone(),
            field: "url",
        });
    }
    if record.show_name.trim().is_empty() {
        return Err(ScrapeError::Validation {
            url: record.url.clone(),
            field: "show_name",
        });
    }
    Ok(())
}
