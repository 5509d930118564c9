//! Episode link discovery and episode description extraction.
//!
//! # URL Pattern
//!
//! Episode links on a profile page are usually relative
//! (`/us/podcast/some-episode/id123?i=1000`) and are resolved against the
//! profile URL. Repeated links are kept: each occurrence is fetched.

use super::selectors::{FieldChain, Strategy, compile};
use crate::links::{LinkSet, extract_link_set};
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use tracing::{debug, instrument};
use url::Url;

/// Episode list anchors, in priority order. The first selector that matches
/// any anchor decides the list.
static EPISODE_ANCHORS: Lazy<Vec<Selector>> = Lazy::new(|| {
    [
        "[data-testid='episodes-list'] a[href]",
        ".episodes-list a[href]",
        "ol.tracks a.link-action[href]",
        ".shelf-content ol a[href*='?i=']",
    ]
    .into_iter()
    .map(compile)
    .collect()
});

static EPISODE_DESCRIPTION: Lazy<FieldChain> = Lazy::new(|| {
    FieldChain::new(
        "episode_description",
        vec![
            Strategy::text("[data-testid='paragraph']"),
            Strategy::text(".product-hero-desc"),
            Strategy::text(".episode-description"),
            Strategy::attr("meta[property='og:description']", "content"),
        ],
    )
});

/// Description and references extracted from one episode page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EpisodeDetails {
    pub description: String,
    pub links: LinkSet,
}

/// Enumerate episode-detail links on a profile page as absolute URLs.
///
/// Document order is preserved and duplicates are kept. References that are
/// empty, fragment-only, `javascript:`, unresolvable or not http(s) are
/// dropped.
#[instrument(level = "debug", skip_all, fields(base_url = %base_url))]
pub fn extract_episode_links(document: &Html, base_url: &str) -> Vec<String> {
    let Ok(base) = Url::parse(base_url.trim()) else {
        debug!("Base URL does not parse; no episode links resolved");
        return Vec::new();
    };

    let Some(anchors) = EPISODE_ANCHORS
        .iter()
        .map(|selector| document.select(selector).collect::<Vec<_>>())
        .find(|anchors| !anchors.is_empty())
    else {
        debug!("No episode list found");
        return Vec::new();
    };

    let links: Vec<String> = anchors
        .into_iter()
        .filter_map(|a| a.value().attr("href"))
        .map(str::trim)
        .filter(|href| {
            !href.is_empty()
                && !href.starts_with('#')
                && !href.to_ascii_lowercase().starts_with("javascript:")
        })
        .filter_map(|href| base.join(href).ok())
        .filter(|resolved| matches!(resolved.scheme(), "http" | "https"))
        .map(|resolved| resolved.to_string())
        .collect();

    debug!(count = links.len(), "Discovered episode links");
    links
}

/// Pull the long-form description (and its references) from an episode page.
///
/// Returns `None` when no description strategy matches.
pub fn extract_episode_details(document: &Html) -> Option<EpisodeDetails> {
    let found = EPISODE_DESCRIPTION.find(document)?;
    let links = extract_link_set(&found.link_source());
    Some(EpisodeDetails {
        description: found.text,
        links,
    })
}
