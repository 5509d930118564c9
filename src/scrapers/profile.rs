//! Show-level field extraction from a profile page.
//!
//! Profile pages come in (at least) two markup templates with different
//! hashed class names, so every field has its own fallback chain. The
//! primary selector of each chain targets the current template.

use super::selectors::{FieldChain, Strategy};
use crate::links::extract_link_set;
use crate::models::ExtractedProfile;
use crate::rating::parse_reviews_and_rate;
use once_cell::sync::Lazy;
use scraper::Html;
use tracing::{debug, instrument};

static SHOW_NAME: Lazy<FieldChain> = Lazy::new(|| {
    FieldChain::new(
        "show_name",
        vec![
            Strategy::text(".headings.svelte-1uuona0 h1"),
            Strategy::text(".headings h1"),
            Strategy::text(".product-header__title"),
        ],
    )
});

static HOST_NAME: Lazy<FieldChain> = Lazy::new(|| {
    FieldChain::new(
        "host_name",
        vec![
            Strategy::text(".headings__subtitles .svelte-123qhuj"),
            Strategy::text(".headings.svelte-1uuona0 .subtitle-action.svelte-16t2ez2"),
            Strategy::text(".headings__subtitles"),
            Strategy::text(".product-header__identity"),
        ],
    )
});

static SHOW_DESCRIPTION: Lazy<FieldChain> = Lazy::new(|| {
    FieldChain::new(
        "show_description",
        vec![
            Strategy::text(".description .truncate-wrapper p"),
            Strategy::text(
                ".section.section--paragraph.svelte-1cj8vg9.section--display-separator .shelf-content > div",
            ),
            Strategy::text(".product-hero-desc p"),
            Strategy::attr("meta[property='og:description']", "content"),
        ],
    )
});

static RATING_LINE: Lazy<FieldChain> = Lazy::new(|| {
    FieldChain::new(
        "rating",
        vec![
            Strategy::text(".metadata.svelte-123qhuj li:nth-child(1)"),
            Strategy::text(".metadata li:nth-child(1)"),
        ],
    )
});

static CATEGORY: Lazy<FieldChain> = Lazy::new(|| {
    FieldChain::new(
        "category",
        vec![
            Strategy::text(".metadata.svelte-123qhuj li:nth-child(2)"),
            Strategy::text(".metadata li:nth-child(2)"),
        ],
    )
});

/// Pull show-level fields out of a parsed profile page.
///
/// Missing fields come back empty; whether the profile is usable is
/// decided later, at validation.
#[instrument(level = "debug", skip_all, fields(%url))]
pub fn extract_profile_fields(document: &Html, url: &str) -> ExtractedProfile {
    let show_name = SHOW_NAME.extract(document);
    let host_name = HOST_NAME.extract(document);

    let (show_description, links) = match SHOW_DESCRIPTION.find(document) {
        Some(found) => {
            debug!(strategy = found.strategy_index, "Matched show description");
            let links = extract_link_set(&found.link_source());
            (found.text, links)
        }
        None => Default::default(),
    };

    let rating = parse_reviews_and_rate(&RATING_LINE.extract(document));
    let category = CATEGORY.extract(document);

    debug!(
        %show_name,
        has_host = !host_name.is_empty(),
        links = links.len(),
        "Extracted profile fields"
    );

    ExtractedProfile {
        url: url.trim().to_string(),
        show_name,
        host_name,
        show_description,
        links,
        reviews: rating.reviews,
        rate: rating.rate,
        category,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CURRENT_TEMPLATE: &str = r#"
        <html><body>
          <div class="headings svelte-1uuona0">
            <h1>  The   Daily
              Example </h1>
            <div class="headings__subtitles"><span class="svelte-123qhuj">Example Media</span></div>
          </div>
          <div class="description">
            <div class="truncate-wrapper">
              <p>Daily news. Visit https://example.com/show or www.patreon.com/example.
                 Write to hello@example.com, follow @dailyexample.
                 <a href="https://shop.example.com">Shop</a></p>
            </div>
          </div>
          <ul class="metadata svelte-123qhuj">
            <li>4.5 (1,203 Ratings)</li>
            <li>News</li>
          </ul>
        </body></html>
    "#;

    const LEGACY_TEMPLATE: &str = r#"
        <html><body>
          <div class="headings svelte-1uuona0">
            <h1>Legacy Show</h1>
            <a class="subtitle-action svelte-16t2ez2">Legacy Host</a>
          </div>
          <section class="section section--paragraph svelte-1cj8vg9 section--display-separator">
            <div class="shelf-content"><div>Older layout description.</div></div>
          </section>
        </body></html>
    "#;

    #[test]
    fn test_current_template() {
        let doc = Html::parse_document(CURRENT_TEMPLATE);
        let profile = extract_profile_fields(&doc, "https://example.com/podcast/id1 ");

        assert_eq!(profile.url, "https://example.com/podcast/id1");
        assert_eq!(profile.show_name, "The Daily Example");
        assert_eq!(profile.host_name, "Example Media");
        assert!(profile.show_description.starts_with("Daily news. Visit"));
        assert_eq!(profile.rate, "4.5");
        assert_eq!(profile.reviews, "1,203 Ratings");
        assert_eq!(profile.category, "News");

        let links: Vec<&str> = profile.links.iter().collect();
        assert_eq!(
            links,
            vec![
                "https://example.com/show",
                "hello@example.com",
                "@dailyexample",
                "https://shop.example.com",
            ]
        );
    }

    #[test]
    fn test_legacy_template_fallbacks() {
        let doc = Html::parse_document(LEGACY_TEMPLATE);
        let profile = extract_profile_fields(&doc, "https://example.com/podcast/id2");

        assert_eq!(profile.show_name, "Legacy Show");
        assert_eq!(profile.host_name, "Legacy Host");
        assert_eq!(profile.show_description, "Older layout description.");
        assert!(profile.links.is_empty());
        assert_eq!(profile.rate, "");
        assert_eq!(profile.reviews, "");
        assert_eq!(profile.category, "");
    }

    #[test]
    fn test_inline_markup_does_not_split_words() {
        let doc = Html::parse_document(
            r#"<html><body>
              <div class="headings svelte-1uuona0"><h1>Pod<span>cast</span> Hour</h1></div>
              <div class="description"><div class="truncate-wrapper">
                <p>More at https://example.com/<b>show</b> every <i>w</i>eek</p>
              </div></div>
            </body></html>"#,
        );
        let profile = extract_profile_fields(&doc, "https://example.com/podcast/id3");

        assert_eq!(profile.show_name, "Podcast Hour");
        assert_eq!(profile.show_description, "More at https://example.com/show every week");
        assert_eq!(profile.links.join(), "https://example.com/show");
    }

    #[test]
    fn test_unknown_page_yields_empty_fields() {
        let doc = Html::parse_document("<html><body><p>Nothing to see</p></body></html>");
        let profile = extract_profile_fields(&doc, "https://example.com/x");
        assert_eq!(profile.show_name, "");
        assert_eq!(profile.host_name, "");
        assert_eq!(profile.show_description, "");
    }
}
