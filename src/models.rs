//! Data models for work items, extracted profiles and stored records.
//!
//! This module defines the core data structures used throughout the application:
//! - [`WorkItem`]: One pending profile URL drawn from the worklist
//! - [`ExtractedProfile`]: Show-level fields pulled from a single profile page
//! - [`FinalRecord`]: A profile merged with its episodes, ready to store
//! - [`ProfileRow`]: The column-by-column storage form of a [`FinalRecord`]

use crate::links::{LINK_DELIMITER, LinkSet};
use serde::{Deserialize, Serialize};

/// A pending profile page to harvest.
///
/// # Fields
///
/// * `url` - The profile page URL, trimmed and non-empty
/// * `search_id` - Opaque identifier carried through to the stored row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    pub url: String,
    pub search_id: Option<String>,
}

impl WorkItem {
    /// Build a work item from a raw worklist row.
    ///
    /// Returns `None` when the URL is missing or blank.
    pub fn from_row(url: Option<String>, search_id: Option<String>) -> Option<Self> {
        let url = url?.trim().to_string();
        if url.is_empty() {
            return None;
        }
        Some(WorkItem {
            url,
            search_id: search_id.filter(|id| !id.trim().is_empty()),
        })
    }
}

/// Rating line split into its numeric rate and review description.
///
/// Both fields are empty when the page carries no rating metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RatingSummary {
    pub rate: String,
    pub reviews: String,
}

/// Show-level fields extracted from one profile page.
///
/// All text is whitespace-normalized and may be empty; only an empty
/// `show_name` is rejected, and that happens at validation time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedProfile {
    /// The profile page URL the fields were extracted from.
    pub url: String,
    pub show_name: String,
    pub host_name: String,
    pub show_description: String,
    /// References found in the show description.
    pub links: LinkSet,
    pub reviews: String,
    pub rate: String,
    pub category: String,
}

/// A fully aggregated profile, the only entity written to storage.
///
/// `links` is the union of profile-level and episode-level references.
/// `episode_descriptions` keeps one entry per successfully extracted
/// episode, in discovery order, duplicates included.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FinalRecord {
    pub search_id: Option<String>,
    pub url: String,
    pub show_name: String,
    pub host_name: String,
    pub show_description: String,
    pub links: LinkSet,
    pub reviews: String,
    pub rate: String,
    pub category: String,
    pub episode_descriptions: Vec<String>,
}

impl FinalRecord {
    /// Fold an extracted profile into a record for the given work item.
    pub fn from_profile(profile: ExtractedProfile, search_id: Option<String>) -> Self {
        FinalRecord {
            search_id,
            url: profile.url,
            show_name: profile.show_name,
            host_name: profile.host_name,
            show_description: profile.show_description,
            links: profile.links,
            reviews: profile.reviews,
            rate: profile.rate,
            category: profile.category,
            episode_descriptions: Vec::new(),
        }
    }

    /// Flatten into storage columns. Empty text becomes `None`.
    ///
    /// A delimiter already present in a description is replaced with a
    /// space so the joined column splits back into the same entries.
    pub fn to_row(&self) -> ProfileRow {
        let episode_description = self
            .episode_descriptions
            .iter()
            .map(|d| d.replace(LINK_DELIMITER, " ").trim().to_string())
            .filter(|d| !d.is_empty())
            .collect::<Vec<_>>()
            .join(&LINK_DELIMITER.to_string());

        ProfileRow {
            search_id: self.search_id.as_deref().and_then(normalize_field),
            url: normalize_field(&self.url),
            show_name: normalize_field(&self.show_name),
            host_name: normalize_field(&self.host_name),
            show_description: normalize_field(&self.show_description),
            links: normalize_field(&self.links.join()),
            reviews: normalize_field(&self.reviews),
            rate: normalize_field(&self.rate),
            category: normalize_field(&self.category),
            episode_description: normalize_field(&episode_description),
        }
    }
}

/// Storage form of a [`FinalRecord`], one field per destination column in
/// insert order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileRow {
    pub search_id: Option<String>,
    pub url: Option<String>,
    pub show_name: Option<String>,
    pub host_name: Option<String>,
    pub show_description: Option<String>,
    pub links: Option<String>,
    pub reviews: Option<String>,
    pub rate: Option<String>,
    pub category: Option<String>,
    pub episode_description: Option<String>,
}

/// Outcome counts for one batch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub total: usize,
    pub saved: usize,
    pub failed: usize,
}

/// Trim a column value, mapping empty text to `None`.
pub fn normalize_field(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_work_item_from_row_drops_blank_url() {
        assert_eq!(WorkItem::from_row(None, Some("7".into())), None);
        assert_eq!(WorkItem::from_row(Some("   ".into()), None), None);

        let item = WorkItem::from_row(Some(" https://example.com/p ".into()), Some("".into()))
            .unwrap();
        assert_eq!(item.url, "https://example.com/p");
        assert_eq!(item.search_id, None);
    }

    #[test]
    fn test_to_row_maps_empty_to_none() {
        let record = FinalRecord {
            search_id: Some("42".to_string()),
            url: "https://example.com/p".to_string(),
            show_name: "The Show".to_string(),
            host_name: String::new(),
            show_description: "  ".to_string(),
            ..Default::default()
        };

        let row = record.to_row();
        assert_eq!(row.search_id.as_deref(), Some("42"));
        assert_eq!(row.show_name.as_deref(), Some("The Show"));
        assert_eq!(row.host_name, None);
        assert_eq!(row.show_description, None);
        assert_eq!(row.links, None);
        assert_eq!(row.episode_description, None);
    }

    #[test]
    fn test_to_row_joins_multi_value_columns() {
        let record = FinalRecord {
            url: "https://example.com/p".to_string(),
            show_name: "The Show".to_string(),
            links: LinkSet::from_joined("https://a.example.com◙@host"),
            episode_descriptions: vec![
                "First episode".to_string(),
                String::new(),
                "First episode".to_string(),
            ],
            ..Default::default()
        };

        let row = record.to_row();
        assert_eq!(row.links.as_deref(), Some("https://a.example.com◙@host"));
        assert_eq!(
            row.episode_description.as_deref(),
            Some("First episode◙First episode")
        );
    }

    #[test]
    fn test_delimiter_inside_description_is_replaced() {
        let record = FinalRecord {
            url: "https://example.com/p".to_string(),
            show_name: "The Show".to_string(),
            episode_descriptions: vec![
                "Part one◙part two".to_string(),
                "◙".to_string(),
                "Finale".to_string(),
            ],
            ..Default::default()
        };

        let column = record.to_row().episode_description.unwrap();
        assert_eq!(column, "Part one part two◙Finale");
        assert_eq!(column.split(LINK_DELIMITER).count(), 2);
    }

    #[test]
    fn test_profile_row_serializes_nulls() {
        let row = ProfileRow {
            url: Some("https://example.com/p".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["url"], "https://example.com/p");
        assert!(json["show_name"].is_null());
    }
}
