//! Heuristic parsing of the rating metadata line.
//!
//! Catalog pages render the rating as free text with no fixed format, e.g.
//! `4.5 (1,203 Ratings)`, `4.5 1203` or `Not enough ratings`. The parser
//! never fails; it degrades to handing back the whole line as `reviews`.

use crate::models::RatingSummary;
use crate::utils::clean_text;
use once_cell::sync::Lazy;
use regex::Regex;

static RATE_WITH_PARENTHETICAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([0-9]+(?:\.[0-9]+)?)\s*\(([^)]+)\)").unwrap());
static NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9]+(?:\.[0-9]+)?").unwrap());

/// Split a metadata line into `rate` and `reviews`.
///
/// Rules, first match wins:
/// 1. `<number> (<text>)`: rate is the number, reviews the text in parentheses.
/// 2. Two or more numbers: rate is the first, reviews the second.
/// 3. Otherwise rate is the first number (or empty) and reviews the whole line.
pub fn parse_reviews_and_rate(metadata_text: &str) -> RatingSummary {
    let cleaned = clean_text(metadata_text);
    if cleaned.is_empty() {
        return RatingSummary::default();
    }

    if let Some(caps) = RATE_WITH_PARENTHETICAL.captures(&cleaned) {
        return RatingSummary {
            rate: caps[1].to_string(),
            reviews: caps[2].to_string(),
        };
    }

    let numbers: Vec<&str> = NUMBER.find_iter(&cleaned).map(|m| m.as_str()).collect();
    if let [rate, reviews, ..] = numbers.as_slice() {
        return RatingSummary {
            rate: rate.to_string(),
            reviews: reviews.to_string(),
        };
    }

    RatingSummary {
        rate: numbers.first().map(|n| n.to_string()).unwrap_or_default(),
        reviews: cleaned,
    }
}
