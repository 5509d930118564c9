//! Link and mention extraction from free text.
//!
//! Descriptions are scanned for four kinds of reference:
//!
//! | Kind | Example | Domain filtered |
//! |------|---------|-----------------|
//! | Absolute URL | `https://example.com/show` | yes |
//! | Bare host | `www.example.com` | yes |
//! | Email | `host@example.com` | no |
//! | Mention | `@handle` | no |
//!
//! Matches are collected into a [`LinkSet`], which keeps first-occurrence
//! order and drops duplicates. The set is only flattened into a single
//! string (joined with [`LINK_DELIMITER`]) at the storage boundary.
//!
//! The delimiter is excluded from every pattern, so scanning an already
//! joined string yields the same tokens again.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use std::ops::Range;
use url::Url;

/// Reserved separator for flattened multi-value columns.
pub const LINK_DELIMITER: char = '◙';

/// Hosts that never count as show links (exact match or any subdomain).
pub const BLOCKED_DOMAINS: &[&str] = &["patreon.com", "speaker.com"];

static URL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)https?://[^\s"'<>◙]+"#).unwrap());
static WWW_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)\bwww\.[^\s"'<>◙]+"#).unwrap());
static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[A-Za-z0-9._%+\-]+@[A-Za-z0-9](?:[A-Za-z0-9\-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9\-]*[A-Za-z0-9])?)*\.[A-Za-z]{2,}").unwrap()
});
static MENTION_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|[^A-Za-z0-9_@.])(@[A-Za-z0-9_](?:[A-Za-z0-9_.]*[A-Za-z0-9_])?)").unwrap()
});

/// Trailing characters that end a sentence rather than a URL.
const TRAILING_PUNCTUATION: &[char] = &['.', ',', ';', ':', '!', '?', ')', ']'];

/// Ordered, deduplicated collection of extracted references.
///
/// Identity is the trimmed, lower-cased token; the first spelling seen is
/// the one kept. Tokens never contain [`LINK_DELIMITER`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkSet {
    items: Vec<String>,
    seen: HashSet<String>,
}

impl LinkSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a token, returning `false` if it was blank or already present.
    pub fn insert(&mut self, token: &str) -> bool {
        let token = token.trim();
        if token.is_empty() || token.contains(LINK_DELIMITER) {
            return false;
        }
        if !self.seen.insert(token.to_lowercase()) {
            return false;
        }
        self.items.push(token.to_string());
        true
    }

    /// Union another set into this one, preserving this set's order first.
    pub fn merge(&mut self, other: &LinkSet) {
        for token in &other.items {
            self.insert(token);
        }
    }

    /// Rebuild a set from a delimiter-joined string.
    #[cfg(test)]
    pub fn from_joined(joined: &str) -> Self {
        let mut set = LinkSet::new();
        for token in joined.split(LINK_DELIMITER) {
            set.insert(token);
        }
        set
    }

    pub fn join(&self) -> String {
        self.items.join(&LINK_DELIMITER.to_string())
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[cfg(test)]
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(String::as_str)
    }
}

/// Whether a URL or bare host belongs to a blocked domain.
///
/// Values without a scheme are parsed as `https://`. Anything that does not
/// parse as a URL with a host is not blocked.
pub fn is_blocked_domain(value: &str) -> bool {
    let value = value.trim();
    if value.is_empty() {
        return false;
    }

    let lower = value.to_ascii_lowercase();
    let normalized = if lower.starts_with("http://") || lower.starts_with("https://") {
        value.to_string()
    } else {
        format!("https://{value}")
    };

    let Ok(parsed) = Url::parse(&normalized) else {
        return false;
    };
    let Some(host) = parsed.host_str() else {
        return false;
    };
    let host = host.to_ascii_lowercase();

    BLOCKED_DOMAINS
        .iter()
        .any(|domain| host == *domain || host.ends_with(&format!(".{domain}")))
}

/// Scan `text` for URLs, bare hosts, emails and mentions.
///
/// URL and host matches on [`BLOCKED_DOMAINS`] are dropped before
/// deduplication. Emails and mentions skip the domain filter. A mention
/// that occurs literally inside an extracted email, or whose handle is the
/// email's local part (`me@example.com` vs `@me`), is treated as part of
/// that email and dropped.
pub fn extract_link_set(text: &str) -> LinkSet {
    let mut set = LinkSet::new();
    if text.trim().is_empty() {
        return set;
    }

    // (start offset, token), sorted by offset at the end.
    let mut found: Vec<(usize, String)> = Vec::new();
    let mut claimed: Vec<Range<usize>> = Vec::new();

    for m in URL_PATTERN.find_iter(text) {
        let token = m.as_str().trim_end_matches(TRAILING_PUNCTUATION);
        claimed.push(m.start()..m.end());
        if !is_blocked_domain(token) {
            found.push((m.start(), token.to_string()));
        }
    }

    for m in WWW_PATTERN.find_iter(text) {
        if overlaps(&claimed, m.start()..m.end()) {
            continue;
        }
        let token = m.as_str().trim_end_matches(TRAILING_PUNCTUATION);
        claimed.push(m.start()..m.end());
        if !is_blocked_domain(token) {
            found.push((m.start(), token.to_string()));
        }
    }

    let mut emails: Vec<String> = Vec::new();
    for m in EMAIL_PATTERN.find_iter(text) {
        if overlaps(&claimed, m.start()..m.end()) {
            continue;
        }
        claimed.push(m.start()..m.end());
        emails.push(m.as_str().to_lowercase());
        found.push((m.start(), m.as_str().to_string()));
    }

    for caps in MENTION_PATTERN.captures_iter(text) {
        let Some(m) = caps.get(1) else { continue };
        if overlaps(&claimed, m.start()..m.end()) {
            continue;
        }
        if belongs_to_email(&emails, m.as_str()) {
            continue;
        }
        found.push((m.start(), m.as_str().to_string()));
    }

    found.sort_by_key(|(start, _)| *start);
    for (_, token) in found {
        set.insert(&token);
    }
    set
}

/// Extract and flatten in one step; see [`extract_link_set`].
#[cfg(test)]
pub fn extract_links(text: &str) -> String {
    extract_link_set(text).join()
}

/// `emails` are lower-cased; `mention` includes the leading `@`.
fn belongs_to_email(emails: &[String], mention: &str) -> bool {
    let mention = mention.to_lowercase();
    let handle = &mention[1..];
    emails.iter().any(|email| {
        email.contains(&mention) || email.split('@').next() == Some(handle)
    })
}

fn overlaps(claimed: &[Range<usize>], candidate: Range<usize>) -> bool {
    claimed
        .iter()
        .any(|r| r.start < candidate.end && candidate.start < r.end)
}
