//! Small helpers for text normalization, log excerpts and the data directory.

use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::path::Path;
use tokio::fs;
use tracing::{debug, instrument};

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Collapse every run of whitespace to a single space and trim both ends.
///
/// All text pulled out of a document goes through this before it is
/// compared, stored or scanned for links.
///
/// ```ignore
/// assert_eq!(clean_text("  Daily \n\t Show "), "Daily Show");
/// ```
pub fn clean_text(value: &str) -> String {
    WHITESPACE.replace_all(value, " ").trim().to_string()
}

/// Truncate a string for logging and error excerpts.
///
/// Cuts at a character boundary, so multi-byte text never panics.
///
/// # Returns
///
/// The original string if it has at most `max` characters, otherwise the
/// first `max` characters with `"…(+N bytes)"` appended.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        None => s.to_string(),
        Some((cut, _)) => format!("{}…(+{} bytes)", &s[..cut], s.len() - cut),
    }
}

/// Ensure the data directory exists.
///
/// Creates the directory and any missing parents. The header override file
/// and dry-run output both live here.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn ensure_data_dir(path: &Path) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(path).await?;
    debug!("Data directory ready");
    Ok(())
}
