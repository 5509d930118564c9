//! Ordered selector fallback chains.
//!
//! Catalog pages ship in more than one template, so every field is looked
//! up through a list of [`Strategy`] values tried in priority order. The
//! first strategy that produces non-empty normalized text wins.

use crate::utils::clean_text;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use tracing::trace;

/// One way of reading a field out of a document.
#[derive(Debug)]
pub enum Strategy {
    /// Text content of the first element matching the selector.
    Text(Selector),
    /// Attribute value of the first element matching the selector.
    Attr(Selector, &'static str),
}

impl Strategy {
    pub fn text(css: &str) -> Self {
        Strategy::Text(compile(css))
    }

    pub fn attr(css: &str, attribute: &'static str) -> Self {
        Strategy::Attr(compile(css), attribute)
    }

    /// Apply the strategy, returning the normalized text and the element it
    /// came from.
    fn apply<'a>(&self, document: &'a Html) -> Option<(String, ElementRef<'a>)> {
        match self {
            Strategy::Text(selector) => document.select(selector).next().map(|el| {
                let text = clean_text(&el.text().collect::<String>());
                (text, el)
            }),
            Strategy::Attr(selector, attribute) => document
                .select(selector)
                .next()
                .and_then(|el| el.value().attr(attribute).map(|v| (clean_text(v), el))),
        }
    }
}

/// A field's fallback chain.
#[derive(Debug)]
pub struct FieldChain {
    pub field: &'static str,
    pub strategies: Vec<Strategy>,
}

/// The winning match of a chain.
#[derive(Debug)]
pub struct FieldMatch<'a> {
    pub text: String,
    pub element: ElementRef<'a>,
    /// Position of the winning strategy in the chain.
    pub strategy_index: usize,
}

impl FieldMatch<'_> {
    /// Matched text plus the anchor targets inside the matched element,
    /// space-separated, for link extraction.
    pub fn link_source(&self) -> String {
        let mut parts = vec![self.text.clone()];
        parts.extend(anchor_hrefs(self.element));
        parts.join(" ")
    }
}

impl FieldChain {
    pub fn new(field: &'static str, strategies: Vec<Strategy>) -> Self {
        Self { field, strategies }
    }

    /// First strategy yielding non-empty text, with its element.
    pub fn find<'a>(&self, document: &'a Html) -> Option<FieldMatch<'a>> {
        let found = self
            .strategies
            .iter()
            .enumerate()
            .find_map(|(strategy_index, strategy)| {
                strategy
                    .apply(document)
                    .filter(|(text, _)| !text.is_empty())
                    .map(|(text, element)| FieldMatch {
                        text,
                        element,
                        strategy_index,
                    })
            });
        if found.is_none() {
            trace!(field = self.field, "No strategy matched");
        }
        found
    }

    /// Normalized text of the first successful strategy, or empty.
    pub fn extract(&self, document: &Html) -> String {
        self.find(document).map(|m| m.text).unwrap_or_default()
    }
}

/// `href` of the element itself (if an anchor) and of every anchor inside it.
pub fn anchor_hrefs(element: ElementRef<'_>) -> Vec<String> {
    static ANCHORS: Lazy<Selector> = Lazy::new(|| compile("a[href]"));

    element
        .value()
        .attr("href")
        .into_iter()
        .chain(element.select(&ANCHORS).filter_map(|a| a.value().attr("href")))
        .map(|href| href.trim().to_string())
        .filter(|href| !href.is_empty())
        .collect()
}

/// Compile a selector known at build time.
///
/// Chains are built from string literals, so a parse failure is a
/// programming error.
pub fn compile(css: &str) -> Selector {
    Selector::parse(css).unwrap_or_else(|e| panic!("invalid selector {css:?}: {e}"))
}
