//! Candidate form discovery on the live listing page.
//!
//! The listing is ordinary HTML, not an API, so discovery is a fixed
//! heuristic over its anchors. Only the `I-` family is recognised; other
//! prefixes (N-, G-, AR-, ...) are never picked up by a sync.

use crate::catalog::FormEntry;
use crate::config::DEFAULT_BASE_ORIGIN;
use scraper::{Html, Selector};
use tracing::debug;

/// Turns listing markup into candidate (identifier, url) entries
pub trait FormExtractor: Send + Sync {
    fn extract(&self, markup: &str) -> Vec<FormEntry>;
}

/// A hyperlink as it appears in the markup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anchor {
    pub href: String,
    /// Text nodes, each trimmed, concatenated without separators
    pub text: String,
}

/// Collect every `<a href>` in document order.
///
/// Malformed markup never fails; it just yields fewer anchors.
pub fn parse_anchors(markup: &str) -> Vec<Anchor> {
    let document = Html::parse_document(markup);
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    document
        .select(&selector)
        .map(|element| Anchor {
            href: element.value().attr("href").unwrap_or("").to_string(),
            text: element.text().map(str::trim).collect(),
        })
        .collect()
}

/// The fixed link filter used against uscis.gov
#[derive(Debug, Clone)]
pub struct HeuristicExtractor {
    base_origin: String,
}

impl HeuristicExtractor {
    pub const DOCUMENT_EXTENSION: &'static str = ".pdf";
    pub const IDENTIFIER_PREFIX: &'static str = "I-";
    pub const MAX_IDENTIFIER_LEN: usize = 10;
    pub const RELATIVE_PREFIX: &'static str = "/sites";

    pub fn new(base_origin: impl Into<String>) -> Self {
        Self {
            base_origin: base_origin.into().trim_end_matches('/').to_string(),
        }
    }

    /// Whether an anchor names a form document
    pub fn accepts(anchor: &Anchor) -> bool {
        anchor.href.ends_with(Self::DOCUMENT_EXTENSION)
            && anchor.text.chars().count() <= Self::MAX_IDENTIFIER_LEN
            && anchor.text.starts_with(Self::IDENTIFIER_PREFIX)
    }

    /// Absolute URL for an accepted anchor
    pub fn resolve(&self, href: &str) -> String {
        if href.starts_with(Self::RELATIVE_PREFIX) {
            format!("{}{}", self.base_origin, href)
        } else {
            href.to_string()
        }
    }

    /// Lazily filter parsed anchors down to form entries
    pub fn candidates<'a>(
        &'a self,
        anchors: &'a [Anchor],
    ) -> impl Iterator<Item = FormEntry> + 'a {
        anchors
            .iter()
            .filter(|anchor| Self::accepts(anchor))
            .map(move |anchor| FormEntry::new(anchor.text.clone(), self.resolve(&anchor.href)))
    }
}

impl Default for HeuristicExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_ORIGIN)
    }
}

impl FormExtractor for HeuristicExtractor {
    fn extract(&self, markup: &str) -> Vec<FormEntry> {
        let anchors = parse_anchors(markup);
        let entries: Vec<FormEntry> = self.candidates(&anchors).collect();

        debug!(
            anchors = anchors.len(),
            candidates = entries.len(),
            "Extracted form candidates"
        );

        entries
    }
}
