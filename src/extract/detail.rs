//! Detail page extraction
//!
//! Fetches a review's own page and pulls out the full review body. Any
//! failure leaves the caller with its teaser.

use crate::crawler::PageFetcher;
use crate::extract::ExtractError;
use scraper::{ElementRef, Html, Selector};

/// Candidate body containers, first match wins
const BODY_CANDIDATES: [&str; 3] = [".review-body", ".full-review", "[itemprop=reviewBody]"];

/// Subtrees that never contribute review text
const STRIPPED_TAGS: [&str; 6] = ["script", "style", "noscript", "button", "a", "template"];

/// Tags whose boundaries become line breaks
const BLOCK_TAGS: [&str; 10] = [
    "p",
    "div",
    "li",
    "ul",
    "ol",
    "h1",
    "h2",
    "h3",
    "blockquote",
    "section",
];

/// Pulls full review text from detail pages
#[derive(Debug, Clone)]
pub struct DetailExtractor {
    fetcher: PageFetcher,
    candidates: Vec<Selector>,
}

impl DetailExtractor {
    /// Creates an extractor that fetches through `fetcher`
    pub fn new(fetcher: PageFetcher) -> Result<Self, ExtractError> {
        let candidates = BODY_CANDIDATES
            .iter()
            .map(|css| {
                Selector::parse(css).map_err(|e| ExtractError::Selector {
                    selector: css.to_string(),
                    message: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            fetcher,
            candidates,
        })
    }

    /// Fetches `detail_url` and returns the full review text, if any
    pub async fn extract_full_text(&self, detail_url: &str) -> Option<String> {
        let body = match self.fetcher.fetch(detail_url).await.into_body() {
            Some(body) => body,
            None => {
                tracing::warn!(url = detail_url, "Detail page unavailable, keeping teaser");
                return None;
            }
        };

        let text = self.parse_body(&body);
        if text.is_none() {
            tracing::warn!(url = detail_url, "No review body found on detail page");
        }
        text
    }

    /// Extracts the review body from detail page HTML
    pub fn parse_body(&self, html: &str) -> Option<String> {
        let document = Html::parse_document(html);

        let container = self
            .candidates
            .iter()
            .find_map(|selector| document.select(selector).next())?;

        let mut raw = String::new();
        collect_text(container, &mut raw);

        let text = raw
            .lines()
            .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\n");

        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

/// Appends the visible text under `element`, marking block boundaries with
/// newlines and skipping non-content subtrees
fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(text);
            continue;
        }

        let Some(child) = ElementRef::wrap(child) else {
            continue;
        };

        let name = child.value().name();
        if STRIPPED_TAGS.contains(&name) {
            continue;
        }

        if name == "br" {
            out.push('\n');
            continue;
        }

        let is_block = BLOCK_TAGS.contains(&name);
        if is_block {
            out.push('\n');
        }
        collect_text(child, out);
        if is_block {
            out.push('\n');
        }
    }
}
