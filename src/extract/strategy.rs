//! Ordered field-extraction strategies
//!
//! Each review field is read through a [`FieldChain`]: a list of
//! (selector, pick) strategies tried in order, first non-empty result wins.

use crate::extract::ExtractError;
use scraper::{ElementRef, Selector};
use url::Url;

/// What to read from the first element a selector matches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pick {
    /// Visible text, whitespace collapsed
    Text,
    /// Value of the named attribute, trimmed
    Attr(&'static str),
}

/// One selector plus what to read from it
#[derive(Debug, Clone)]
pub struct Strategy {
    css: &'static str,
    selector: Selector,
    pick: Pick,
}

impl Strategy {
    pub fn new(css: &'static str, pick: Pick) -> Result<Self, ExtractError> {
        let selector = Selector::parse(css).map_err(|e| ExtractError::Selector {
            selector: css.to_string(),
            message: e.to_string(),
        })?;

        Ok(Self { css, selector, pick })
    }

    /// Reads text from the first element matching the selector
    pub fn text(css: &'static str) -> Result<Self, ExtractError> {
        Self::new(css, Pick::Text)
    }

    /// Reads an attribute from the first element matching the selector
    pub fn attr(css: &'static str, name: &'static str) -> Result<Self, ExtractError> {
        Self::new(css, Pick::Attr(name))
    }

    pub fn css(&self) -> &str {
        self.css
    }

    /// Applies the strategy inside `scope`; empty values count as a miss
    pub fn apply(&self, scope: ElementRef<'_>) -> Option<String> {
        let element = scope.select(&self.selector).next()?;

        let value = match self.pick {
            Pick::Text => collapse_whitespace(&element.text().collect::<String>()),
            Pick::Attr(name) => element.value().attr(name)?.trim().to_string(),
        };

        if value.is_empty() {
            None
        } else {
            Some(value)
        }
    }
}

/// Strategies for one field, in priority order
#[derive(Debug, Clone)]
pub struct FieldChain {
    strategies: Vec<Strategy>,
}

impl FieldChain {
    pub fn new(strategies: Vec<Strategy>) -> Self {
        Self { strategies }
    }

    pub fn strategies(&self) -> &[Strategy] {
        &self.strategies
    }

    /// First non-empty value any strategy yields
    pub fn first_match(&self, scope: ElementRef<'_>) -> Option<String> {
        self.strategies.iter().find_map(|s| s.apply(scope))
    }

    /// First value any strategy yields that `accept` turns into a `T`
    ///
    /// A strategy whose raw value is rejected falls through to the next one.
    pub fn first_valid<T>(
        &self,
        scope: ElementRef<'_>,
        accept: impl Fn(&str) -> Option<T>,
    ) -> Option<T> {
        self.strategies
            .iter()
            .find_map(|s| s.apply(scope).and_then(|raw| accept(&raw)))
    }

    /// First match, or `placeholder` when every strategy misses
    pub fn or_placeholder(&self, scope: ElementRef<'_>, placeholder: &str) -> String {
        self.first_match(scope)
            .unwrap_or_else(|| placeholder.to_string())
    }
}

/// Collapses runs of whitespace to single spaces and trims the ends
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Parses a star rating out of a machine value ("4") or a rendered label
/// ("4/5", "Оценка: 4 из 5")
///
/// Only the part before a '/' is considered and its digits are read as one
/// number. Anything outside 1..=5 is rejected.
pub fn parse_rating(raw: &str) -> Option<u8> {
    let head = raw.split('/').next().unwrap_or(raw);
    let head = head.split(" из ").next().unwrap_or(head);

    // Machine values such as "4.0" carry a fractional part
    let integral = match head.trim().parse::<f64>() {
        Ok(value) if value.fract() == 0.0 => return rating_in_range(value as i64),
        Ok(_) => return None,
        Err(_) => head,
    };

    let digits: String = integral.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }

    rating_in_range(digits.parse::<i64>().ok()?)
}

fn rating_in_range(value: i64) -> Option<u8> {
    u8::try_from(value)
        .ok()
        .filter(|rating| crate::review::is_valid_rating(*rating))
}

/// Resolves a review link against the site origin
///
/// Returns None if the link should be dropped:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs and fragment-only links
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
pub fn resolve_link(href: &str, origin: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    let absolute = origin.join(href).ok()?;
    if absolute.scheme() == "http" || absolute.scheme() == "https" {
        Some(absolute.to_string())
    } else {
        None
    }
}

/// Reduces a URL to its origin with a root path, for resolving links
pub fn site_origin(url: &Url) -> Url {
    let mut origin = url.clone();
    origin.set_path("/");
    origin.set_query(None);
    origin.set_fragment(None);
    origin
}
