//! Headless-browser extraction subsystem
//!
//! Each source pipeline runs the same shape: launch an anti-detection browser
//! session, acquire the rendered page with bounded waits, extract structured
//! records from the HTML, normalize them. The browser side lives behind the
//! [`page::PageSource`] trait so extractors and the orchestrator never touch
//! chromiumoxide directly.

pub mod flights;
pub mod hotels;
pub mod normalize;
pub mod page;
pub mod places;
pub mod retry;
pub mod session;

pub use flights::FlightExtractor;
pub use hotels::HotelExtractor;
pub use normalize::{normalize_flights, normalize_hotels, normalize_places};
pub use page::{BrowserPageSource, PageSource, PageTarget, ScrollPlan};
pub use places::{PlaceCategory, PlaceExtractor};
pub use retry::{with_retry, RetryPolicy};
pub use session::{BrowserSession, SessionStats};

use scraper::{ElementRef, Selector};
use std::sync::OnceLock;
use std::time::Duration;
use thiserror::Error;

/// Failures local to one source pipeline. None of these cross pipeline
/// boundaries; the orchestrator converts them into empty results.
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// The page never loaded or the navigation was rejected.
    #[error("navigation failed: {0}")]
    Navigation(String),

    /// The content-readiness marker never appeared within the wait budget,
    /// including the single reload fallback.
    #[error("content did not appear within {0:?}")]
    Timeout(Duration),

    /// The browser session could not be launched or driven.
    #[error("browser session error: {0}")]
    Session(String),

    /// The rendered document could not be interpreted at all.
    #[error("parse error: {0}")]
    Parse(String),
}

/// Compile a CSS selector literal. Only called with fixed, known-good
/// selector strings.
pub(crate) fn selector(css: &str) -> Selector {
    Selector::parse(css).unwrap_or_else(|e| panic!("invalid selector '{css}': {e:?}"))
}

/// First selector in `selectors` that matches at least one element under
/// `root` wins; returns its matches.
pub(crate) fn first_match<'a>(
    root: &ElementRef<'a>,
    selectors: &[Selector],
) -> Option<Vec<ElementRef<'a>>> {
    for selector in selectors {
        let found: Vec<ElementRef<'a>> = root.select(selector).collect();
        if !found.is_empty() {
            return Some(found);
        }
    }
    None
}

/// Collapsed, trimmed text of an element, or `None` when empty.
pub(crate) fn text_of(element: &ElementRef<'_>) -> Option<String> {
    let text = element
        .text()
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Pull the first numeric amount out of a price string such as "$1,234.50"
/// or "US$95 per night". Thousands separators are stripped before parsing.
pub(crate) fn parse_price(raw: &str) -> Option<f64> {
    static AMOUNT: OnceLock<regex_lite::Regex> = OnceLock::new();
    let re = AMOUNT.get_or_init(|| {
        regex_lite::Regex::new(r"[0-9][0-9,]*(\.[0-9]+)?")
            .unwrap_or_else(|e| panic!("invalid regex: {e:?}"))
    });
    let m = re.find(raw)?;
    m.as_str().replace(',', "").parse::<f64>().ok()
}
