//! Flight result extraction (Kayak)
//!
//! Builds the price-sorted search URL for one-way and round-trip queries and
//! pulls structured flight records out of the rendered results page. Every
//! field is individually fallible; a block missing fields still yields a raw
//! record and the required-field filter decides later whether it survives.

use crate::config::ExtractionConfig;
use crate::scraping::page::{PageTarget, ScrollPlan};
use crate::scraping::{first_match, selector, text_of};
use crate::types::FlightQuery;
use scraper::{Html, Selector};
use std::sync::OnceLock;
use tracing::debug;

const KAYAK_BASE: &str = "https://booking.kayak.com";
const KAYAK_LINK_BASE: &str = "https://www.kayak.com";
const VIEWPORT: (u32, u32) = (1366, 768);

/// A flight block as scraped, before required-field filtering.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawFlight {
    pub time: Option<String>,
    pub flight_name: Option<String>,
    pub stops: Option<String>,
    pub duration: Option<String>,
    pub price: Option<String>,
    pub from_code: Option<String>,
    pub to_code: Option<String>,
    pub provider: Option<String>,
    pub booking_link: Option<String>,
    pub carrier_logos: Vec<String>,
}

pub struct FlightExtractor {
    extraction: ExtractionConfig,
    containers: Vec<Selector>,
    time: Selector,
    name: Selector,
    stops: Selector,
    duration: Selector,
    airports: Selector,
    logos: Selector,
    price: Selector,
    booking_link: Selector,
    provider: Selector,
}

impl FlightExtractor {
    pub fn new(extraction: ExtractionConfig) -> Self {
        Self {
            extraction,
            containers: vec![
                selector(".nrc6"),
                selector("[data-resultid]"),
                selector("li.hJSA-item"),
            ],
            time: selector(".VY2U .vmXl"),
            name: selector(".VY2U .c_cgF.c_cgF-mod-variant-default"),
            stops: selector(".JWEO .vmXl.vmXl-mod-variant-default span"),
            duration: selector(".xdW8 .vmXl.vmXl-mod-variant-default"),
            airports: selector(".jLhY-airport-info span"),
            logos: selector(".c5iUd-leg-carrier img"),
            price: selector(".nrc6-price-section .e2GB-price-text"),
            booking_link: selector(".oVHK-fclink"),
            provider: selector(".DOum-name"),
        }
    }

    /// Price-ascending search URL; round-trip queries append the return date
    /// as an extra path segment.
    pub fn search_url(&self, query: &FlightQuery) -> String {
        let mut url = format!(
            "{KAYAK_BASE}/flights/{}-{}/{}",
            query.from, query.to, query.date
        );
        if let Some(return_date) = query.return_date {
            url.push('/');
            url.push_str(&return_date.to_string());
        }
        url.push_str("?sort=price_a");
        url
    }

    pub fn target(&self, query: &FlightQuery) -> PageTarget {
        PageTarget {
            url: self.search_url(query),
            viewport: VIEWPORT,
            ready_selectors: vec![
                "li.hJSA-item".to_string(),
                "[data-resultid]".to_string(),
                ".nrc6-price-section".to_string(),
            ],
            ready_timeout: self.extraction.content_wait(),
            scroll: ScrollPlan {
                passes: self.extraction.scroll_passes,
                settle: self.extraction.scroll_settle(),
            },
            image_selector: None,
        }
    }

    /// Extract raw flight blocks from the rendered results page. The first
    /// container selector that matches anything wins; malformed blocks are
    /// kept with missing fields, never fatal.
    pub fn extract(&self, html: &str) -> Vec<RawFlight> {
        let document = Html::parse_document(html);
        let root = document.root_element();

        let Some(blocks) = first_match(&root, &self.containers) else {
            debug!("no flight result containers found");
            return Vec::new();
        };
        debug!(count = blocks.len(), "flight result blocks found");

        blocks.iter().map(|block| self.extract_block(block)).collect()
    }

    fn extract_block(&self, block: &scraper::ElementRef<'_>) -> RawFlight {
        let time = block.select(&self.time).next().and_then(|e| text_of(&e));
        let flight_name = block.select(&self.name).next().and_then(|e| text_of(&e));
        let stops = block.select(&self.stops).next().and_then(|e| text_of(&e));
        let duration = block
            .select(&self.duration)
            .next()
            .and_then(|e| text_of(&e));

        // The first leg's two airport-info spans are the origin and
        // destination codes.
        let mut airport_codes = block
            .select(&self.airports)
            .filter_map(|e| text_of(&e));
        let from_code = airport_codes.next();
        let to_code = airport_codes.next();

        let carrier_logos: Vec<String> = block
            .select(&self.logos)
            .filter_map(|img| img.value().attr("src"))
            .map(str::to_string)
            .collect();

        let price = block
            .select(&self.price)
            .next()
            .and_then(|e| text_of(&e))
            .or_else(|| fallback_price(block));

        let booking_link = block
            .select(&self.booking_link)
            .next()
            .and_then(|a| a.value().attr("href"))
            .map(|href| {
                if href.starts_with("http") {
                    href.to_string()
                } else {
                    format!("{KAYAK_LINK_BASE}{href}")
                }
            });

        let provider = block
            .select(&self.provider)
            .next()
            .and_then(|e| text_of(&e))
            .or_else(|| flight_name.clone());

        RawFlight {
            time,
            flight_name,
            stops,
            duration,
            price,
            from_code,
            to_code,
            provider,
            booking_link,
            carrier_logos,
        }
    }
}

/// Scan a block's text for a currency-prefixed amount when the structured
/// price section is absent.
fn fallback_price(block: &scraper::ElementRef<'_>) -> Option<String> {
    static TOKEN: OnceLock<regex_lite::Regex> = OnceLock::new();
    let re = TOKEN.get_or_init(|| {
        regex_lite::Regex::new(r"\$[\d,]+").unwrap_or_else(|e| panic!("invalid regex: {e:?}"))
    });
    let text = block.text().collect::<Vec<_>>().join(" ");
    re.find(&text).map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TripType;
    use chrono::NaiveDate;

    fn extractor() -> FlightExtractor {
        FlightExtractor::new(ExtractionConfig::default())
    }

    fn query(return_date: Option<&str>) -> FlightQuery {
        FlightQuery {
            from: "JFK".to_string(),
            to: "LAX".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            return_date: return_date.map(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").unwrap()),
            trip_type: if return_date.is_some() {
                TripType::RoundTrip
            } else {
                TripType::OneWay
            },
        }
    }

    fn flight_block(price_section: &str, booking_href: &str) -> String {
        format!(
            r#"<div class="nrc6">
                <div class="VY2U">
                    <div class="vmXl">6:00 am - 9:15 am</div>
                    <div class="c_cgF c_cgF-mod-variant-default">Delta</div>
                </div>
                <div class="JWEO"><div class="vmXl vmXl-mod-variant-default"><span>nonstop</span></div></div>
                <div class="xdW8"><div class="vmXl vmXl-mod-variant-default">6h 15m</div></div>
                <div class="jLhY-airport-info"><span>JFK</span></div>
                <div class="jLhY-airport-info"><span>LAX</span></div>
                <div class="c5iUd-leg-carrier"><img src="https://content.kayak.com/dl.png"></div>
                {price_section}
                <a class="oVHK-fclink" href="{booking_href}">View Deal</a>
                <div class="DOum-name">KAYAK</div>
            </div>"#
        )
    }

    #[test]
    fn one_way_url_has_single_date_segment() {
        let url = extractor().search_url(&query(None));
        assert_eq!(
            url,
            "https://booking.kayak.com/flights/JFK-LAX/2025-06-01?sort=price_a"
        );
    }

    #[test]
    fn round_trip_url_appends_return_date() {
        let url = extractor().search_url(&query(Some("2025-06-08")));
        assert_eq!(
            url,
            "https://booking.kayak.com/flights/JFK-LAX/2025-06-01/2025-06-08?sort=price_a"
        );
    }

    #[test]
    fn extracts_complete_block() {
        let html = flight_block(
            r#"<div class="nrc6-price-section"><div class="e2GB-price-text">$412</div></div>"#,
            "/book/flight?code=abc",
        );
        let flights = extractor().extract(&html);
        assert_eq!(flights.len(), 1);
        let f = &flights[0];
        assert_eq!(f.time.as_deref(), Some("6:00 am - 9:15 am"));
        assert_eq!(f.flight_name.as_deref(), Some("Delta"));
        assert_eq!(f.stops.as_deref(), Some("nonstop"));
        assert_eq!(f.duration.as_deref(), Some("6h 15m"));
        assert_eq!(f.price.as_deref(), Some("$412"));
        assert_eq!(f.from_code.as_deref(), Some("JFK"));
        assert_eq!(f.to_code.as_deref(), Some("LAX"));
        assert_eq!(f.provider.as_deref(), Some("KAYAK"));
        assert_eq!(f.carrier_logos, vec!["https://content.kayak.com/dl.png"]);
    }

    #[test]
    fn relative_booking_link_resolved_against_kayak() {
        let html = flight_block(
            r#"<div class="nrc6-price-section"><div class="e2GB-price-text">$412</div></div>"#,
            "/book/flight?code=abc",
        );
        let flights = extractor().extract(&html);
        assert_eq!(
            flights[0].booking_link.as_deref(),
            Some("https://www.kayak.com/book/flight?code=abc")
        );
    }

    #[test]
    fn absolute_booking_link_kept_verbatim() {
        let html = flight_block(
            r#"<div class="nrc6-price-section"><div class="e2GB-price-text">$412</div></div>"#,
            "https://www.delta.com/deal",
        );
        let flights = extractor().extract(&html);
        assert_eq!(
            flights[0].booking_link.as_deref(),
            Some("https://www.delta.com/deal")
        );
    }

    #[test]
    fn price_falls_back_to_currency_token_in_block_text() {
        let html = flight_block(r#"<div class="pricing">from $1,388 total</div>"#, "/x");
        let flights = extractor().extract(&html);
        assert_eq!(flights[0].price.as_deref(), Some("$1,388"));
    }

    #[test]
    fn block_without_price_yields_none() {
        let html = flight_block("", "/x");
        let flights = extractor().extract(&html);
        assert_eq!(flights.len(), 1);
        assert!(flights[0].price.is_none());
    }

    #[test]
    fn no_containers_yields_empty() {
        let flights = extractor().extract("<html><body><p>captcha</p></body></html>");
        assert!(flights.is_empty());
    }

    #[test]
    fn provider_falls_back_to_flight_name() {
        let html = r#"<div class="nrc6">
            <div class="VY2U">
                <div class="vmXl">7:00 am - 10:00 am</div>
                <div class="c_cgF c_cgF-mod-variant-default">United</div>
            </div>
        </div>"#;
        let flights = extractor().extract(html);
        assert_eq!(flights[0].provider.as_deref(), Some("United"));
    }
}
