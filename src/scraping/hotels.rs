//! Hotel result extraction (Booking.com)
//!
//! Builds the two-adult, one-room search URL for a stay and pulls structured
//! hotel records out of the rendered property cards. The checkout date is
//! auto-advanced by one day when it equals the check-in date, since a
//! zero-night stay returns nothing.

use crate::config::ExtractionConfig;
use crate::scraping::page::{PageTarget, ScrollPlan};
use crate::scraping::{parse_price, selector, text_of};
use crate::types::HotelQuery;
use chrono::{Days, NaiveDate};
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

const BOOKING_BASE: &str = "https://www.booking.com/searchresults.html";
const VIEWPORT: (u32, u32) = (1920, 1080);

/// Placeholder shown when a card's image never hydrates.
pub const FALLBACK_IMAGE: &str =
    "https://images.unsplash.com/photo-1501117716987-c8e1ecb210af?auto=format&fit=crop&w=1200&q=80";

/// A property card as scraped, before required-field filtering.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawHotel {
    pub name: Option<String>,
    pub price: Option<f64>,
    pub rating: Option<String>,
    pub location: Option<String>,
    pub booking_link: Option<String>,
    pub amenities: Vec<String>,
    pub image_url: Option<String>,
    pub description: Option<String>,
}

pub struct HotelExtractor {
    extraction: ExtractionConfig,
    card: Selector,
    title: Selector,
    price: Selector,
    rating: Selector,
    address: Selector,
    link: Selector,
    amenities: Selector,
    images: Vec<Selector>,
    description: Selector,
}

impl HotelExtractor {
    pub fn new(extraction: ExtractionConfig) -> Self {
        Self {
            extraction,
            card: selector("[data-testid=\"property-card\"]"),
            title: selector("[data-testid=\"title\"]"),
            price: selector("[data-testid=\"price-and-discounted-price\"]"),
            rating: selector("[data-testid=\"review-score\"] .f63b14ab7a"),
            address: selector("[data-testid=\"address\"]"),
            link: selector("a"),
            amenities: selector("[data-testid=\"facility-icons\"] span"),
            images: vec![
                selector("[data-testid=\"property-card-desktop-single-image\"] img"),
                selector("[data-testid=\"image\"] img"),
                selector("[data-testid=\"image\"]"),
                selector("img"),
            ],
            description: selector("[data-testid=\"description\"]"),
        }
    }

    /// The checkout used for the search: one night minimum.
    pub fn stay_range(check_in: NaiveDate) -> (NaiveDate, NaiveDate) {
        let check_out = check_in
            .checked_add_days(Days::new(1))
            .unwrap_or(check_in);
        (check_in, check_out)
    }

    pub fn search_url(&self, query: &HotelQuery) -> String {
        let (check_in, check_out) = Self::stay_range(query.check_in);
        let city = urlencoding::encode(&query.city);
        format!(
            "{BOOKING_BASE}?ss={city}&ssne={city}&ssne_untouched={city}\
             &checkin={check_in}&checkout={check_out}\
             &group_adults=2&no_rooms=1&group_children=0&selected_currency=usd"
        )
    }

    pub fn target(&self, query: &HotelQuery) -> PageTarget {
        PageTarget {
            url: self.search_url(query),
            viewport: VIEWPORT,
            ready_selectors: vec!["[data-testid=\"property-card\"]".to_string()],
            ready_timeout: self.extraction.content_wait(),
            scroll: ScrollPlan {
                passes: self.extraction.scroll_passes,
                settle: self.extraction.scroll_settle(),
            },
            image_selector: Some("[data-testid=\"property-card\"] img".to_string()),
        }
    }

    pub fn extract(&self, html: &str) -> Vec<RawHotel> {
        let document = Html::parse_document(html);
        let cards: Vec<_> = document.select(&self.card).collect();
        debug!(count = cards.len(), "hotel property cards found");
        cards.iter().map(|card| self.extract_card(card)).collect()
    }

    fn extract_card(&self, card: &ElementRef<'_>) -> RawHotel {
        let name = card.select(&self.title).next().and_then(|e| text_of(&e));
        let price = card
            .select(&self.price)
            .next()
            .and_then(|e| text_of(&e))
            .and_then(|text| parse_price(&text));
        let rating = card.select(&self.rating).next().and_then(|e| text_of(&e));
        let location = card.select(&self.address).next().and_then(|e| text_of(&e));
        let booking_link = card
            .select(&self.link)
            .next()
            .and_then(|a| a.value().attr("href"))
            .map(str::to_string);
        let amenities = card
            .select(&self.amenities)
            .filter_map(|e| text_of(&e))
            .collect();
        let image_url = self.image_url(card);
        let description = card
            .select(&self.description)
            .next()
            .and_then(|e| text_of(&e));

        RawHotel {
            name,
            price,
            rating,
            location,
            booking_link,
            amenities,
            image_url,
            description,
        }
    }

    /// Resolve the card image through the lazy-load attribute chain:
    /// `src`, `data-src`, `data-lazy`, `data-lazy-src`, then the first http
    /// entry of `srcset`. `None` means the caller substitutes the placeholder.
    fn image_url(&self, card: &ElementRef<'_>) -> Option<String> {
        let img = self
            .images
            .iter()
            .find_map(|sel| card.select(sel).next())?;
        let attrs = img.value();
        for attr in ["src", "data-src", "data-lazy", "data-lazy-src"] {
            if let Some(value) = attrs.attr(attr) {
                if !value.is_empty() {
                    return Some(value.to_string());
                }
            }
        }
        attrs.attr("srcset").and_then(|srcset| {
            srcset
                .split(',')
                .filter_map(|entry| entry.trim().split(' ').next())
                .find(|candidate| candidate.starts_with("http"))
                .map(str::to_string)
        })
    }
}
