//! Points-of-interest and travel-article extraction (Lonely Planet)
//!
//! Both categories come from the same search page and share one extractor;
//! only the `sortBy` query parameter differs. The category label on each
//! card doubles as the description when no richer text is present.

use crate::config::ExtractionConfig;
use crate::scraping::page::{PageTarget, ScrollPlan};
use crate::scraping::{selector, text_of};
use crate::types::DestinationQuery;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

const LONELY_PLANET_BASE: &str = "https://www.lonelyplanet.com";
const VIEWPORT: (u32, u32) = (1920, 1080);

/// Which Lonely Planet result set to ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceCategory {
    PointsOfInterest,
    Articles,
}

impl PlaceCategory {
    fn sort_by(&self) -> &'static str {
        match self {
            PlaceCategory::PointsOfInterest => "pois",
            PlaceCategory::Articles => "articles",
        }
    }
}

/// A search card as scraped, before required-field filtering.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawPlace {
    pub name: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub link: Option<String>,
}

pub struct PlaceExtractor {
    extraction: ExtractionConfig,
    card: Selector,
    name: Selector,
    link: Selector,
    image: Selector,
    label: Selector,
}

impl PlaceExtractor {
    pub fn new(extraction: ExtractionConfig) -> Self {
        Self {
            extraction,
            card: selector("article.card-hover"),
            name: selector("a.card-link span"),
            link: selector("a.card-link"),
            image: selector("img"),
            label: selector("p.text-label.uppercase"),
        }
    }

    pub fn search_url(&self, query: &DestinationQuery, category: PlaceCategory) -> String {
        format!(
            "{LONELY_PLANET_BASE}/search?q={}&sortBy={}",
            urlencoding::encode(&query.city),
            category.sort_by()
        )
    }

    pub fn target(&self, query: &DestinationQuery, category: PlaceCategory) -> PageTarget {
        PageTarget {
            url: self.search_url(query, category),
            viewport: VIEWPORT,
            ready_selectors: vec!["article.card-hover".to_string()],
            ready_timeout: self.extraction.content_wait(),
            scroll: ScrollPlan {
                passes: self.extraction.scroll_passes,
                settle: self.extraction.scroll_settle(),
            },
            image_selector: None,
        }
    }

    pub fn extract(&self, html: &str) -> Vec<RawPlace> {
        let document = Html::parse_document(html);
        let cards: Vec<_> = document.select(&self.card).collect();
        debug!(count = cards.len(), "place cards found");
        cards.iter().map(|card| self.extract_card(card)).collect()
    }

    fn extract_card(&self, card: &ElementRef<'_>) -> RawPlace {
        let name = card.select(&self.name).next().and_then(|e| text_of(&e));
        let image_url = card
            .select(&self.image)
            .next()
            .and_then(|img| img.value().attr("src"))
            .filter(|src| !src.is_empty())
            .map(str::to_string);
        let link = card
            .select(&self.link)
            .next()
            .and_then(|a| a.value().attr("href"))
            .map(resolve_link);
        let description = card.select(&self.label).next().and_then(|e| text_of(&e));

        RawPlace {
            name,
            description,
            image_url,
            link,
        }
    }
}

fn resolve_link(href: &str) -> String {
    if href.starts_with("http") {
        href.to_string()
    } else {
        format!("{LONELY_PLANET_BASE}/{}", href.trim_start_matches('/'))
    }
}
