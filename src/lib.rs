//! TripScout: live travel-inventory aggregation engine
//!
//! Turns a travel query (origin, destination, dates) into four independently
//! scraped, independently failing result sets, driven by a headless browser
//! against sites that expose no public API:
//! - Transportation (one-way and round-trip flights)
//! - Hotels
//! - Points of interest
//! - Travel articles ("tips and stories")
//!
//! Key components:
//! - `scraping::session`: anti-detection browser session factory
//! - `scraping::page`: rendered-page acquisition with bounded waits
//! - `scraping::{flights, hotels, places}`: per-source structural extractors
//! - `scraping::normalize`: required-field filtering, dedup, and ordering
//! - `scraping::retry`: bounded retry supervision for the flight sources
//! - `cache`: process-wide time-windowed response cache
//! - `search`: the query orchestrator fanning out to all four sources

pub mod cache;
pub mod config;
pub mod scraping;
pub mod search;
pub mod types;

pub use config::Config;
pub use search::SearchEngine;
pub use types::*;
