//! Query orchestration
//!
//! [`SearchEngine`] owns the response cache, the extractors and a shared
//! [`PageSource`]. Each source runs its own pipeline: validate, consult the
//! cache, fetch and extract on a miss, normalize, store, respond. The full
//! fan-out runs all four concurrently; a failed source degrades to an empty
//! collection with a reason and never disturbs its siblings.

use crate::cache::{cache_key, ResponseCache, SourcePayload};
use crate::config::Config;
use crate::scraping::page::{BrowserPageSource, PageSource};
use crate::scraping::{
    normalize_flights, normalize_hotels, normalize_places, with_retry, FlightExtractor,
    HotelExtractor, PlaceCategory, PlaceExtractor, RetryPolicy, ScrapeError,
};
use crate::types::{
    ArticlesResponse, DestinationQuery, Flight, FlightQuery, Hotel, HotelQuery, HotelsResponse,
    Place, PointsOfInterestResponse, QueryError, SearchRequest, SearchResults, SourceKind,
    SourceOutcome, TransportationResponse, TripType,
};
use std::sync::Arc;
use tracing::{info, warn};

pub struct SearchEngine {
    cache: ResponseCache,
    pages: Arc<dyn PageSource>,
    flights: FlightExtractor,
    hotels: HotelExtractor,
    places: PlaceExtractor,
    retry: RetryPolicy,
}

impl SearchEngine {
    /// Build an engine backed by real browser sessions.
    pub fn new(config: &Config) -> Self {
        let pages = Arc::new(BrowserPageSource::new(
            config.browser.clone(),
            config.extraction.clone(),
        ));
        Self::with_page_source(config, pages)
    }

    /// Build an engine over an arbitrary page source. Tests use this to
    /// substitute a simulated browser.
    pub fn with_page_source(config: &Config, pages: Arc<dyn PageSource>) -> Self {
        Self {
            cache: ResponseCache::new(config.cache.ttl()),
            pages,
            flights: FlightExtractor::new(config.extraction.clone()),
            hotels: HotelExtractor::new(config.extraction.clone()),
            places: PlaceExtractor::new(config.extraction.clone()),
            retry: RetryPolicy::from(&config.retry),
        }
    }

    /// Flight search. Pipeline failure yields an empty collection; only
    /// caller errors surface.
    pub async fn search_transportation(
        &self,
        request: &SearchRequest,
    ) -> Result<TransportationResponse, QueryError> {
        let query = request.to_flight_query()?;
        let transportation = match self.flights_pipeline(&query).await {
            Ok(flights) => flights,
            Err(e) => {
                warn!("transportation pipeline failed: {e}");
                Vec::new()
            }
        };
        Ok(TransportationResponse { transportation })
    }

    /// Hotel search. Pipeline failure yields an empty collection.
    pub async fn search_hotels(
        &self,
        request: &SearchRequest,
    ) -> Result<HotelsResponse, QueryError> {
        let query = request.to_hotel_query()?;
        let hotels = match self.hotels_pipeline(&query).await {
            Ok(hotels) => hotels,
            Err(e) => {
                warn!("hotels pipeline failed: {e}");
                Vec::new()
            }
        };
        Ok(HotelsResponse { hotels })
    }

    /// Points-of-interest search. Pipeline failure yields an empty collection.
    pub async fn search_points_of_interest(
        &self,
        request: &SearchRequest,
    ) -> Result<PointsOfInterestResponse, QueryError> {
        let query = request.to_destination_query()?;
        let todo = match self
            .places_pipeline(&query, PlaceCategory::PointsOfInterest)
            .await
        {
            Ok(places) => places,
            Err(e) => {
                warn!("points-of-interest pipeline failed: {e}");
                Vec::new()
            }
        };
        Ok(PointsOfInterestResponse { todo })
    }

    /// Travel-article search. Pipeline failure yields an empty collection.
    pub async fn search_articles(
        &self,
        request: &SearchRequest,
    ) -> Result<ArticlesResponse, QueryError> {
        let query = request.to_destination_query()?;
        let tips_and_stories = match self.places_pipeline(&query, PlaceCategory::Articles).await {
            Ok(places) => places,
            Err(e) => {
                warn!("articles pipeline failed: {e}");
                Vec::new()
            }
        };
        Ok(ArticlesResponse { tips_and_stories })
    }

    /// Full fan-out: all four sources concurrently. Each outcome resolves
    /// independently; failures (caller or pipeline) degrade to an empty
    /// collection with a reason.
    pub async fn search(&self, request: &SearchRequest) -> SearchResults {
        info!("running full travel search");
        let (transportation, hotels, points_of_interest, articles) = tokio::join!(
            self.transportation_outcome(request),
            self.hotels_outcome(request),
            self.places_outcome(request, PlaceCategory::PointsOfInterest),
            self.places_outcome(request, PlaceCategory::Articles),
        );
        SearchResults {
            transportation,
            hotels,
            points_of_interest,
            articles,
        }
    }

    async fn transportation_outcome(&self, request: &SearchRequest) -> SourceOutcome<Flight> {
        let query = match request.to_flight_query() {
            Ok(query) => query,
            Err(e) => return SourceOutcome::failed(e.to_string()),
        };
        match self.flights_pipeline(&query).await {
            Ok(flights) => SourceOutcome::ok(flights),
            Err(e) => SourceOutcome::failed(e.to_string()),
        }
    }

    async fn hotels_outcome(&self, request: &SearchRequest) -> SourceOutcome<Hotel> {
        let query = match request.to_hotel_query() {
            Ok(query) => query,
            Err(e) => return SourceOutcome::failed(e.to_string()),
        };
        match self.hotels_pipeline(&query).await {
            Ok(hotels) => SourceOutcome::ok(hotels),
            Err(e) => SourceOutcome::failed(e.to_string()),
        }
    }

    async fn places_outcome(
        &self,
        request: &SearchRequest,
        category: PlaceCategory,
    ) -> SourceOutcome<Place> {
        let query = match request.to_destination_query() {
            Ok(query) => query,
            Err(e) => return SourceOutcome::failed(e.to_string()),
        };
        match self.places_pipeline(&query, category).await {
            Ok(places) => SourceOutcome::ok(places),
            Err(e) => SourceOutcome::failed(e.to_string()),
        }
    }

    /// Retry-supervised flight pipeline. Each attempt acquires its own
    /// browser session.
    async fn flights_pipeline(&self, query: &FlightQuery) -> Result<Vec<Flight>, ScrapeError> {
        let date = query.date.to_string();
        let return_date = query.return_date.map(|d| d.to_string()).unwrap_or_default();
        let trip_type = match query.trip_type {
            TripType::OneWay => "one-way",
            TripType::RoundTrip => "round-trip",
        };
        let key = cache_key(
            SourceKind::Transportation,
            &[
                ("from", &query.from),
                ("to", &query.to),
                ("date", &date),
                ("returnDate", &return_date),
                ("tripType", trip_type),
            ],
        );
        if let Some(SourcePayload::Transportation(flights)) = self.cache.get(&key) {
            return Ok(flights);
        }

        let target = self.flights.target(query);
        let html = with_retry(self.retry, |attempt| {
            let target = target.clone();
            async move {
                info!(attempt, url = %target.url, "flight extraction attempt");
                self.pages.fetch(&target).await
            }
        })
        .await?;

        let flights = normalize_flights(self.flights.extract(&html));
        self.cache
            .put(key, SourcePayload::Transportation(flights.clone()));
        Ok(flights)
    }

    async fn hotels_pipeline(&self, query: &HotelQuery) -> Result<Vec<Hotel>, ScrapeError> {
        let check_in = query.check_in.to_string();
        let key = cache_key(
            SourceKind::Hotels,
            &[("city", &query.city), ("checkIn", &check_in)],
        );
        if let Some(SourcePayload::Hotels(hotels)) = self.cache.get(&key) {
            return Ok(hotels);
        }

        let html = self.pages.fetch(&self.hotels.target(query)).await?;
        let hotels = normalize_hotels(self.hotels.extract(&html));
        self.cache.put(key, SourcePayload::Hotels(hotels.clone()));
        Ok(hotels)
    }

    async fn places_pipeline(
        &self,
        query: &DestinationQuery,
        category: PlaceCategory,
    ) -> Result<Vec<Place>, ScrapeError> {
        let kind = match category {
            PlaceCategory::PointsOfInterest => SourceKind::PointsOfInterest,
            PlaceCategory::Articles => SourceKind::Articles,
        };
        let key = cache_key(kind, &[("city", &query.city)]);
        if let Some(SourcePayload::Places(places)) = self.cache.get(&key) {
            return Ok(places);
        }

        let html = self.pages.fetch(&self.places.target(query, category)).await?;
        let places = normalize_places(self.places.extract(&html));
        self.cache.put(key, SourcePayload::Places(places.clone()));
        Ok(places)
    }
}
