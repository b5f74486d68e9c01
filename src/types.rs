//! Core types for the TripScout engine

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// One of the four independent travel-data categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceKind {
    Transportation,
    Hotels,
    PointsOfInterest,
    Articles,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Transportation => "transportation",
            SourceKind::Hotels => "hotels",
            SourceKind::PointsOfInterest => "points-of-interest",
            SourceKind::Articles => "articles",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a flight search covers one leg or both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TripType {
    #[default]
    OneWay,
    RoundTrip,
}

/// Caller-side request validation failures. These are request errors,
/// never extraction errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("invalid date '{0}': expected YYYY-MM-DD")]
    InvalidDate(String),
}

// ============================================================================
// Validated queries
// ============================================================================

/// A validated flight search. Immutable once issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlightQuery {
    /// Origin IATA code
    pub from: String,
    /// Destination IATA code
    pub to: String,
    /// Departure date
    pub date: NaiveDate,
    /// Return date (round-trip only)
    pub return_date: Option<NaiveDate>,
    pub trip_type: TripType,
}

/// A validated hotel search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HotelQuery {
    pub city: String,
    pub check_in: NaiveDate,
}

/// A validated destination-only search (points of interest, articles).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationQuery {
    pub city: String,
}

// ============================================================================
// Wire shapes (the HTTP boundary is maintained by an external collaborator;
// these are the request/response bodies the core supports)
// ============================================================================

/// One end of a trip as supplied by the caller.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iata_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
}

/// Raw search request body. Individual operations validate the subset
/// of fields they need.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<EndpointRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<EndpointRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trip_type: Option<TripType>,
}

fn parse_date(raw: &str) -> Result<NaiveDate, QueryError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| QueryError::InvalidDate(raw.to_string()))
}

impl SearchRequest {
    /// Validate the fields a transportation search needs.
    ///
    /// A round-trip request without a return date degrades to one-way rather
    /// than erroring, matching what callers actually send.
    pub fn to_flight_query(&self) -> Result<FlightQuery, QueryError> {
        let from = self
            .from
            .as_ref()
            .and_then(|e| e.iata_code.as_deref())
            .filter(|s| !s.is_empty())
            .ok_or(QueryError::MissingParameter("from.iataCode"))?;
        let to = self
            .to
            .as_ref()
            .and_then(|e| e.iata_code.as_deref())
            .filter(|s| !s.is_empty())
            .ok_or(QueryError::MissingParameter("to.iataCode"))?;
        let date = parse_date(
            self.date
                .as_deref()
                .ok_or(QueryError::MissingParameter("date"))?,
        )?;
        let return_date = self.return_date.as_deref().map(parse_date).transpose()?;

        let trip_type = match (self.trip_type.unwrap_or_default(), return_date) {
            (TripType::RoundTrip, Some(_)) => TripType::RoundTrip,
            _ => TripType::OneWay,
        };
        let return_date = match trip_type {
            TripType::RoundTrip => return_date,
            TripType::OneWay => None,
        };

        Ok(FlightQuery {
            from: from.to_string(),
            to: to.to_string(),
            date,
            return_date,
            trip_type,
        })
    }

    /// Validate the fields a hotel search needs.
    pub fn to_hotel_query(&self) -> Result<HotelQuery, QueryError> {
        let city = self
            .to
            .as_ref()
            .and_then(|e| e.city.as_deref())
            .filter(|s| !s.is_empty())
            .ok_or(QueryError::MissingParameter("to.city"))?;
        let check_in = parse_date(
            self.date
                .as_deref()
                .ok_or(QueryError::MissingParameter("date"))?,
        )?;
        Ok(HotelQuery {
            city: city.to_string(),
            check_in,
        })
    }

    /// Validate the fields a destination-only search needs.
    pub fn to_destination_query(&self) -> Result<DestinationQuery, QueryError> {
        let city = self
            .to
            .as_ref()
            .and_then(|e| e.city.as_deref())
            .filter(|s| !s.is_empty())
            .ok_or(QueryError::MissingParameter("to.city"))?;
        Ok(DestinationQuery {
            city: city.to_string(),
        })
    }
}

// ============================================================================
// Normalized records
// ============================================================================

/// A flight that passed the required-field filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flight {
    pub time: String,
    pub flight_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stops: Option<String>,
    pub duration: String,
    /// Display price as scraped (e.g. "$412")
    pub price: String,
    pub from_code: String,
    pub to_code: String,
    /// Synthetic route label derived from the two airport-code fragments
    pub airline_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub booking_link: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub carrier_logos: Vec<String>,
}

/// A hotel that passed the required-field filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hotel {
    pub name: String,
    /// Nightly price; absent when the price widget never rendered
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    pub currency: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub booking_link: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub amenities: Vec<String>,
    pub image_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A point of interest or travel article that passed the required-field filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Place {
    pub name: String,
    pub description: String,
    pub image_url: String,
    pub link: String,
}

// ============================================================================
// Outcomes
// ============================================================================

/// The result of one source pipeline: an ordered record collection, plus a
/// human-readable failure reason when the pipeline failed entirely.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceOutcome<T> {
    pub records: Vec<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> SourceOutcome<T> {
    pub fn ok(records: Vec<T>) -> Self {
        Self {
            records,
            error: None,
        }
    }

    /// A failed source degrades to an empty collection with a reason.
    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            records: Vec::new(),
            error: Some(reason.into()),
        }
    }

    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }
}

/// All four source outcomes of a full fan-out. Each field resolves
/// independently; no source blocks or aborts the others.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResults {
    pub transportation: SourceOutcome<Flight>,
    pub hotels: SourceOutcome<Hotel>,
    pub points_of_interest: SourceOutcome<Place>,
    pub articles: SourceOutcome<Place>,
}

/// Response body for a transportation search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportationResponse {
    pub transportation: Vec<Flight>,
}

/// Response body for a hotel search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HotelsResponse {
    pub hotels: Vec<Hotel>,
}

/// Response body for a points-of-interest search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointsOfInterestResponse {
    pub todo: Vec<Place>,
}

/// Response body for a travel-articles search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticlesResponse {
    #[serde(rename = "tipsAndStories")]
    pub tips_and_stories: Vec<Place>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_request() -> SearchRequest {
        SearchRequest {
            from: Some(EndpointRef {
                iata_code: Some("JFK".to_string()),
                city: None,
            }),
            to: Some(EndpointRef {
                iata_code: Some("LAX".to_string()),
                city: Some("Los Angeles".to_string()),
            }),
            date: Some("2025-06-01".to_string()),
            return_date: Some("2025-06-08".to_string()),
            trip_type: Some(TripType::RoundTrip),
        }
    }

    #[test]
    fn flight_query_round_trip() {
        let query = full_request().to_flight_query().unwrap();
        assert_eq!(query.from, "JFK");
        assert_eq!(query.to, "LAX");
        assert_eq!(query.trip_type, TripType::RoundTrip);
        assert_eq!(
            query.return_date,
            Some(NaiveDate::from_ymd_opt(2025, 6, 8).unwrap())
        );
    }

    #[test]
    fn flight_query_missing_origin_is_caller_error() {
        let mut request = full_request();
        request.from = None;
        assert_eq!(
            request.to_flight_query().unwrap_err(),
            QueryError::MissingParameter("from.iataCode")
        );
    }

    #[test]
    fn flight_query_empty_iata_is_caller_error() {
        let mut request = full_request();
        request.to = Some(EndpointRef {
            iata_code: Some(String::new()),
            city: None,
        });
        assert_eq!(
            request.to_flight_query().unwrap_err(),
            QueryError::MissingParameter("to.iataCode")
        );
    }

    #[test]
    fn flight_query_rejects_malformed_date() {
        let mut request = full_request();
        request.date = Some("06/01/2025".to_string());
        assert!(matches!(
            request.to_flight_query().unwrap_err(),
            QueryError::InvalidDate(_)
        ));
    }

    #[test]
    fn round_trip_without_return_date_degrades_to_one_way() {
        let mut request = full_request();
        request.return_date = None;
        let query = request.to_flight_query().unwrap();
        assert_eq!(query.trip_type, TripType::OneWay);
        assert!(query.return_date.is_none());
    }

    #[test]
    fn hotel_query_requires_city_and_date() {
        let query = full_request().to_hotel_query().unwrap();
        assert_eq!(query.city, "Los Angeles");

        let mut request = full_request();
        request.date = None;
        assert_eq!(
            request.to_hotel_query().unwrap_err(),
            QueryError::MissingParameter("date")
        );
    }

    #[test]
    fn destination_query_requires_city_only() {
        let mut request = full_request();
        request.date = None;
        let query = request.to_destination_query().unwrap();
        assert_eq!(query.city, "Los Angeles");
    }

    #[test]
    fn request_deserializes_from_camel_case_wire_shape() {
        let body = r#"{
            "from": {"iataCode": "JFK"},
            "to": {"iataCode": "LAX", "city": "Los Angeles"},
            "date": "2025-06-01",
            "returnDate": "2025-06-08",
            "tripType": "round-trip"
        }"#;
        let request: SearchRequest = serde_json::from_str(body).unwrap();
        assert_eq!(request.trip_type, Some(TripType::RoundTrip));
        assert_eq!(request.return_date.as_deref(), Some("2025-06-08"));
    }

    #[test]
    fn articles_response_uses_tips_and_stories_key() {
        let response = ArticlesResponse {
            tips_and_stories: vec![],
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"tipsAndStories\""));
    }
}
