//! Result normalization
//!
//! Raw scraped blocks pass a per-source required-field filter before they
//! become wire records. Hotels additionally get deduplicated by name
//! (last occurrence wins) and sorted ascending by price, with a missing
//! price ordering after every priced record.

use crate::scraping::flights::RawFlight;
use crate::scraping::hotels::{FALLBACK_IMAGE, RawHotel};
use crate::scraping::places::RawPlace;
use crate::types::{Flight, Hotel, Place};
use std::collections::HashMap;
use tracing::debug;

/// Keep flights that carry time, name, duration, price and both airport
/// codes. The airline path is the synthetic route label derived from the
/// two code fragments.
pub fn normalize_flights(raw: Vec<RawFlight>) -> Vec<Flight> {
    let total = raw.len();
    let flights: Vec<Flight> = raw
        .into_iter()
        .filter_map(|r| {
            let from_code = r.from_code?;
            let to_code = r.to_code?;
            Some(Flight {
                time: r.time?,
                flight_name: r.flight_name?,
                stops: r.stops,
                duration: r.duration?,
                price: r.price?,
                airline_path: format!("{from_code} -> {to_code}"),
                from_code,
                to_code,
                provider: r.provider,
                booking_link: r.booking_link,
                carrier_logos: r.carrier_logos,
            })
        })
        .collect();
    debug!(kept = flights.len(), total, "flights normalized");
    flights
}

/// Keep hotels that carry a name, substitute the image placeholder where no
/// image resolved, deduplicate by name keeping the last occurrence, and sort
/// ascending by price with missing prices last.
pub fn normalize_hotels(raw: Vec<RawHotel>) -> Vec<Hotel> {
    let total = raw.len();
    let named = raw.into_iter().filter_map(|r| {
        Some(Hotel {
            name: r.name?,
            price: r.price,
            currency: "USD".to_string(),
            rating: r.rating,
            location: r.location,
            booking_link: r.booking_link,
            amenities: r.amenities,
            image_url: r.image_url.unwrap_or_else(|| FALLBACK_IMAGE.to_string()),
            description: r.description,
        })
    });

    // Last occurrence of a name wins, at the position the name first
    // appeared.
    let mut order: Vec<String> = Vec::new();
    let mut by_name: HashMap<String, Hotel> = HashMap::new();
    for hotel in named {
        if !by_name.contains_key(&hotel.name) {
            order.push(hotel.name.clone());
        }
        by_name.insert(hotel.name.clone(), hotel);
    }
    let mut hotels: Vec<Hotel> = order
        .into_iter()
        .filter_map(|name| by_name.remove(&name))
        .collect();

    hotels.sort_by(|a, b| {
        let pa = a.price.unwrap_or(f64::INFINITY);
        let pb = b.price.unwrap_or(f64::INFINITY);
        pa.total_cmp(&pb)
    });
    debug!(kept = hotels.len(), total, "hotels normalized");
    hotels
}

/// Keep places that carry all four fields. Order is preserved as scraped.
pub fn normalize_places(raw: Vec<RawPlace>) -> Vec<Place> {
    let total = raw.len();
    let places: Vec<Place> = raw
        .into_iter()
        .filter_map(|r| {
            Some(Place {
                name: r.name?,
                description: r.description?,
                image_url: r.image_url?,
                link: r.link?,
            })
        })
        .collect();
    debug!(kept = places.len(), total, "places normalized");
    places
}
