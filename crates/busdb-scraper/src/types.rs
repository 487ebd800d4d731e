//! Pre-validation listing type.
//!
//! ## Observed shape of rendered route pages
//!
//! ### Listing cards
//! Each bus is rendered inside a `div` whose class contains `timeFareBoWrap`
//! (older layout) or `bus-item` (newer layout). The card's flattened text
//! carries departure and arrival times, a duration like `"7h 05m"`, a fare
//! like `"₹1,250"`, a seat count like `"23 Seats"`, and a rating like `"4.2"`.
//!
//! ### Operator name
//! Usually inside a nested `div` with class `travelsName`. Some cards omit
//! it, in which case the operator is the leading line of the card text.
//!
//! ### Loose elements
//! When no cards are present the same data appears as page-wide
//! `p.boardingTime`, `p.droppingTime`, `div.travelsName` and
//! `p.finalFare`/`p.fare` elements, paired by position.
//!
//! Text fields that could not be extracted hold the `"N/A"` sentinel.

use busdb_core::{BusType, NOT_AVAILABLE};

/// A listing as extracted from the page, before validation.
#[derive(Debug, Clone, PartialEq)]
pub struct BusCandidate {
    pub route_name: String,
    pub route_link: String,
    pub busname: String,
    pub bustype: BusType,
    pub departing_time: String,
    pub reaching_time: String,
    pub duration: String,
    pub duration_minutes: Option<i32>,
    pub star_rating: String,
    pub price: String,
    pub price_numeric: Option<i64>,
    pub seats_available: String,
}

impl BusCandidate {
    /// A candidate for `route` with every optional field unknown.
    #[must_use]
    pub fn for_route(route_name: &str, route_link: &str) -> Self {
        Self {
            route_name: route_name.to_owned(),
            route_link: route_link.to_owned(),
            busname: NOT_AVAILABLE.to_owned(),
            bustype: BusType::Unknown,
            departing_time: NOT_AVAILABLE.to_owned(),
            reaching_time: NOT_AVAILABLE.to_owned(),
            duration: NOT_AVAILABLE.to_owned(),
            duration_minutes: None,
            star_rating: NOT_AVAILABLE.to_owned(),
            price: NOT_AVAILABLE.to_owned(),
            price_numeric: None,
            seats_available: NOT_AVAILABLE.to_owned(),
        }
    }
}
