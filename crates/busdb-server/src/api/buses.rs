use axum::{
    extract::{Query, State},
    Extension, Json,
};
use busdb_core::BusType;
use busdb_db::{BusRouteFilters, BusRouteRow};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{map_db_error, normalize_limit, ApiError, ApiResponse, AppState};

const DEFAULT_BUS_LIMIT: i64 = 200;
const MAX_BUS_LIMIT: i64 = 1000;

#[derive(Debug, Default, Deserialize)]
pub(super) struct BusesQuery {
    pub route: Option<String>,
    /// Comma-separated bus type labels, e.g. `AC Sleeper,Seater`.
    pub bustype: Option<String>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub min_rating: Option<f64>,
    pub min_seats: Option<i32>,
    /// `HH:MM`, inclusive.
    pub departure_from: Option<String>,
    /// `HH:MM`, inclusive.
    pub departure_to: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub(super) struct BusItem {
    id: i64,
    route_name: String,
    route_link: String,
    busname: String,
    bustype: String,
    departing_time: String,
    reaching_time: String,
    duration: Option<String>,
    duration_minutes: Option<i32>,
    star_rating: Option<f64>,
    price: String,
    price_numeric: Option<i64>,
    seats_available: Option<i32>,
    scraped_at: DateTime<Utc>,
}

impl From<BusRouteRow> for BusItem {
    fn from(row: BusRouteRow) -> Self {
        Self {
            id: row.id,
            route_name: row.route_name,
            route_link: row.route_link,
            busname: row.busname,
            bustype: row.bustype,
            departing_time: row.departing_time,
            reaching_time: row.reaching_time,
            duration: row.duration,
            duration_minutes: row.duration_minutes,
            star_rating: row.star_rating,
            price: row.price,
            price_numeric: row.price_numeric,
            seats_available: row.seats_available,
            scraped_at: row.scraped_at,
        }
    }
}

/// Query parameters after validation, ready to become [`BusRouteFilters`].
#[derive(Debug, PartialEq)]
pub(super) struct ParsedBusQuery {
    pub route: Option<String>,
    pub bus_types: Vec<String>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub min_rating: Option<f64>,
    pub min_seats: Option<i32>,
    pub departure_from: Option<i32>,
    pub departure_to: Option<i32>,
    pub limit: i64,
}

impl ParsedBusQuery {
    fn filters(&self) -> BusRouteFilters<'_> {
        BusRouteFilters {
            route_name: self.route.as_deref(),
            bus_types: Some(self.bus_types.as_slice()),
            min_price: self.min_price,
            max_price: self.max_price,
            min_rating: self.min_rating,
            min_seats: self.min_seats,
            departure_from: self.departure_from,
            departure_to: self.departure_to,
            limit: Some(self.limit),
        }
    }
}

/// Validates raw query parameters. The error is a client-facing message.
pub(super) fn parse_bus_query(query: BusesQuery) -> Result<ParsedBusQuery, String> {
    let bus_types = query
        .bustype
        .as_deref()
        .map(parse_bus_types)
        .transpose()?
        .unwrap_or_default();

    if let Some(rating) = query.min_rating {
        if !(0.0..=5.0).contains(&rating) {
            return Err(format!("min_rating must be between 0 and 5, got {rating}"));
        }
    }
    if let (Some(min), Some(max)) = (query.min_price, query.max_price) {
        if min > max {
            return Err(format!("min_price {min} exceeds max_price {max}"));
        }
    }

    let departure_from = query
        .departure_from
        .as_deref()
        .map(|t| parse_clock("departure_from", t))
        .transpose()?;
    let departure_to = query
        .departure_to
        .as_deref()
        .map(|t| parse_clock("departure_to", t))
        .transpose()?;

    Ok(ParsedBusQuery {
        route: query
            .route
            .map(|r| r.trim().to_owned())
            .filter(|r| !r.is_empty()),
        bus_types,
        min_price: query.min_price,
        max_price: query.max_price,
        min_rating: query.min_rating,
        min_seats: query.min_seats,
        departure_from,
        departure_to,
        limit: normalize_limit(query.limit, DEFAULT_BUS_LIMIT, MAX_BUS_LIMIT),
    })
}

/// Canonicalizes a comma-separated list of bus type labels.
fn parse_bus_types(raw: &str) -> Result<Vec<String>, String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<BusType>().map(|t| t.as_str().to_owned()))
        .collect()
}

/// Parses `H:MM`/`HH:MM` into minutes past midnight.
fn parse_clock(param: &str, value: &str) -> Result<i32, String> {
    let invalid = || format!("{param} must be HH:MM, got '{value}'");
    let (hours, minutes) = value.trim().split_once(':').ok_or_else(invalid)?;
    let hours: i32 = hours.parse().map_err(|_| invalid())?;
    let minutes: i32 = minutes.parse().map_err(|_| invalid())?;
    if !(0..24).contains(&hours) || !(0..60).contains(&minutes) {
        return Err(invalid());
    }
    Ok(hours * 60 + minutes)
}

pub(super) async fn list_buses(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<BusesQuery>,
) -> Result<Json<ApiResponse<Vec<BusItem>>>, ApiError> {
    let parsed =
        parse_bus_query(query).map_err(|msg| ApiError::validation(req_id.0.clone(), msg))?;

    let rows = busdb_db::filter_bus_routes(&state.pool, &parsed.filters())
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let data = rows.into_iter().map(BusItem::from).collect();
    Ok(Json(ApiResponse::new(data, req_id.0)))
}
