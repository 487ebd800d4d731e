//! Lookup endpoints backing dashboard filter widgets and summary cards.

use axum::{extract::State, Extension, Json};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::middleware::RequestId;

use super::{map_db_error, ApiError, ApiResponse, AppState};

#[derive(Debug, Serialize, PartialEq, Eq)]
pub(super) struct PriceRangeItem {
    min: i64,
    max: i64,
}

#[derive(Debug, Serialize)]
pub(super) struct StatsItem {
    total_buses: i64,
    total_routes: i64,
    avg_price: Option<Decimal>,
    min_price: Option<i64>,
    max_price: Option<i64>,
    avg_rating: Option<f64>,
    avg_seats: Option<f64>,
}

pub(super) async fn list_routes(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<Vec<String>>>, ApiError> {
    let names = busdb_db::list_route_names(&state.pool)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    Ok(Json(ApiResponse::new(names, req_id.0)))
}

pub(super) async fn list_bus_types(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<Vec<String>>>, ApiError> {
    let types = busdb_db::list_bus_types(&state.pool)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    Ok(Json(ApiResponse::new(types, req_id.0)))
}

pub(super) async fn get_price_range(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<PriceRangeItem>>, ApiError> {
    let range = busdb_db::price_range(&state.pool)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    let data = PriceRangeItem {
        min: range.min,
        max: range.max,
    };
    Ok(Json(ApiResponse::new(data, req_id.0)))
}

pub(super) async fn get_stats(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<StatsItem>>, ApiError> {
    let stats = busdb_db::route_statistics(&state.pool)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    let data = StatsItem {
        total_buses: stats.total_buses,
        total_routes: stats.total_routes,
        avg_price: stats.avg_price,
        min_price: stats.min_price,
        max_price: stats.max_price,
        avg_rating: stats.avg_rating,
        avg_seats: stats.avg_seats,
    };
    Ok(Json(ApiResponse::new(data, req_id.0)))
}
