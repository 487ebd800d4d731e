//! Database operations for the `bus_routes` table.

use busdb_core::BusRecord;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{Connection, PgConnection, PgPool};

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `bus_routes` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BusRouteRow {
    pub id: i64,
    pub route_name: String,
    pub route_link: String,
    pub busname: String,
    pub bustype: String,
    pub departing_time: String,
    pub reaching_time: String,
    pub duration: Option<String>,
    pub duration_minutes: Option<i32>,
    pub star_rating: Option<f64>,
    /// Display text as scraped, e.g. `"₹ 1,100"` or `"N/A"`.
    pub price: String,
    pub price_numeric: Option<i64>,
    pub seats_available: Option<i32>,
    pub scraped_at: DateTime<Utc>,
}

/// Input filters for bus listing.
///
/// Departure bounds are minutes past midnight, inclusive. An empty
/// `bus_types` slice means no type filter.
#[derive(Debug, Clone, Default)]
pub struct BusRouteFilters<'a> {
    pub route_name: Option<&'a str>,
    pub bus_types: Option<&'a [String]>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub min_rating: Option<f64>,
    pub min_seats: Option<i32>,
    pub departure_from: Option<i32>,
    pub departure_to: Option<i32>,
    pub limit: Option<i64>,
}

/// Outcome of a bulk insert.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InsertSummary {
    pub inserted: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceRange {
    pub min: i64,
    pub max: i64,
}

/// Returned by [`price_range`] when no listing has a numeric price.
pub const DEFAULT_PRICE_RANGE: PriceRange = PriceRange { min: 0, max: 5000 };

/// Aggregates over the whole `bus_routes` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RouteStatistics {
    pub total_buses: i64,
    pub total_routes: i64,
    pub avg_price: Option<Decimal>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub avg_rating: Option<f64>,
    pub avg_seats: Option<f64>,
}

// ---------------------------------------------------------------------------
// Writes
// ---------------------------------------------------------------------------

const INSERT_BUS_ROUTE: &str = "INSERT INTO bus_routes \
     (route_name, route_link, busname, bustype, departing_time, reaching_time, \
      duration, duration_minutes, star_rating, price, price_numeric, seats_available) \
     VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)";

/// Inserts validated records inside one transaction.
///
/// Each row runs under its own savepoint, so a row the database rejects is
/// rolled back and counted in [`InsertSummary::failed`] while the rest still
/// commit.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the transaction cannot be opened, a savepoint
/// cannot be managed, or the final commit fails.
pub async fn insert_bus_routes(
    pool: &PgPool,
    records: &[BusRecord],
) -> Result<InsertSummary, DbError> {
    let mut summary = InsertSummary::default();
    if records.is_empty() {
        return Ok(summary);
    }

    let mut tx = pool.begin().await?;
    for record in records {
        let mut savepoint = (*tx).begin().await?;
        match insert_one(&mut savepoint, record).await {
            Ok(()) => {
                savepoint.commit().await?;
                summary.inserted += 1;
            }
            Err(e) => {
                savepoint.rollback().await?;
                summary.failed += 1;
                tracing::warn!(
                    route = %record.route_name,
                    busname = %record.busname,
                    error = %e,
                    "bus route insert failed"
                );
            }
        }
    }
    tx.commit().await?;

    tracing::info!(
        inserted = summary.inserted,
        failed = summary.failed,
        "bus routes stored"
    );
    Ok(summary)
}

async fn insert_one(conn: &mut PgConnection, record: &BusRecord) -> Result<(), sqlx::Error> {
    sqlx::query(INSERT_BUS_ROUTE)
        .bind(&record.route_name)
        .bind(&record.route_link)
        .bind(&record.busname)
        .bind(record.bustype.as_str())
        .bind(&record.departing_time)
        .bind(&record.reaching_time)
        .bind(record.duration.as_deref())
        .bind(record.duration_minutes)
        .bind(record.star_rating)
        .bind(&record.price)
        .bind(record.price_numeric)
        .bind(record.seats_available)
        .execute(conn)
        .await?;
    Ok(())
}

/// Deletes every listing. Returns the number of rows removed.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete fails.
pub async fn clear_bus_routes(pool: &PgPool) -> Result<u64, DbError> {
    let result = sqlx::query("DELETE FROM bus_routes").execute(pool).await?;
    tracing::warn!(deleted = result.rows_affected(), "all bus routes cleared");
    Ok(result.rows_affected())
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// Lists listings matching `filters`, ordered by departure time.
///
/// `route_name` is a case-insensitive substring match. Price, rating and seat
/// filters exclude rows where the column is NULL.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn filter_bus_routes(
    pool: &PgPool,
    filters: &BusRouteFilters<'_>,
) -> Result<Vec<BusRouteRow>, DbError> {
    let route_pattern = filters
        .route_name
        .map(|name| format!("%{}%", escape_like(name)));
    let bus_types = filters.bus_types.filter(|types| !types.is_empty());

    let rows = sqlx::query_as::<_, BusRouteRow>(
        "SELECT id, route_name, route_link, busname, bustype, departing_time, reaching_time, \
                duration, duration_minutes, star_rating, price, price_numeric, \
                seats_available, scraped_at \
         FROM bus_routes \
         WHERE ($1::TEXT IS NULL OR route_name ILIKE $1) \
           AND ($2::TEXT[] IS NULL OR bustype = ANY($2)) \
           AND ($3::BIGINT IS NULL OR price_numeric >= $3) \
           AND ($4::BIGINT IS NULL OR price_numeric <= $4) \
           AND ($5::DOUBLE PRECISION IS NULL OR star_rating >= $5) \
           AND ($6::INTEGER IS NULL OR seats_available >= $6) \
           AND ($7::INTEGER IS NULL OR departing_minutes >= $7) \
           AND ($8::INTEGER IS NULL OR departing_minutes <= $8) \
         ORDER BY departing_minutes, id \
         LIMIT COALESCE($9, 9223372036854775807)",
    )
    .bind(route_pattern)
    .bind(bus_types)
    .bind(filters.min_price)
    .bind(filters.max_price)
    .bind(filters.min_rating)
    .bind(filters.min_seats)
    .bind(filters.departure_from)
    .bind(filters.departure_to)
    .bind(filters.limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Distinct route names, alphabetically.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_route_names(pool: &PgPool) -> Result<Vec<String>, DbError> {
    let names = sqlx::query_scalar::<_, String>(
        "SELECT DISTINCT route_name FROM bus_routes ORDER BY route_name",
    )
    .fetch_all(pool)
    .await?;
    Ok(names)
}

/// Distinct bus types, alphabetically.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_bus_types(pool: &PgPool) -> Result<Vec<String>, DbError> {
    let types =
        sqlx::query_scalar::<_, String>("SELECT DISTINCT bustype FROM bus_routes ORDER BY bustype")
            .fetch_all(pool)
            .await?;
    Ok(types)
}

/// Lowest and highest numeric price, or [`DEFAULT_PRICE_RANGE`] when no row
/// has one.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn price_range(pool: &PgPool) -> Result<PriceRange, DbError> {
    let (min, max) = sqlx::query_as::<_, (Option<i64>, Option<i64>)>(
        "SELECT MIN(price_numeric), MAX(price_numeric) FROM bus_routes",
    )
    .fetch_one(pool)
    .await?;

    Ok(match (min, max) {
        (Some(min), Some(max)) => PriceRange { min, max },
        _ => DEFAULT_PRICE_RANGE,
    })
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn route_statistics(pool: &PgPool) -> Result<RouteStatistics, DbError> {
    let stats = sqlx::query_as::<_, RouteStatistics>(
        "SELECT COUNT(*) AS total_buses, \
                COUNT(DISTINCT route_name) AS total_routes, \
                ROUND(AVG(price_numeric), 2) AS avg_price, \
                MIN(price_numeric) AS min_price, \
                MAX(price_numeric) AS max_price, \
                AVG(star_rating) AS avg_rating, \
                AVG(seats_available)::DOUBLE PRECISION AS avg_seats \
         FROM bus_routes",
    )
    .fetch_one(pool)
    .await?;
    Ok(stats)
}

/// Escapes `LIKE` metacharacters so user input matches literally.
fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
