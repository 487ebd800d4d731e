//! Live integration tests for busdb-db using `#[sqlx::test]`.
//!
//! Each test gets a fresh, fully-migrated Postgres database spun up by the
//! sqlx test harness. The `migrations` path is relative to the crate root
//! (`crates/busdb-db/`), so `"../../migrations"` resolves to the workspace
//! migration directory.

use busdb_core::{BusRecord, BusType};
use busdb_db::{
    clear_bus_routes, complete_scrape_log, create_scrape_log, fail_scrape_log, filter_bus_routes,
    get_scrape_log, health_check, insert_bus_routes, list_bus_types, list_route_names,
    list_scrape_logs, price_range, route_statistics, BusRouteFilters, DbError, InsertSummary,
    PriceRange, DEFAULT_PRICE_RANGE,
};
use rust_decimal::Decimal;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn record(route: &str, busname: &str, departing: &str, price: Option<i64>) -> BusRecord {
    BusRecord {
        route_name: route.to_string(),
        route_link: format!(
            "https://www.redbus.in/bus-tickets/{}",
            route.to_lowercase().replace(' ', "-")
        ),
        busname: busname.to_string(),
        bustype: BusType::AcSleeper,
        departing_time: departing.to_string(),
        reaching_time: "06:00".to_string(),
        duration: Some("8h 0m".to_string()),
        duration_minutes: Some(480),
        star_rating: Some(4.0),
        price: price.map_or_else(|| "N/A".to_string(), |p| format!("₹{p}")),
        price_numeric: price,
        seats_available: Some(20),
    }
}

async fn seed(pool: &sqlx::PgPool) {
    let mut nonac = record("Pune to Goa", "Paulo Travels", "9:15", Some(600));
    nonac.bustype = BusType::NonAcSeater;
    nonac.star_rating = Some(3.1);
    nonac.seats_available = Some(4);

    let records = vec![
        record("Kochi to Trivandrum", "KSRTC Swift", "21:30", Some(650)),
        record("Kochi to Bangalore", "Kallada", "18:00", Some(1450)),
        nonac,
        record("Pune to Goa", "Neeta Travels", "22:45", None),
    ];
    let summary = insert_bus_routes(pool, &records)
        .await
        .expect("seed insert failed");
    assert_eq!(
        summary,
        InsertSummary {
            inserted: 4,
            failed: 0
        }
    );
}

// ---------------------------------------------------------------------------
// Pool
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn health_check_succeeds_on_live_pool(pool: sqlx::PgPool) {
    health_check(&pool).await.expect("health check failed");
}

// ---------------------------------------------------------------------------
// bus_routes
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn insert_counts_rejected_rows_and_keeps_the_rest(pool: sqlx::PgPool) {
    let mut bad = record("Kochi to Trivandrum", "Broken", "10:00", Some(500));
    bad.star_rating = Some(9.0);

    let summary = insert_bus_routes(
        &pool,
        &[
            record("Kochi to Trivandrum", "KSRTC Swift", "21:30", Some(650)),
            bad,
            record("Kochi to Trivandrum", "Kallada", "23:00", Some(900)),
        ],
    )
    .await
    .expect("insert failed");

    assert_eq!(
        summary,
        InsertSummary {
            inserted: 2,
            failed: 1
        }
    );
    let rows = filter_bus_routes(&pool, &BusRouteFilters::default())
        .await
        .expect("filter failed");
    assert_eq!(rows.len(), 2);
}

#[sqlx::test(migrations = "../../migrations")]
async fn insert_of_nothing_is_a_no_op(pool: sqlx::PgPool) {
    let summary = insert_bus_routes(&pool, &[]).await.expect("insert failed");
    assert_eq!(summary, InsertSummary::default());
}

#[sqlx::test(migrations = "../../migrations")]
async fn filter_orders_by_departure_minutes(pool: sqlx::PgPool) {
    seed(&pool).await;

    let rows = filter_bus_routes(&pool, &BusRouteFilters::default())
        .await
        .expect("filter failed");
    let times: Vec<&str> = rows.iter().map(|r| r.departing_time.as_str()).collect();

    // "9:15" sorts before "18:00" by minutes, not by text.
    assert_eq!(times, ["9:15", "18:00", "21:30", "22:45"]);
}

#[sqlx::test(migrations = "../../migrations")]
async fn filter_applies_each_criterion(pool: sqlx::PgPool) {
    seed(&pool).await;

    let by_route = filter_bus_routes(
        &pool,
        &BusRouteFilters {
            route_name: Some("kochi"),
            ..BusRouteFilters::default()
        },
    )
    .await
    .expect("route filter failed");
    assert_eq!(by_route.len(), 2);

    let types = vec!["Non-AC Seater".to_string()];
    let by_type = filter_bus_routes(
        &pool,
        &BusRouteFilters {
            bus_types: Some(types.as_slice()),
            ..BusRouteFilters::default()
        },
    )
    .await
    .expect("type filter failed");
    assert_eq!(by_type.len(), 1);
    assert_eq!(by_type[0].busname, "Paulo Travels");

    let by_price = filter_bus_routes(
        &pool,
        &BusRouteFilters {
            min_price: Some(620),
            max_price: Some(1000),
            ..BusRouteFilters::default()
        },
    )
    .await
    .expect("price filter failed");
    assert_eq!(by_price.len(), 1);
    assert_eq!(by_price[0].busname, "KSRTC Swift");

    let by_quality = filter_bus_routes(
        &pool,
        &BusRouteFilters {
            min_rating: Some(3.5),
            min_seats: Some(10),
            ..BusRouteFilters::default()
        },
    )
    .await
    .expect("rating filter failed");
    assert_eq!(by_quality.len(), 3);

    let evening = filter_bus_routes(
        &pool,
        &BusRouteFilters {
            departure_from: Some(18 * 60),
            departure_to: Some(22 * 60),
            limit: Some(1),
            ..BusRouteFilters::default()
        },
    )
    .await
    .expect("departure filter failed");
    assert_eq!(evening.len(), 1);
    assert_eq!(evening[0].departing_time, "18:00");
}

#[sqlx::test(migrations = "../../migrations")]
async fn empty_bus_type_list_does_not_filter(pool: sqlx::PgPool) {
    seed(&pool).await;
    let none: Vec<String> = Vec::new();

    let rows = filter_bus_routes(
        &pool,
        &BusRouteFilters {
            bus_types: Some(none.as_slice()),
            ..BusRouteFilters::default()
        },
    )
    .await
    .expect("filter failed");
    assert_eq!(rows.len(), 4);
}

#[sqlx::test(migrations = "../../migrations")]
async fn route_name_filter_matches_wildcards_literally(pool: sqlx::PgPool) {
    seed(&pool).await;

    let rows = filter_bus_routes(
        &pool,
        &BusRouteFilters {
            route_name: Some("%"),
            ..BusRouteFilters::default()
        },
    )
    .await
    .expect("filter failed");
    assert!(rows.is_empty());
}

#[sqlx::test(migrations = "../../migrations")]
async fn distinct_lists_are_sorted(pool: sqlx::PgPool) {
    seed(&pool).await;

    let routes = list_route_names(&pool).await.expect("routes failed");
    assert_eq!(
        routes,
        ["Kochi to Bangalore", "Kochi to Trivandrum", "Pune to Goa"]
    );

    let types = list_bus_types(&pool).await.expect("types failed");
    assert_eq!(types, ["AC Sleeper", "Non-AC Seater"]);
}

#[sqlx::test(migrations = "../../migrations")]
async fn price_range_defaults_on_empty_table(pool: sqlx::PgPool) {
    let range = price_range(&pool).await.expect("price range failed");
    assert_eq!(range, DEFAULT_PRICE_RANGE);

    seed(&pool).await;
    let range = price_range(&pool).await.expect("price range failed");
    assert_eq!(range, PriceRange { min: 600, max: 1450 });
}

#[sqlx::test(migrations = "../../migrations")]
async fn statistics_aggregate_the_table(pool: sqlx::PgPool) {
    let empty = route_statistics(&pool).await.expect("stats failed");
    assert_eq!(empty.total_buses, 0);
    assert!(empty.avg_price.is_none());

    seed(&pool).await;
    let stats = route_statistics(&pool).await.expect("stats failed");

    assert_eq!(stats.total_buses, 4);
    assert_eq!(stats.total_routes, 3);
    assert_eq!(stats.min_price, Some(600));
    assert_eq!(stats.max_price, Some(1450));
    assert_eq!(stats.avg_price, Some(Decimal::new(90_000, 2)));
    let avg_rating = stats.avg_rating.expect("avg rating");
    assert!((avg_rating - 3.775).abs() < 1e-9);
    let avg_seats = stats.avg_seats.expect("avg seats");
    assert!((avg_seats - 16.0).abs() < 1e-9);
}

#[sqlx::test(migrations = "../../migrations")]
async fn clear_removes_every_row(pool: sqlx::PgPool) {
    seed(&pool).await;
    assert_eq!(clear_bus_routes(&pool).await.expect("clear failed"), 4);
    assert!(list_route_names(&pool).await.expect("routes failed").is_empty());
}

// ---------------------------------------------------------------------------
// scrape_logs
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn scrape_log_lifecycle_success(pool: sqlx::PgPool) {
    let url = "https://www.redbus.in/bus-tickets/kochi-to-trivandrum";
    let log = create_scrape_log(&pool, url).await.expect("create failed");
    assert_eq!(log.status, "STARTED");
    assert_eq!(log.route_url, url);
    assert!(log.completed_at.is_none());

    complete_scrape_log(&pool, log.id, 12)
        .await
        .expect("complete failed");

    let done = get_scrape_log(&pool, log.id).await.expect("get failed");
    assert_eq!(done.status, "SUCCESS");
    assert_eq!(done.buses_scraped, 12);
    assert!(done.completed_at.is_some());
}

#[sqlx::test(migrations = "../../migrations")]
async fn scrape_log_lifecycle_failure(pool: sqlx::PgPool) {
    let log = create_scrape_log(&pool, "https://www.redbus.in/bus-tickets/x")
        .await
        .expect("create failed");

    fail_scrape_log(&pool, log.id, "no bus listings found")
        .await
        .expect("fail failed");

    let failed = get_scrape_log(&pool, log.id).await.expect("get failed");
    assert_eq!(failed.status, "FAILED");
    assert_eq!(failed.error_message.as_deref(), Some("no bus listings found"));
    assert_eq!(failed.buses_scraped, 0);
}

#[sqlx::test(migrations = "../../migrations")]
async fn finalized_scrape_log_rejects_second_transition(pool: sqlx::PgPool) {
    let log = create_scrape_log(&pool, "https://www.redbus.in/bus-tickets/x")
        .await
        .expect("create failed");
    complete_scrape_log(&pool, log.id, 3)
        .await
        .expect("complete failed");

    let err = fail_scrape_log(&pool, log.id, "late failure")
        .await
        .expect_err("second transition should be rejected");
    assert!(matches!(
        err,
        DbError::InvalidScrapeLogTransition {
            expected_status: "STARTED",
            ..
        }
    ));

    let err = complete_scrape_log(&pool, 9_999, 1)
        .await
        .expect_err("missing log should be rejected");
    assert!(matches!(err, DbError::InvalidScrapeLogTransition { id: 9_999, .. }));
}

#[sqlx::test(migrations = "../../migrations")]
async fn get_scrape_log_reports_not_found(pool: sqlx::PgPool) {
    let err = get_scrape_log(&pool, 42).await.expect_err("should be missing");
    assert!(matches!(err, DbError::NotFound));
}

#[sqlx::test(migrations = "../../migrations")]
async fn list_scrape_logs_is_newest_first_and_limited(pool: sqlx::PgPool) {
    let first = create_scrape_log(&pool, "https://a.test/").await.expect("create");
    let second = create_scrape_log(&pool, "https://b.test/").await.expect("create");
    let third = create_scrape_log(&pool, "https://c.test/").await.expect("create");

    let logs = list_scrape_logs(&pool, 2).await.expect("list failed");
    let ids: Vec<i64> = logs.iter().map(|l| l.id).collect();

    assert_eq!(ids, [third.id, second.id]);
    assert!(!ids.contains(&first.id));
}
