//! Offline unit tests for busdb-db pool configuration and row types.
//! These tests do not require a live database connection.

use busdb_core::{AppConfig, Environment};
use busdb_db::{BusRouteFilters, BusRouteRow, InsertSummary, PoolConfig, ScrapeLogRow};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

#[test]
fn pool_config_from_app_config_uses_core_values() {
    let app_config = AppConfig {
        database_url: "postgres://example".to_string(),
        env: Environment::Test,
        bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 3000),
        log_level: "info".to_string(),
        states_path: PathBuf::from("./config/states.yaml"),
        snapshot_dir: PathBuf::from("./output"),
        db_max_connections: 42,
        db_min_connections: 7,
        db_acquire_timeout_secs: 9,
        scraper_request_timeout_secs: 30,
        scraper_user_agent: "ua".to_string(),
        scraper_max_retries: 3,
        scraper_retry_backoff_base_secs: 5,
        scraper_page_load_timeout_secs: 10,
        scraper_settle_delay_ms: 2000,
        scraper_scroll_steps: 5,
        scraper_scroll_step_px: 500,
        scraper_scroll_delay_ms: 1000,
        scraper_route_delay_ms: 5000,
        scraper_routes_per_state: 10,
    };

    let pool_config = PoolConfig::from_app_config(&app_config);
    assert_eq!(pool_config.max_connections, 42);
    assert_eq!(pool_config.min_connections, 7);
    assert_eq!(pool_config.acquire_timeout_secs, 9);
}

/// Compile-time smoke test: confirm that [`BusRouteRow`] has all expected
/// fields with the correct types. No database required.
#[test]
fn bus_route_row_has_expected_fields() {
    use chrono::Utc;

    let row = BusRouteRow {
        id: 1_i64,
        route_name: "Kochi to Trivandrum".to_string(),
        route_link: "https://www.redbus.in/bus-tickets/kochi-to-trivandrum".to_string(),
        busname: "KSRTC Swift".to_string(),
        bustype: "AC Seater".to_string(),
        departing_time: "21:30".to_string(),
        reaching_time: "03:45".to_string(),
        duration: Some("6h 15m".to_string()),
        duration_minutes: Some(375_i32),
        star_rating: Some(4.2_f64),
        price: "₹ 650".to_string(),
        price_numeric: Some(650_i64),
        seats_available: Some(12_i32),
        scraped_at: Utc::now(),
    };

    assert_eq!(row.bustype, "AC Seater");
    assert_eq!(row.duration_minutes, Some(375));
    assert_eq!(row.price_numeric, Some(650));
}

#[test]
fn scrape_log_row_has_expected_fields() {
    use chrono::Utc;
    use uuid::Uuid;

    let row = ScrapeLogRow {
        id: 1_i64,
        public_id: Uuid::new_v4(),
        route_url: "https://www.redbus.in/bus-tickets/kochi-to-trivandrum".to_string(),
        status: "STARTED".to_string(),
        buses_scraped: 0_i32,
        error_message: None,
        started_at: Utc::now(),
        completed_at: None,
    };

    assert_eq!(row.status, "STARTED");
    assert_eq!(row.buses_scraped, 0);
    assert!(row.error_message.is_none());
    assert!(row.completed_at.is_none());
}

#[test]
fn default_filters_match_everything() {
    let filters = BusRouteFilters::default();
    assert!(filters.route_name.is_none());
    assert!(filters.bus_types.is_none());
    assert!(filters.limit.is_none());
}

#[test]
fn insert_summary_starts_empty() {
    assert_eq!(
        InsertSummary::default(),
        InsertSummary {
            inserted: 0,
            failed: 0
        }
    );
}
