use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so tests can feed a `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let database_url = require("DATABASE_URL")?;
    let env = parse_environment(&or_default("BUSDB_ENV", "development"))?;

    let bind_addr = or_default("BUSDB_BIND_ADDR", "0.0.0.0:3000")
        .parse::<SocketAddr>()
        .map_err(|e| invalid("BUSDB_BIND_ADDR", e.to_string()))?;
    let log_level = or_default("BUSDB_LOG_LEVEL", "info");
    let states_path = PathBuf::from(or_default("BUSDB_STATES_PATH", "./config/states.yaml"));
    let snapshot_dir = PathBuf::from(or_default("BUSDB_SNAPSHOT_DIR", "./output"));

    let db_max_connections = parse_u32("BUSDB_DB_MAX_CONNECTIONS", "5")?;
    let db_min_connections = parse_u32("BUSDB_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("BUSDB_DB_ACQUIRE_TIMEOUT_SECS", "10")?;
    if db_min_connections > db_max_connections {
        return Err(invalid(
            "BUSDB_DB_MIN_CONNECTIONS",
            format!(
                "must not exceed BUSDB_DB_MAX_CONNECTIONS ({db_max_connections}), got {db_min_connections}"
            ),
        ));
    }

    let scraper_request_timeout_secs = parse_u64("BUSDB_SCRAPER_REQUEST_TIMEOUT_SECS", "30")?;
    let scraper_user_agent = or_default("BUSDB_SCRAPER_USER_AGENT", DEFAULT_USER_AGENT);
    let scraper_max_retries = parse_u32("BUSDB_SCRAPER_MAX_RETRIES", "3")?;
    let scraper_retry_backoff_base_secs = parse_u64("BUSDB_SCRAPER_RETRY_BACKOFF_BASE_SECS", "5")?;
    let scraper_page_load_timeout_secs = parse_u64("BUSDB_SCRAPER_PAGE_LOAD_TIMEOUT_SECS", "10")?;
    let scraper_settle_delay_ms = parse_u64("BUSDB_SCRAPER_SETTLE_DELAY_MS", "2000")?;
    let scraper_scroll_steps = parse_u32("BUSDB_SCRAPER_SCROLL_STEPS", "5")?;
    let scraper_scroll_step_px = parse_u32("BUSDB_SCRAPER_SCROLL_STEP_PX", "500")?;
    let scraper_scroll_delay_ms = parse_u64("BUSDB_SCRAPER_SCROLL_DELAY_MS", "1000")?;
    let scraper_route_delay_ms = parse_u64("BUSDB_SCRAPER_ROUTE_DELAY_MS", "5000")?;
    let scraper_routes_per_state = parse_usize("BUSDB_SCRAPER_ROUTES_PER_STATE", "10")?;

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        states_path,
        snapshot_dir,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        scraper_request_timeout_secs,
        scraper_user_agent,
        scraper_max_retries,
        scraper_retry_backoff_base_secs,
        scraper_page_load_timeout_secs,
        scraper_settle_delay_ms,
        scraper_scroll_steps,
        scraper_scroll_step_px,
        scraper_scroll_delay_ms,
        scraper_route_delay_ms,
        scraper_routes_per_state,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "BUSDB_ENV".to_string(),
            reason: format!("expected development, test, or production; got '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
