//! Scrape command handlers.
//!
//! A `None` pool means nothing is written: scrape logs stay in memory and
//! accepted listings are only counted. Per-route failures are logged and
//! counted rather than propagated so one bad route does not abort the run.

use std::time::Duration;

use busdb_core::{AppConfig, RouteDescriptor, ScrapeStatus, StateConfig, StatesFile};
use busdb_db::DbError;
use busdb_scraper::{
    expand_landing_routes, run_route, HttpRenderer, MemoryScrapeLog, PageRenderer, RouteOutcome,
    ScrapeContext, ScrapeLog,
};
use sqlx::PgPool;

/// [`ScrapeLog`] backed by the `scrape_logs` table.
pub(crate) struct PgScrapeLog<'a> {
    pool: &'a PgPool,
}

impl ScrapeLog for PgScrapeLog<'_> {
    type Error = DbError;

    async fn start(&mut self, route_url: &str) -> Result<i64, DbError> {
        let row = busdb_db::create_scrape_log(self.pool, route_url).await?;
        Ok(row.id)
    }

    async fn succeed(&mut self, log_id: i64, buses_scraped: usize) -> Result<(), DbError> {
        let buses = i32::try_from(buses_scraped).unwrap_or(i32::MAX);
        busdb_db::complete_scrape_log(self.pool, log_id, buses).await
    }

    async fn fail(&mut self, log_id: i64, error_message: &str) -> Result<(), DbError> {
        busdb_db::fail_scrape_log(self.pool, log_id, error_message).await
    }
}

/// Counters across every route in one command.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct RunTotals {
    pub routes: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub accepted: usize,
    pub rejected: usize,
    pub stored: usize,
    pub store_failed: usize,
}

impl RunTotals {
    pub(crate) fn record(&mut self, outcome: &RouteOutcome) {
        self.routes += 1;
        match outcome.status {
            ScrapeStatus::Failed => self.failed += 1,
            ScrapeStatus::Success | ScrapeStatus::Started => self.succeeded += 1,
        }
        self.accepted += outcome.records.len();
        self.rejected += outcome.rejected;
    }

    pub(crate) fn summary(&self, dry_run: bool) -> String {
        let mut line = format!(
            "scraped {} routes ({} ok, {} failed): {} buses accepted, {} rejected",
            self.routes, self.succeeded, self.failed, self.accepted, self.rejected
        );
        if dry_run {
            line.push_str("; dry-run, nothing stored");
        } else {
            line.push_str(&format!(
                "; {} stored, {} failed to store",
                self.stored, self.store_failed
            ));
        }
        line
    }
}

/// Picks the states to scrape: all of them, or the single match for `filter`.
pub(crate) fn select_states<'a>(
    states: &'a StatesFile,
    filter: Option<&str>,
) -> anyhow::Result<Vec<&'a StateConfig>> {
    match filter {
        Some(needle) => {
            let state = states
                .find(needle)
                .ok_or_else(|| anyhow::anyhow!("state '{needle}' is not configured"))?;
            Ok(vec![state])
        }
        None => Ok(states.states.iter().collect()),
    }
}

fn build_renderer(config: &AppConfig) -> anyhow::Result<HttpRenderer> {
    HttpRenderer::new(
        config.scraper_request_timeout_secs,
        &config.scraper_user_agent,
        config.scraper_max_retries,
        config.scraper_retry_backoff_base_secs,
    )
    .map_err(|e| anyhow::anyhow!("failed to build page renderer: {e}"))
}

/// Scrapes the configured states' routes, storing accepted listings unless
/// `pool` is `None`.
///
/// # Errors
///
/// Returns an error if the states file cannot be loaded, the state filter
/// matches nothing, the renderer cannot be built, or every route failed.
pub(crate) async fn run_scrape(
    config: &AppConfig,
    pool: Option<&PgPool>,
    state_filter: Option<&str>,
    routes_per_state: Option<usize>,
) -> anyhow::Result<()> {
    let states = busdb_core::load_states(&config.states_path)?;
    let selected = select_states(&states, state_filter)?;
    let limit = routes_per_state.unwrap_or(config.scraper_routes_per_state);

    let mut renderer = build_renderer(config)?;
    let ctx = ScrapeContext::from_app_config(config);
    let route_delay = Duration::from_millis(config.scraper_route_delay_ms);
    let mut totals = RunTotals::default();

    for state in selected {
        let routes = expand_landing_routes(&mut renderer, &ctx, &state.url).await;
        if routes.is_empty() {
            tracing::warn!(state = %state.name, "no routes found on landing page");
            continue;
        }
        tracing::info!(
            state = %state.name,
            found = routes.len(),
            scraping = routes.len().min(limit),
            "scraping state"
        );

        for route in routes.iter().take(limit) {
            if totals.routes > 0 {
                tokio::time::sleep(route_delay).await;
            }
            scrape_and_store(&mut renderer, pool, &ctx, route, &mut totals).await;
        }
    }

    println!("{}", totals.summary(pool.is_none()));

    if totals.routes > 0 && totals.failed == totals.routes {
        anyhow::bail!("all {} routes failed", totals.routes);
    }
    Ok(())
}

/// Scrapes one route and prints what was found.
///
/// # Errors
///
/// Returns an error if the renderer cannot be built or the route failed.
pub(crate) async fn run_scrape_route(
    config: &AppConfig,
    pool: Option<&PgPool>,
    route: &RouteDescriptor,
) -> anyhow::Result<()> {
    let mut renderer = build_renderer(config)?;
    let ctx = ScrapeContext::from_app_config(config);
    let mut totals = RunTotals::default();

    let outcome = scrape_and_store(&mut renderer, pool, &ctx, route, &mut totals).await;

    for record in &outcome.records {
        println!(
            "{} | {} | {} -> {} | {}",
            record.busname,
            record.bustype,
            record.departing_time,
            record.reaching_time,
            record.price
        );
    }
    println!("{}", totals.summary(pool.is_none()));

    if let Some(error) = outcome.error {
        anyhow::bail!("route '{}' failed: {error}", route.name);
    }
    Ok(())
}

async fn scrape_and_store<R: PageRenderer>(
    renderer: &mut R,
    pool: Option<&PgPool>,
    ctx: &ScrapeContext,
    route: &RouteDescriptor,
    totals: &mut RunTotals,
) -> RouteOutcome {
    let outcome = match pool {
        Some(pool) => run_route(renderer, &mut PgScrapeLog { pool }, ctx, route).await,
        None => run_route(renderer, &mut MemoryScrapeLog::default(), ctx, route).await,
    };
    totals.record(&outcome);

    if let Some(pool) = pool {
        if !outcome.records.is_empty() {
            match busdb_db::insert_bus_routes(pool, &outcome.records).await {
                Ok(summary) => {
                    totals.stored += summary.inserted;
                    totals.store_failed += summary.failed;
                }
                Err(e) => {
                    tracing::error!(route = %route.name, error = %e, "failed to store listings");
                    totals.store_failed += outcome.records.len();
                }
            }
        }
    }

    outcome
}

#[cfg(test)]
#[path = "scrape_test.rs"]
mod tests;
