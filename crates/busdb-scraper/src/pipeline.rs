//! Route pipeline: load one route page, extract, validate, record the outcome.
//!
//! Each run moves its scrape-log entry from `STARTED` to exactly one of
//! `SUCCESS` or `FAILED`. Page-level failures (navigation errors, no listings
//! found by any strategy) fail the route; everything else is absorbed.
//! Side operations (log writes, readiness wait, scrolling, snapshots) are
//! best-effort: their failures are logged and returned in
//! [`RouteOutcome::suppressed`] without affecting the route status.

use std::convert::Infallible;
use std::fmt::Display;
use std::path::PathBuf;
use std::time::Duration;

use busdb_core::{AppConfig, BusRecord, RouteDescriptor, ScrapeStatus};
use chrono::{DateTime, Utc};

use crate::error::ScraperError;
use crate::extract::{extract_candidates, Strategy};
use crate::render::PageRenderer;
use crate::validate::accept;

const READY_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Timing and output settings for one run, passed to every route.
#[derive(Debug, Clone)]
pub struct ScrapeContext {
    /// Upper bound on the readiness wait after navigation.
    pub page_load_timeout: Duration,
    /// Pause after the readiness wait, before scrolling.
    pub settle_delay: Duration,
    pub scroll_steps: u32,
    pub scroll_step_px: u32,
    pub scroll_delay: Duration,
    /// Where page snapshots go; `None` disables them.
    pub snapshot_dir: Option<PathBuf>,
}

impl ScrapeContext {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            page_load_timeout: Duration::from_secs(config.scraper_page_load_timeout_secs),
            settle_delay: Duration::from_millis(config.scraper_settle_delay_ms),
            scroll_steps: config.scraper_scroll_steps,
            scroll_step_px: config.scraper_scroll_step_px,
            scroll_delay: Duration::from_millis(config.scraper_scroll_delay_ms),
            snapshot_dir: Some(config.snapshot_dir.clone()),
        }
    }

    /// No waits at all and no snapshots. For offline replays of saved pages.
    #[must_use]
    pub fn without_delays() -> Self {
        Self {
            page_load_timeout: Duration::ZERO,
            settle_delay: Duration::ZERO,
            scroll_steps: 0,
            scroll_step_px: 0,
            scroll_delay: Duration::ZERO,
            snapshot_dir: None,
        }
    }
}

/// Sink for per-route attempt records.
///
/// `start` is called once per route; exactly one of `succeed` or `fail`
/// follows for the returned id.
#[allow(async_fn_in_trait)]
pub trait ScrapeLog {
    type Error: Display;

    async fn start(&mut self, route_url: &str) -> Result<i64, Self::Error>;

    async fn succeed(&mut self, log_id: i64, buses_scraped: usize) -> Result<(), Self::Error>;

    async fn fail(&mut self, log_id: i64, error_message: &str) -> Result<(), Self::Error>;
}

/// One in-memory scrape-log entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeLogEntry {
    pub id: i64,
    pub route_url: String,
    pub status: ScrapeStatus,
    pub buses_scraped: usize,
    pub error_message: Option<String>,
    pub started_at: DateTime<Utc>,
    /// `None` while the entry is `STARTED`.
    pub completed_at: Option<DateTime<Utc>>,
}

/// A [`ScrapeLog`] kept in memory, for dry runs and tests.
#[derive(Debug, Default)]
pub struct MemoryScrapeLog {
    pub entries: Vec<ScrapeLogEntry>,
}

impl MemoryScrapeLog {
    fn entry_mut(&mut self, log_id: i64) -> Option<&mut ScrapeLogEntry> {
        self.entries
            .iter_mut()
            .find(|e| e.id == log_id && e.status == ScrapeStatus::Started)
    }
}

impl ScrapeLog for MemoryScrapeLog {
    type Error = Infallible;

    async fn start(&mut self, route_url: &str) -> Result<i64, Infallible> {
        let id = i64::try_from(self.entries.len()).unwrap_or(i64::MAX) + 1;
        self.entries.push(ScrapeLogEntry {
            id,
            route_url: route_url.to_owned(),
            status: ScrapeStatus::Started,
            buses_scraped: 0,
            error_message: None,
            started_at: Utc::now(),
            completed_at: None,
        });
        Ok(id)
    }

    async fn succeed(&mut self, log_id: i64, buses_scraped: usize) -> Result<(), Infallible> {
        if let Some(entry) = self.entry_mut(log_id) {
            entry.status = ScrapeStatus::Success;
            entry.buses_scraped = buses_scraped;
            entry.completed_at = Some(Utc::now());
        }
        Ok(())
    }

    async fn fail(&mut self, log_id: i64, error_message: &str) -> Result<(), Infallible> {
        if let Some(entry) = self.entry_mut(log_id) {
            entry.status = ScrapeStatus::Failed;
            entry.error_message = Some(error_message.to_owned());
            entry.completed_at = Some(Utc::now());
        }
        Ok(())
    }
}

/// Result of one route run. Never an error: failures are in `status`/`error`.
#[derive(Debug)]
pub struct RouteOutcome {
    /// Accepted records, possibly empty.
    pub records: Vec<BusRecord>,
    pub status: ScrapeStatus,
    /// Page-level failure message when `status` is `FAILED`.
    pub error: Option<String>,
    pub strategy: Option<Strategy>,
    /// Candidates dropped by the validator.
    pub rejected: usize,
    /// Best-effort side operations that failed, as `"<action>: <error>"`.
    pub suppressed: Vec<String>,
}

/// Collects failures of best-effort operations.
#[derive(Debug, Default)]
struct Suppressed(Vec<String>);

impl Suppressed {
    /// Unwraps `result`, or logs and records the error and returns `None`.
    fn record<T, E: Display>(&mut self, action: &str, result: Result<T, E>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(action, error = %e, "best-effort operation failed");
                self.0.push(format!("{action}: {e}"));
                None
            }
        }
    }
}

struct PageResult {
    strategy: Strategy,
    records: Vec<BusRecord>,
    rejected: usize,
}

/// Scrapes one route end to end.
pub async fn run_route<R, L>(
    renderer: &mut R,
    log: &mut L,
    ctx: &ScrapeContext,
    route: &RouteDescriptor,
) -> RouteOutcome
where
    R: PageRenderer,
    L: ScrapeLog,
{
    let mut suppressed = Suppressed::default();
    tracing::info!(route = %route.name, url = %route.url, "scraping route");

    let log_id = suppressed.record("create scrape log", log.start(&route.url).await);

    let outcome = match scrape_page(renderer, ctx, route, &mut suppressed).await {
        Ok(page) => {
            tracing::info!(
                route = %route.name,
                strategy = page.strategy.as_str(),
                accepted = page.records.len(),
                rejected = page.rejected,
                "route scraped"
            );
            if let Some(id) = log_id {
                suppressed.record(
                    "complete scrape log",
                    log.succeed(id, page.records.len()).await,
                );
            }
            RouteOutcome {
                records: page.records,
                status: ScrapeStatus::Success,
                error: None,
                strategy: Some(page.strategy),
                rejected: page.rejected,
                suppressed: Vec::new(),
            }
        }
        Err(e) => {
            let message = e.to_string();
            tracing::error!(route = %route.name, error = %message, "route failed");
            if let Some(id) = log_id {
                suppressed.record("fail scrape log", log.fail(id, &message).await);
            }
            RouteOutcome {
                records: Vec::new(),
                status: ScrapeStatus::Failed,
                error: Some(message),
                strategy: None,
                rejected: 0,
                suppressed: Vec::new(),
            }
        }
    };

    if let Some(dir) = &ctx.snapshot_dir {
        let path = dir.join(snapshot_file_name(route, outcome.status));
        let result = renderer.capture_snapshot(&path).await;
        if result.is_ok() {
            tracing::debug!(path = %path.display(), "snapshot saved");
        }
        suppressed.record("capture snapshot", result);
    }

    RouteOutcome {
        suppressed: suppressed.0,
        ..outcome
    }
}

async fn scrape_page<R: PageRenderer>(
    renderer: &mut R,
    ctx: &ScrapeContext,
    route: &RouteDescriptor,
    suppressed: &mut Suppressed,
) -> Result<PageResult, ScraperError> {
    renderer.navigate(&route.url).await?;
    suppressed.record(
        "wait for page",
        wait_until_ready(renderer, &route.url, ctx.page_load_timeout).await,
    );
    tokio::time::sleep(ctx.settle_delay).await;

    for step in 1..=ctx.scroll_steps {
        let offset = step.saturating_mul(ctx.scroll_step_px);
        suppressed.record("scroll", renderer.scroll_to(offset).await);
        tokio::time::sleep(ctx.scroll_delay).await;
    }

    let Some((strategy, candidates)) = extract_candidates(renderer, route).await else {
        return Err(ScraperError::NoListings {
            url: route.url.clone(),
        });
    };

    let mut records = Vec::with_capacity(candidates.len());
    let mut rejected = 0usize;
    for candidate in candidates {
        match accept(candidate) {
            Ok(record) => records.push(record),
            Err(reason) => {
                rejected += 1;
                tracing::debug!(route = %route.name, %reason, "invalid bus data");
            }
        }
    }

    Ok(PageResult {
        strategy,
        records,
        rejected,
    })
}

/// Polls `is_ready` until it reports `true` or `timeout` elapses.
///
/// # Errors
///
/// Returns [`ScraperError::LoadTimeout`] on timeout, or the renderer's error.
pub(crate) async fn wait_until_ready<R: PageRenderer>(
    renderer: &mut R,
    url: &str,
    timeout: Duration,
) -> Result<(), ScraperError> {
    let poll = async {
        loop {
            match renderer.is_ready().await {
                Ok(true) => return Ok(()),
                Ok(false) => tokio::time::sleep(READY_POLL_INTERVAL).await,
                Err(e) => return Err(e),
            }
        }
    };

    tokio::time::timeout(timeout, poll)
        .await
        .unwrap_or_else(|_| {
            Err(ScraperError::LoadTimeout {
                url: url.to_owned(),
                waited_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            })
        })
}

/// `<route name>.html`, or `ERROR_<route name>.html` for failed routes, with
/// spaces and path separators replaced by `_`.
#[must_use]
pub fn snapshot_file_name(route: &RouteDescriptor, status: ScrapeStatus) -> String {
    let stem: String = route
        .name
        .chars()
        .map(|c| if matches!(c, ' ' | '/' | '\\') { '_' } else { c })
        .collect();
    match status {
        ScrapeStatus::Failed => format!("ERROR_{stem}.html"),
        ScrapeStatus::Started | ScrapeStatus::Success => format!("{stem}.html"),
    }
}
