//! Expands a state transport landing page into its route pages.

use std::collections::HashSet;

use busdb_core::RouteDescriptor;
use reqwest::Url;

use crate::error::ScraperError;
use crate::pipeline::{wait_until_ready, ScrapeContext};
use crate::render::PageRenderer;

pub const ROUTE_LINK_SELECTOR: &str = "a[href*='/bus-tickets/']";

/// Collects the route links on a landing page.
///
/// Relative hrefs are resolved against `landing_url`. A link's name is its
/// trimmed text, or the resolved URL when the text is blank. Duplicate URLs
/// keep their first occurrence. Any page-level error is logged and yields an
/// empty list.
pub async fn expand_landing_routes<R: PageRenderer>(
    renderer: &mut R,
    ctx: &ScrapeContext,
    landing_url: &str,
) -> Vec<RouteDescriptor> {
    tracing::info!(landing_url, "expanding routes from landing page");

    match collect_routes(renderer, ctx, landing_url).await {
        Ok(routes) => {
            tracing::info!(landing_url, count = routes.len(), "extracted routes");
            routes
        }
        Err(e) => {
            tracing::error!(landing_url, error = %e, "landing page expansion failed");
            Vec::new()
        }
    }
}

async fn collect_routes<R: PageRenderer>(
    renderer: &mut R,
    ctx: &ScrapeContext,
    landing_url: &str,
) -> Result<Vec<RouteDescriptor>, ScraperError> {
    renderer.navigate(landing_url).await?;
    if let Err(e) = wait_until_ready(renderer, landing_url, ctx.page_load_timeout).await {
        tracing::warn!(landing_url, error = %e, "landing page not ready, continuing");
    }
    tokio::time::sleep(ctx.settle_delay).await;

    let base = Url::parse(landing_url).ok();
    let anchors = renderer.query(ROUTE_LINK_SELECTOR).await?;
    tracing::debug!(landing_url, count = anchors.len(), "candidate route links");

    let mut seen = HashSet::new();
    let mut routes = Vec::new();
    for anchor in &anchors {
        let Some(href) = anchor.attr("href") else {
            continue;
        };
        let Some(url) = resolve_href(base.as_ref(), href) else {
            tracing::debug!(href, "skipping unresolvable route link");
            continue;
        };
        if !seen.insert(url.clone()) {
            continue;
        }

        let text = anchor.text().split_whitespace().collect::<Vec<_>>().join(" ");
        let name = if text.is_empty() { url.clone() } else { text };
        routes.push(RouteDescriptor { name, url });
    }

    Ok(routes)
}

fn resolve_href(base: Option<&Url>, href: &str) -> Option<String> {
    let resolved = match base {
        Some(base) => base.join(href).ok()?,
        None => Url::parse(href).ok()?,
    };
    Some(resolved.to_string())
}
