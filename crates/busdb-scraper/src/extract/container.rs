//! Primary strategy: one candidate per listing card.

use std::sync::LazyLock;

use busdb_core::{RouteDescriptor, NOT_AVAILABLE};
use regex::Regex;

use crate::classify::classify_bus_type;
use crate::error::ScraperError;
use crate::normalize::{parse_duration_to_minutes, parse_price, sanitize_text};
use crate::render::{PageElement, PageRenderer};
use crate::types::BusCandidate;

pub const CONTAINER_SELECTOR: &str = "div[class*='timeFareBoWrap'], div[class*='bus-item']";
pub const OPERATOR_SELECTOR: &str = "div[class*='travelsName']";

static TIME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{1,2}:\d{2}").expect("valid time regex"));
static PRICE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"₹([\d,]+)").expect("valid price regex"));
static DURATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+h\s*\d+m|\d+h|\d+m").expect("valid duration regex"));
static SEATS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\s*Seats?").expect("valid seats regex"));
static RATING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d\.\d+").expect("valid rating regex"));
// Stops at the first newline: only the card's first line is considered.
static LEADING_OPERATOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9 \t\-&!.()]+").expect("valid operator regex"));

/// Extracts one candidate per listing card on the current page.
///
/// A failing page query yields an empty list; a failing card is skipped.
pub async fn extract_containers<R: PageRenderer>(
    renderer: &R,
    route: &RouteDescriptor,
) -> Vec<BusCandidate> {
    let containers = match renderer.query(CONTAINER_SELECTOR).await {
        Ok(containers) => containers,
        Err(e) => {
            tracing::error!(route = %route.name, error = %e, "container query failed");
            return Vec::new();
        }
    };
    tracing::info!(route = %route.name, count = containers.len(), "found bus containers");

    containers
        .iter()
        .enumerate()
        .filter_map(|(idx, container)| {
            match candidate_from_container(container, route, idx) {
                Ok(candidate) => candidate,
                Err(e) => {
                    tracing::debug!(idx, error = %e, "skipping container");
                    None
                }
            }
        })
        .collect()
}

/// Builds a candidate from one card, or `None` if it carries fewer than two
/// times.
///
/// # Errors
///
/// Returns [`ScraperError::Selector`] if the operator sub-query fails.
pub fn candidate_from_container(
    container: &PageElement,
    route: &RouteDescriptor,
    idx: usize,
) -> Result<Option<BusCandidate>, ScraperError> {
    let text = container.text();

    let mut times = TIME_RE.find_iter(text).map(|m| m.as_str().to_owned());
    let (Some(departing_time), Some(reaching_time)) = (times.next(), times.next()) else {
        return Ok(None);
    };

    let price = PRICE_RE
        .captures(text)
        .map_or_else(|| NOT_AVAILABLE.to_owned(), |c| format!("₹{}", &c[1]));
    let duration = first_match(&DURATION_RE, text);
    let seats_available = SEATS_RE
        .captures(text)
        .map_or_else(|| NOT_AVAILABLE.to_owned(), |c| format!("{} Seats", &c[1]));
    let star_rating = first_match(&RATING_RE, text);
    let operator = operator_name(container, idx)?;

    Ok(Some(BusCandidate {
        route_name: route.name.clone(),
        route_link: route.url.clone(),
        busname: sanitize_text(&operator),
        bustype: classify_bus_type(text),
        departing_time,
        reaching_time,
        duration_minutes: parse_duration_to_minutes(&duration),
        duration,
        star_rating,
        price_numeric: parse_price(&price),
        price,
        seats_available,
    }))
}

fn first_match(re: &Regex, text: &str) -> String {
    re.find(text)
        .map_or_else(|| NOT_AVAILABLE.to_owned(), |m| m.as_str().to_owned())
}

/// Operator sub-element text, else the card's leading line, else a
/// positional placeholder.
fn operator_name(container: &PageElement, idx: usize) -> Result<String, ScraperError> {
    let from_element = container
        .query(OPERATOR_SELECTOR)?
        .into_iter()
        .map(|el| el.text().trim().to_owned())
        .find(|name| !name.is_empty());
    if let Some(name) = from_element {
        return Ok(name);
    }

    let leading = LEADING_OPERATOR_RE
        .find(container.text())
        .map(|m| m.as_str().trim())
        .filter(|name| !name.is_empty());

    Ok(leading.map_or_else(|| format!("Bus {}", idx + 1), str::to_owned))
}
