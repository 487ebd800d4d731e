//! Fallback strategy: page-wide element lists paired by position.

use busdb_core::{RouteDescriptor, NOT_AVAILABLE};

use crate::error::ScraperError;
use crate::normalize::{parse_price, sanitize_text};
use crate::render::PageRenderer;
use crate::types::BusCandidate;

pub const DEPARTURE_SELECTOR: &str = "p[class*='boardingTime']";
pub const ARRIVAL_SELECTOR: &str = "p[class*='droppingTime']";
pub const OPERATOR_SELECTOR: &str = "div[class*='travelsName']";
pub const PRICE_SELECTOR: &str = "p[class*='finalFare'], p[class*='fare']";

/// Trimmed texts of each page-wide element list, in document order.
#[derive(Debug, Default, Clone)]
pub struct ElementLists {
    pub departures: Vec<String>,
    pub arrivals: Vec<String>,
    pub operators: Vec<String>,
    pub prices: Vec<String>,
}

/// Collects the element lists from the current page and pairs them.
///
/// A failing page query yields an empty list.
pub async fn extract_elements<R: PageRenderer>(
    renderer: &R,
    route: &RouteDescriptor,
) -> Vec<BusCandidate> {
    match collect_lists(renderer).await {
        Ok(lists) => {
            tracing::info!(
                route = %route.name,
                departures = lists.departures.len(),
                arrivals = lists.arrivals.len(),
                operators = lists.operators.len(),
                prices = lists.prices.len(),
                "element parsing"
            );
            pair_elements(route, &lists)
        }
        Err(e) => {
            tracing::error!(route = %route.name, error = %e, "element query failed");
            Vec::new()
        }
    }
}

async fn collect_lists<R: PageRenderer>(renderer: &R) -> Result<ElementLists, ScraperError> {
    Ok(ElementLists {
        departures: texts(renderer, DEPARTURE_SELECTOR).await?,
        arrivals: texts(renderer, ARRIVAL_SELECTOR).await?,
        operators: texts(renderer, OPERATOR_SELECTOR).await?,
        prices: texts(renderer, PRICE_SELECTOR).await?,
    })
}

async fn texts<R: PageRenderer>(renderer: &R, selector: &str) -> Result<Vec<String>, ScraperError> {
    Ok(renderer
        .query(selector)
        .await?
        .iter()
        .map(|el| el.text().trim().to_owned())
        .collect())
}

/// Pairs the `i`-th departure, arrival, operator and price.
///
/// Produces `min(departures, arrivals, operators)` candidates. Prices may run
/// short; missing ones are `"N/A"`.
#[must_use]
pub fn pair_elements(route: &RouteDescriptor, lists: &ElementLists) -> Vec<BusCandidate> {
    let count = lists
        .departures
        .len()
        .min(lists.arrivals.len())
        .min(lists.operators.len());

    (0..count)
        .map(|i| {
            let price = lists
                .prices
                .get(i)
                .cloned()
                .unwrap_or_else(|| NOT_AVAILABLE.to_owned());

            BusCandidate {
                busname: sanitize_text(&lists.operators[i]),
                departing_time: lists.departures[i].clone(),
                reaching_time: lists.arrivals[i].clone(),
                price_numeric: parse_price(&price),
                price,
                ..BusCandidate::for_route(&route.name, &route.url)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use busdb_core::BusType;

    use super::*;
    use crate::render::StaticPage;

    fn route() -> RouteDescriptor {
        RouteDescriptor::new("Pune to Goa", "https://www.redbus.in/bus-tickets/pune-to-goa")
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn pairs_up_to_shortest_required_list() {
        let lists = ElementLists {
            departures: strings(&["06:00", "07:30", "09:15"]),
            arrivals: strings(&["14:00", "15:10", "17:45"]),
            operators: strings(&["Neeta Travels", "Paulo Travels"]),
            prices: strings(&["₹850"]),
        };
        let candidates = pair_elements(&route(), &lists);

        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].price, "₹850");
        assert_eq!(candidates[0].price_numeric, Some(850));
        assert_eq!(candidates[1].busname, "Paulo Travels");
        assert_eq!(candidates[1].departing_time, "07:30");
        assert_eq!(candidates[1].price, "N/A");
        assert_eq!(candidates[1].price_numeric, None);
    }

    #[test]
    fn fallback_candidates_carry_unknown_extras() {
        let lists = ElementLists {
            departures: strings(&["06:00"]),
            arrivals: strings(&["14:00"]),
            operators: strings(&["Neeta Travels"]),
            prices: strings(&["₹850"]),
        };
        let c = &pair_elements(&route(), &lists)[0];

        assert_eq!(c.bustype, BusType::Unknown);
        assert_eq!(c.duration, "N/A");
        assert_eq!(c.duration_minutes, None);
        assert_eq!(c.star_rating, "N/A");
        assert_eq!(c.seats_available, "N/A");
        assert_eq!(c.route_link, "https://www.redbus.in/bus-tickets/pune-to-goa");
    }

    #[test]
    fn empty_operator_list_yields_nothing() {
        let lists = ElementLists {
            departures: strings(&["06:00"]),
            arrivals: strings(&["14:00"]),
            ..ElementLists::default()
        };
        assert!(pair_elements(&route(), &lists).is_empty());
    }

    #[tokio::test]
    async fn extract_elements_reads_page_lists() {
        let html = r#"
            <div class="travelsName">Neeta Travels</div>
            <p class="boardingTime"> 06:00 </p>
            <p class="droppingTime">14:00</p>
            <p class="fare finalFare">₹ 1,100</p>"#;
        let mut page = StaticPage::new(html);
        page.navigate("https://example.test/").await.unwrap();

        let candidates = extract_elements(&page, &route()).await;
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].departing_time, "06:00");
        assert_eq!(candidates[0].price, "₹ 1,100");
        assert_eq!(candidates[0].price_numeric, Some(1100));
    }
}
