//! Page-to-candidate extraction.
//!
//! Strategies are tried in [`STRATEGIES`] order and the first one yielding
//! any candidates wins.

pub mod container;
pub mod elements;

use busdb_core::RouteDescriptor;

use crate::render::PageRenderer;
use crate::types::BusCandidate;

pub use container::extract_containers;
pub use elements::extract_elements;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// One candidate per listing card.
    Containers,
    /// Page-wide element lists paired by position.
    Elements,
}

impl Strategy {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Strategy::Containers => "containers",
            Strategy::Elements => "elements",
        }
    }
}

pub const STRATEGIES: [Strategy; 2] = [Strategy::Containers, Strategy::Elements];

/// Runs each strategy in order against the current page.
///
/// Returns the winning strategy and its candidates, or `None` when every
/// strategy came up empty.
pub async fn extract_candidates<R: PageRenderer>(
    renderer: &R,
    route: &RouteDescriptor,
) -> Option<(Strategy, Vec<BusCandidate>)> {
    for strategy in STRATEGIES {
        let candidates = match strategy {
            Strategy::Containers => extract_containers(renderer, route).await,
            Strategy::Elements => extract_elements(renderer, route).await,
        };
        if !candidates.is_empty() {
            return Some((strategy, candidates));
        }
        tracing::warn!(
            route = %route.name,
            strategy = strategy.as_str(),
            "strategy found no listings"
        );
    }
    None
}
