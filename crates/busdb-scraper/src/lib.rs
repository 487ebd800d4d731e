pub mod classify;
pub mod error;
pub mod extract;
pub mod landing;
pub mod normalize;
pub mod pipeline;
pub(crate) mod rate_limit;
pub mod render;
pub mod types;
pub mod validate;

pub use classify::classify_bus_type;
pub use error::ScraperError;
pub use extract::{extract_candidates, Strategy};
pub use landing::expand_landing_routes;
pub use normalize::{
    parse_duration_to_minutes, parse_price, parse_rating, parse_seats, sanitize_text,
};
pub use pipeline::{
    run_route, MemoryScrapeLog, RouteOutcome, ScrapeContext, ScrapeLog, ScrapeLogEntry,
};
pub use render::{HttpRenderer, PageElement, PageRenderer, StaticPage};
pub use types::BusCandidate;
pub use validate::{accept, validate_candidate, Rejection};
