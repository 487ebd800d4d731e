//! Minimum-viable-record contract for extracted listings.

use std::sync::LazyLock;

use busdb_core::BusRecord;
use regex::Regex;
use thiserror::Error;

use crate::normalize::{is_missing, parse_rating, parse_seats};
use crate::types::BusCandidate;

static TIME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{1,2}:\d{2}$").expect("valid time regex"));

/// Why a candidate was dropped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("invalid rating format: '{0}'")]
    RatingFormat(String),

    #[error("invalid rating range (must be 0-5): '{0}'")]
    RatingOutOfRange(String),

    #[error("invalid departing time format (should be HH:MM): '{0}'")]
    DepartingTime(String),

    #[error("invalid reaching time format (should be HH:MM): '{0}'")]
    ReachingTime(String),
}

/// Checks a candidate against the record contract.
///
/// Checks run in order and stop at the first failure: required fields,
/// then the rating (only when present), then both times. The time check is
/// shape-only, so `"25:00"` passes.
///
/// # Errors
///
/// Returns the first [`Rejection`] encountered.
pub fn validate_candidate(candidate: &BusCandidate) -> Result<(), Rejection> {
    let required = [
        ("route_name", &candidate.route_name),
        ("busname", &candidate.busname),
        ("departing_time", &candidate.departing_time),
        ("reaching_time", &candidate.reaching_time),
        ("price", &candidate.price),
    ];
    if let Some((field, _)) = required.iter().find(|(_, value)| is_missing(value)) {
        return Err(Rejection::MissingField(*field));
    }

    if !is_missing(&candidate.star_rating) {
        let raw = candidate.star_rating.trim();
        let rating = raw
            .parse::<f64>()
            .map_err(|_| Rejection::RatingFormat(raw.to_owned()))?;
        if !(0.0..=5.0).contains(&rating) {
            return Err(Rejection::RatingOutOfRange(raw.to_owned()));
        }
    }

    if !TIME_RE.is_match(&candidate.departing_time) {
        return Err(Rejection::DepartingTime(candidate.departing_time.clone()));
    }
    if !TIME_RE.is_match(&candidate.reaching_time) {
        return Err(Rejection::ReachingTime(candidate.reaching_time.clone()));
    }

    Ok(())
}

/// Validates `candidate` and converts it into a typed [`BusRecord`].
///
/// # Errors
///
/// Returns the [`Rejection`] from [`validate_candidate`].
pub fn accept(candidate: BusCandidate) -> Result<BusRecord, Rejection> {
    validate_candidate(&candidate)?;

    let duration = (!is_missing(&candidate.duration)).then_some(candidate.duration);
    let star_rating = parse_rating(&candidate.star_rating);
    let seats_available = parse_seats(&candidate.seats_available);

    Ok(BusRecord {
        route_name: candidate.route_name,
        route_link: candidate.route_link,
        busname: candidate.busname,
        bustype: candidate.bustype,
        departing_time: candidate.departing_time,
        reaching_time: candidate.reaching_time,
        duration,
        duration_minutes: candidate.duration_minutes,
        star_rating,
        price: candidate.price,
        price_numeric: candidate.price_numeric,
        seats_available,
    })
}

#[cfg(test)]
mod tests {
    use busdb_core::BusType;

    use super::*;

    fn full_candidate() -> BusCandidate {
        BusCandidate {
            route_name: "Hyderabad to Vijayawada".to_owned(),
            route_link: "https://www.redbus.in/bus-tickets/hyderabad-to-vijayawada".to_owned(),
            busname: "APSRTC Amaravathi".to_owned(),
            bustype: BusType::AcSeater,
            departing_time: "21:05".to_owned(),
            reaching_time: "02:15".to_owned(),
            duration: "5h 10m".to_owned(),
            duration_minutes: Some(310),
            star_rating: "N/A".to_owned(),
            price: "₹1,250".to_owned(),
            price_numeric: Some(1250),
            seats_available: "23 Seats".to_owned(),
        }
    }

    #[test]
    fn accepts_full_candidate_without_rating() {
        assert_eq!(validate_candidate(&full_candidate()), Ok(()));
    }

    #[test]
    fn rejects_missing_busname() {
        let mut c = full_candidate();
        c.busname = "N/A".to_owned();
        assert_eq!(
            validate_candidate(&c),
            Err(Rejection::MissingField("busname"))
        );
    }

    #[test]
    fn rejects_empty_price() {
        let mut c = full_candidate();
        c.price = String::new();
        assert_eq!(validate_candidate(&c), Err(Rejection::MissingField("price")));
    }

    #[test]
    fn required_fields_checked_before_times() {
        let mut c = full_candidate();
        c.departing_time = "9:3".to_owned();
        c.route_name = String::new();
        assert_eq!(
            validate_candidate(&c),
            Err(Rejection::MissingField("route_name"))
        );
    }

    #[test]
    fn rejects_short_minutes() {
        let mut c = full_candidate();
        c.departing_time = "9:3".to_owned();
        assert_eq!(
            validate_candidate(&c),
            Err(Rejection::DepartingTime("9:3".to_owned()))
        );
    }

    #[test]
    fn time_shape_check() {
        for ok in ["9:30", "21:05", "25:00"] {
            let mut c = full_candidate();
            c.reaching_time = ok.to_owned();
            assert_eq!(validate_candidate(&c), Ok(()), "{ok} should pass");
        }
        for bad in ["9-30", "930", "9:3", "123:00"] {
            let mut c = full_candidate();
            c.reaching_time = bad.to_owned();
            assert_eq!(
                validate_candidate(&c),
                Err(Rejection::ReachingTime(bad.to_owned())),
                "{bad} should fail"
            );
        }
    }

    #[test]
    fn rejects_rating_out_of_range() {
        let mut c = full_candidate();
        c.star_rating = "7.0".to_owned();
        assert_eq!(
            validate_candidate(&c),
            Err(Rejection::RatingOutOfRange("7.0".to_owned()))
        );
    }

    #[test]
    fn rejects_unparseable_rating() {
        let mut c = full_candidate();
        c.star_rating = "great".to_owned();
        assert_eq!(
            validate_candidate(&c),
            Err(Rejection::RatingFormat("great".to_owned()))
        );
    }

    #[test]
    fn rating_checked_before_times() {
        let mut c = full_candidate();
        c.star_rating = "9.9".to_owned();
        c.departing_time = "930".to_owned();
        assert!(matches!(
            validate_candidate(&c),
            Err(Rejection::RatingOutOfRange(_))
        ));
    }

    #[test]
    fn validation_is_idempotent() {
        let mut c = full_candidate();
        c.reaching_time = "2-15".to_owned();
        let first = validate_candidate(&c);
        let second = validate_candidate(&c);
        assert_eq!(first, second);
        assert_eq!(validate_candidate(&full_candidate()), Ok(()));
        assert_eq!(validate_candidate(&full_candidate()), Ok(()));
    }

    #[test]
    fn accept_converts_to_typed_record() {
        let mut c = full_candidate();
        c.star_rating = "4.3".to_owned();
        let record = accept(c).unwrap();
        assert_eq!(record.star_rating, Some(4.3));
        assert_eq!(record.seats_available, Some(23));
        assert_eq!(record.duration.as_deref(), Some("5h 10m"));
        assert_eq!(record.duration_minutes, Some(310));
        assert_eq!(record.price_numeric, Some(1250));
        assert_eq!(record.bustype, BusType::AcSeater);
    }

    #[test]
    fn accept_maps_sentinels_to_none() {
        let mut c = full_candidate();
        c.duration = "N/A".to_owned();
        c.duration_minutes = None;
        c.seats_available = "N/A".to_owned();
        let record = accept(c).unwrap();
        assert_eq!(record.duration, None);
        assert_eq!(record.star_rating, None);
        assert_eq!(record.seats_available, None);
    }

    #[test]
    fn accept_propagates_rejection() {
        let mut c = full_candidate();
        c.busname = String::new();
        assert_eq!(accept(c), Err(Rejection::MissingField("busname")));
    }
}
