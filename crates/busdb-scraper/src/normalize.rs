//! Field normalizers: raw listing text to typed values.
//!
//! None of these functions fail. Unparseable input yields `None`, or the
//! `"N/A"` sentinel for [`sanitize_text`].

use std::sync::LazyLock;

use busdb_core::NOT_AVAILABLE;
use regex::Regex;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

static DURATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:(\d+)h)?\s*(?:(\d+)m)?").expect("valid duration regex")
});
static DIGITS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+").expect("valid digits regex"));
static DISALLOWED_CHARS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s\-.,()&]").expect("valid sanitize regex"));

const CURRENCY_SYMBOLS: [char; 4] = ['₹', '$', '€', '£'];

/// Returns `true` for empty input or the `"N/A"` sentinel.
pub(crate) fn is_missing(text: &str) -> bool {
    let trimmed = text.trim();
    trimmed.is_empty() || trimmed == NOT_AVAILABLE
}

/// Parses a display price such as `"₹1,250"` into whole currency units.
///
/// Currency symbols, thousands separators and whitespace are stripped; any
/// fractional part is truncated. Values outside the `i64` range are `None`.
#[must_use]
pub fn parse_price(text: &str) -> Option<i64> {
    if is_missing(text) {
        return None;
    }

    let cleaned: String = text
        .chars()
        .filter(|c| !CURRENCY_SYMBOLS.contains(c) && *c != ',' && !c.is_whitespace())
        .collect();
    let value = cleaned.parse::<f64>().ok()?;
    // Non-finite and out-of-range values have no Decimal form.
    Decimal::from_f64_retain(value)?.trunc().to_i64()
}

/// Converts a duration like `"12h 30m"`, `"5h"` or `"45m"` to minutes.
///
/// Uses the first occurrence that contains an hours or minutes group.
/// Returns `None` when neither group appears anywhere in the text.
#[must_use]
pub fn parse_duration_to_minutes(text: &str) -> Option<i32> {
    if is_missing(text) {
        return None;
    }

    let caps = DURATION_RE
        .captures_iter(text)
        .find(|c| c.get(1).is_some() || c.get(2).is_some())?;

    let hours = match caps.get(1) {
        Some(m) => m.as_str().parse::<i32>().ok()?,
        None => 0,
    };
    let minutes = match caps.get(2) {
        Some(m) => m.as_str().parse::<i32>().ok()?,
        None => 0,
    };

    hours.checked_mul(60)?.checked_add(minutes)
}

/// Parses a star rating, accepting only values in `[0, 5]`.
#[must_use]
pub fn parse_rating(text: &str) -> Option<f64> {
    let value = text.trim().parse::<f64>().ok()?;
    (0.0..=5.0).contains(&value).then_some(value)
}

/// Extracts the first run of digits, e.g. `"23 Seats left"` gives `23`.
#[must_use]
pub fn parse_seats(text: &str) -> Option<i32> {
    DIGITS_RE
        .find(text)
        .and_then(|m| m.as_str().parse::<i32>().ok())
}

/// Collapses whitespace and drops characters outside word characters,
/// whitespace and `- . , ( ) &`.
///
/// Returns `"N/A"` if nothing survives.
#[must_use]
pub fn sanitize_text(text: &str) -> String {
    let stripped = DISALLOWED_CHARS_RE.replace_all(text, "");
    let collapsed = stripped.split_whitespace().collect::<Vec<_>>().join(" ");

    if collapsed.is_empty() {
        NOT_AVAILABLE.to_string()
    } else {
        collapsed
    }
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
