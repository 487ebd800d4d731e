//! Keyword-based bus-type inference.

use busdb_core::BusType;

/// Lower-cased listing text with the AC qualifier pre-computed.
struct Keywords<'a> {
    text: &'a str,
    ac: bool,
    non_ac: bool,
}

impl Keywords<'_> {
    /// `"ac"` anywhere, with no `"non"` anywhere.
    fn is_ac(&self) -> bool {
        self.ac
    }

    fn is_non_ac(&self) -> bool {
        self.non_ac
    }

    fn refine(&self, ac: BusType, non_ac: BusType, plain: BusType) -> BusType {
        if self.is_ac() {
            ac
        } else if self.is_non_ac() {
            non_ac
        } else {
            plain
        }
    }
}

type Rule = fn(&Keywords<'_>) -> Option<BusType>;

fn sleeper(k: &Keywords<'_>) -> Option<BusType> {
    k.text
        .contains("sleeper")
        .then(|| k.refine(BusType::AcSleeper, BusType::NonAcSleeper, BusType::Sleeper))
}

fn seater(k: &Keywords<'_>) -> Option<BusType> {
    k.text
        .contains("seater")
        .then(|| k.refine(BusType::AcSeater, BusType::NonAcSeater, BusType::Seater))
}

fn volvo(k: &Keywords<'_>) -> Option<BusType> {
    k.text.contains("volvo").then_some(BusType::Volvo)
}

fn ac(k: &Keywords<'_>) -> Option<BusType> {
    k.is_ac().then_some(BusType::Ac)
}

fn non_ac(k: &Keywords<'_>) -> Option<BusType> {
    k.is_non_ac().then_some(BusType::NonAc)
}

/// Evaluated in order; the first rule returning `Some` wins.
const RULES: [Rule; 5] = [sleeper, seater, volvo, ac, non_ac];

/// Infers a coarse [`BusType`] from free listing text.
///
/// Matching is case-insensitive substring search. Text with no recognised
/// keyword yields [`BusType::Unknown`].
#[must_use]
pub fn classify_bus_type(text: &str) -> BusType {
    let lower = text.to_lowercase();
    let keywords = Keywords {
        text: &lower,
        ac: lower.contains("ac") && !lower.contains("non"),
        non_ac: lower.contains("non-ac") || lower.contains("non ac"),
    };

    RULES
        .iter()
        .find_map(|rule| rule(&keywords))
        .unwrap_or(BusType::Unknown)
}
