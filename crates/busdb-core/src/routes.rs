use serde::{Deserialize, Serialize};

/// Sentinel stored in text fields whose value could not be extracted.
pub const NOT_AVAILABLE: &str = "N/A";

/// A single route listing page to scrape.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RouteDescriptor {
    pub name: String,
    pub url: String,
}

impl RouteDescriptor {
    #[must_use]
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

/// Coarse vehicle category inferred from listing text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BusType {
    #[serde(rename = "AC Sleeper")]
    AcSleeper,
    #[serde(rename = "Non-AC Sleeper")]
    NonAcSleeper,
    #[serde(rename = "Sleeper")]
    Sleeper,
    #[serde(rename = "AC Seater")]
    AcSeater,
    #[serde(rename = "Non-AC Seater")]
    NonAcSeater,
    #[serde(rename = "Seater")]
    Seater,
    #[serde(rename = "Volvo")]
    Volvo,
    #[serde(rename = "AC")]
    Ac,
    #[serde(rename = "Non-AC")]
    NonAc,
    #[serde(rename = "N/A")]
    Unknown,
}

impl BusType {
    pub const ALL: [BusType; 10] = [
        BusType::AcSleeper,
        BusType::NonAcSleeper,
        BusType::Sleeper,
        BusType::AcSeater,
        BusType::NonAcSeater,
        BusType::Seater,
        BusType::Volvo,
        BusType::Ac,
        BusType::NonAc,
        BusType::Unknown,
    ];

    /// Display label, also the value persisted in storage.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            BusType::AcSleeper => "AC Sleeper",
            BusType::NonAcSleeper => "Non-AC Sleeper",
            BusType::Sleeper => "Sleeper",
            BusType::AcSeater => "AC Seater",
            BusType::NonAcSeater => "Non-AC Seater",
            BusType::Seater => "Seater",
            BusType::Volvo => "Volvo",
            BusType::Ac => "AC",
            BusType::NonAc => "Non-AC",
            BusType::Unknown => NOT_AVAILABLE,
        }
    }
}

impl std::fmt::Display for BusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BusType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BusType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown bus type '{s}'"))
    }
}

/// Lifecycle of one route-pipeline attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ScrapeStatus {
    Started,
    Success,
    Failed,
}

impl ScrapeStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ScrapeStatus::Started => "STARTED",
            ScrapeStatus::Success => "SUCCESS",
            ScrapeStatus::Failed => "FAILED",
        }
    }
}

impl std::fmt::Display for ScrapeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated bus listing, ready for storage.
///
/// Only the record validator produces these; every required text field is
/// non-empty and both times have the `H:MM`/`HH:MM` shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusRecord {
    pub route_name: String,
    pub route_link: String,
    pub busname: String,
    pub bustype: BusType,
    pub departing_time: String,
    pub reaching_time: String,
    pub duration: Option<String>,
    pub duration_minutes: Option<i32>,
    pub star_rating: Option<f64>,
    /// Display price as scraped, e.g. `"₹1,250"`.
    pub price: String,
    pub price_numeric: Option<i64>,
    pub seats_available: Option<i32>,
}
