use serde::Serialize;
use serde_json::{json, Value};

/// Column order shared by the overview and history tables.
pub const HEADER: [&str; 12] = [
    "query_time_iso",
    "app_alias",
    "country",
    "title",
    "score",
    "ratings_count",
    "reviews_count",
    "realInstalls",
    "version",
    "lastUpdatedOn",
    "is_apac",
    "is_focus",
];

/// A tracked app: human alias plus store package id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AppEntry {
    pub alias: &'static str,
    pub id: &'static str,
}

impl AppEntry {
    pub const fn new(alias: &'static str, id: &'static str) -> Self {
        Self { alias, id }
    }
}

/// Normalized store listing for one (app, country) lookup.
///
/// Absent upstream fields stay `None` so an unknown value never reads as zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListingSnapshot {
    pub title: Option<String>,
    pub country: String,
    /// Copied as the store reports it.
    pub score: Option<Value>,
    pub ratings_count: Option<Value>,
    pub reviews_count: Option<Value>,
    /// Install tier; numeric for `realInstalls`/`minInstalls`, text for `installs`.
    #[serde(rename = "realInstalls")]
    pub real_installs: Option<Value>,
    pub version: Option<String>,
    /// Always text. Holds `None` when the store reported no update date.
    #[serde(rename = "lastUpdatedOn")]
    pub last_updated_on: String,
}

/// One spreadsheet row: a snapshot tagged with run and market metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputRow {
    pub query_time_iso: String,
    pub app_alias: String,
    pub listing: ListingSnapshot,
    pub is_apac: bool,
    pub is_focus: bool,
}

impl OutputRow {
    /// Cells in `HEADER` order. `None` becomes an empty cell.
    pub fn to_cells(&self) -> Vec<Value> {
        let l = &self.listing;
        vec![
            json!(self.query_time_iso),
            json!(self.app_alias),
            json!(l.country),
            json!(l.title),
            cell(&l.score),
            cell(&l.ratings_count),
            cell(&l.reviews_count),
            cell(&l.real_installs),
            json!(l.version),
            json!(l.last_updated_on),
            json!(self.is_apac),
            json!(self.is_focus),
        ]
    }
}

fn cell(value: &Option<Value>) -> Value {
    value.clone().unwrap_or(Value::Null)
}

pub fn header_cells() -> Vec<Value> {
    HEADER.iter().map(|h| json!(h)).collect()
}
