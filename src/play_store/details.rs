//! Extraction of listing fields from a Play Store details page.
//!
//! The page embeds its data as `AF_initDataCallback({key: 'ds:5', ..., data:[...]})`;
//! fields sit at fixed array positions inside that payload.
use regex::Regex;
use serde_json::{Map, Value};

use super::provider::ListingError;
use super::RawListing;

/// Store field name and its JSON pointer inside the `ds:5` payload.
const FIELDS: &[(&str, &str)] = &[
    ("title", "/1/2/0/0"),
    ("developer", "/1/2/68/0"),
    ("score", "/1/2/51/0/1"),
    ("ratings", "/1/2/51/2/1"),
    ("reviews", "/1/2/51/3/1"),
    ("installs", "/1/2/13/0"),
    ("minInstalls", "/1/2/13/1"),
    ("realInstalls", "/1/2/13/2"),
    ("version", "/1/2/140/0/0/0"),
    ("lastUpdatedOn", "/1/2/145/0/0"),
    ("updated", "/1/2/145/0/1/0"),
];

/// Parse a details page into a raw listing. Fields missing from the page are omitted.
pub fn parse_details(app_id: &str, html: &str) -> Result<RawListing, ListingError> {
    let payload = extract_payload(html)?;

    let mut raw = Map::new();
    raw.insert("appId".to_string(), Value::String(app_id.to_string()));
    for (name, pointer) in FIELDS {
        if let Some(value) = payload.pointer(pointer).filter(|v| !v.is_null()) {
            raw.insert((*name).to_string(), value.clone());
        }
    }

    if !raw.contains_key("title") {
        return Err(ListingError::Parse(format!(
            "no title in details payload for {app_id}"
        )));
    }
    Ok(raw)
}

fn extract_payload(html: &str) -> Result<Value, ListingError> {
    let re = Regex::new(
        r#"(?s)AF_initDataCallback\(\{key:\s*'ds:5',\s*hash:\s*'[^']*',\s*data:\s*(\[.+?\]),\s*sideChannel:"#,
    )
    .map_err(|e| ListingError::Parse(format!("bad ds:5 pattern: {e}")))?;

    let json = re
        .captures(html)
        .and_then(|c| c.get(1))
        .ok_or_else(|| ListingError::Parse("ds:5 block not found".to_string()))?;

    tracing::trace!(len = json.as_str().len(), "ds:5 payload located");
    serde_json::from_str(json.as_str())
        .map_err(|e| ListingError::Parse(format!("ds:5 payload is not JSON: {e}")))
}
