//! Google Play listing lookups and their normalization into `ListingSnapshot`.
pub mod details;
pub mod provider;

pub use provider::{ListingError, ListingSource, PlayStoreProvider};

use serde_json::{Map, Value};

use crate::models::ListingSnapshot;

/// Listing as the store reports it, keyed by store field name
/// (`title`, `score`, `ratings`, `realInstalls`, `updated`, ...).
pub type RawListing = Map<String, Value>;

/// Text written for `lastUpdatedOn` when neither update field is present.
pub const MISSING_UPDATE: &str = "None";

/// Look up one app in one market and normalize the result.
///
/// Exactly one remote call; any failure is returned unchanged.
pub async fn fetch_listing<S>(
    source: &S,
    app_id: &str,
    country: &str,
    lang: &str,
) -> Result<ListingSnapshot, ListingError>
where
    S: ListingSource + ?Sized,
{
    let raw = source.lookup(app_id, country, lang).await?;
    tracing::debug!(app = app_id, country, fields = raw.len(), "listing fetched");
    Ok(normalize(country, &raw))
}

/// Map store fields onto the snapshot shape.
///
/// `realInstalls` falls back to `minInstalls`, then `installs`.
/// `lastUpdatedOn` falls back to `updated` and is always rendered as text.
/// Both chains skip blank values (`0`, `""`, `false`, empty containers), not just missing ones.
pub fn normalize(country: &str, raw: &RawListing) -> ListingSnapshot {
    let real_installs = first_filled(raw, &["realInstalls", "minInstalls", "installs"]).cloned();

    let last_updated_on = match first_filled(raw, &["lastUpdatedOn", "updated"]) {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => MISSING_UPDATE.to_string(),
    };

    ListingSnapshot {
        title: text(raw, "title"),
        country: country.to_string(),
        score: present(raw, "score").cloned(),
        ratings_count: present(raw, "ratings").cloned(),
        reviews_count: present(raw, "reviews").cloned(),
        real_installs,
        version: text(raw, "version"),
        last_updated_on,
    }
}

// Missing and JSON null count as absent; zero and "" do not.
fn present<'a>(raw: &'a RawListing, key: &str) -> Option<&'a Value> {
    raw.get(key).filter(|v| !v.is_null())
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

/// First of `keys` holding a non-blank value.
fn first_filled<'a>(raw: &'a RawListing, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| raw.get(*key))
        .find(|v| !is_blank(v))
}

fn text(raw: &RawListing, key: &str) -> Option<String> {
    present(raw, key).map(|v| match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    fn raw(value: Value) -> RawListing {
        match value {
            Value::Object(map) => map,
            _ => panic!("fixture must be an object"),
        }
    }

    #[test]
    fn installs_fall_back_to_min_installs() {
        let listing = normalize(
            "sg",
            &raw(json!({ "minInstalls": 1_000_000, "installs": "1,000,000+" })),
        );
        assert_eq!(listing.real_installs, Some(json!(1_000_000)));
    }

    #[test]
    fn installs_fall_back_to_install_tier_text() {
        let listing = normalize(
            "sg",
            &raw(json!({ "realInstalls": null, "installs": "500,000+" })),
        );
        assert_eq!(listing.real_installs, Some(json!("500,000+")));
    }

    #[test]
    fn installs_absent_when_no_source_field() {
        let listing = normalize("sg", &raw(json!({ "title": "X App" })));
        assert_eq!(listing.real_installs, None);
    }

    #[test]
    fn zero_real_installs_falls_through_to_min_installs() {
        let listing = normalize(
            "sg",
            &raw(json!({ "realInstalls": 0, "minInstalls": 10, "installs": "10+" })),
        );
        assert_eq!(listing.real_installs, Some(json!(10)));
    }

    #[test]
    fn blank_install_fields_fall_through_to_tier_text() {
        let listing = normalize(
            "sg",
            &raw(json!({ "realInstalls": 0.0, "minInstalls": "", "installs": "10+" })),
        );
        assert_eq!(listing.real_installs, Some(json!("10+")));
    }

    #[test]
    fn all_blank_install_fields_are_absent() {
        let listing = normalize(
            "sg",
            &raw(json!({ "realInstalls": 0, "minInstalls": false, "installs": "" })),
        );
        assert_eq!(listing.real_installs, None);
    }

    #[test]
    fn empty_last_updated_on_falls_through_to_updated() {
        let listing = normalize(
            "us",
            &raw(json!({ "lastUpdatedOn": "", "updated": 1759276800 })),
        );
        assert_eq!(listing.last_updated_on, "1759276800");
    }

    #[test]
    fn zero_update_fields_render_as_none_text() {
        let listing = normalize("us", &raw(json!({ "lastUpdatedOn": 0, "updated": 0 })));
        assert_eq!(listing.last_updated_on, MISSING_UPDATE);
    }

    #[test]
    fn direct_fields_keep_zero_and_unexpected_types() {
        let listing = normalize(
            "sg",
            &raw(json!({ "score": 0, "ratings": 1234.0, "reviews": "12" })),
        );
        assert_eq!(listing.score, Some(json!(0)));
        assert_eq!(listing.ratings_count, Some(json!(1234.0)));
        assert_eq!(listing.reviews_count, Some(json!("12")));
    }

    #[test]
    fn update_date_prefers_last_updated_on() {
        let listing = normalize(
            "us",
            &raw(json!({ "lastUpdatedOn": "Oct 1, 2025", "updated": 1759276800 })),
        );
        assert_eq!(listing.last_updated_on, "Oct 1, 2025");
    }

    #[test]
    fn update_date_falls_back_to_epoch_text() {
        let listing = normalize("us", &raw(json!({ "updated": 1759276800 })));
        assert_eq!(listing.last_updated_on, "1759276800");
    }

    #[test]
    fn missing_update_date_is_literal_none_text() {
        let listing = normalize("us", &raw(json!({})));
        assert_eq!(listing.last_updated_on, MISSING_UPDATE);
    }

    #[test]
    fn direct_fields_are_copied() {
        let listing = normalize(
            "hk",
            &raw(json!({
                "title": "Revolut",
                "score": 4.5,
                "ratings": 120,
                "reviews": 80,
                "version": "10.1",
            })),
        );
        assert_eq!(listing.title.as_deref(), Some("Revolut"));
        assert_eq!(listing.country, "hk");
        assert_eq!(listing.score, Some(json!(4.5)));
        assert_eq!(listing.ratings_count, Some(json!(120)));
        assert_eq!(listing.reviews_count, Some(json!(80)));
        assert_eq!(listing.version.as_deref(), Some("10.1"));
    }

    struct Recording {
        calls: Mutex<Vec<(String, String, String)>>,
    }

    #[async_trait]
    impl ListingSource for Recording {
        async fn lookup(
            &self,
            app_id: &str,
            country: &str,
            lang: &str,
        ) -> Result<RawListing, ListingError> {
            self.calls
                .lock()
                .unwrap()
                .push((app_id.into(), country.into(), lang.into()));
            Ok(raw(json!({ "title": "X App", "score": 4.5 })))
        }
    }

    #[tokio::test]
    async fn fetch_issues_exactly_one_lookup() {
        let source = Recording {
            calls: Mutex::new(Vec::new()),
        };
        let listing = fetch_listing(&source, "com.x", "sg", "en").await.unwrap();
        assert_eq!(listing.title.as_deref(), Some("X App"));
        let calls = source.calls.lock().unwrap();
        assert_eq!(
            *calls,
            vec![("com.x".to_string(), "sg".to_string(), "en".to_string())]
        );
    }
}
