use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use super::details::parse_details;
use super::RawListing;

const DEFAULT_BASE_URL: &str = "https://play.google.com";

#[derive(Debug, Error)]
pub enum ListingError {
    #[error("{app_id} is not listed in the {country} store")]
    NotFound { app_id: String, country: String },
    #[error("store returned HTTP {status} for {app_id} ({country})")]
    Http {
        app_id: String,
        country: String,
        status: u16,
    },
    #[error("store request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unreadable store page: {0}")]
    Parse(String),
}

/// Anything that can answer "what does the store say about this app in this market".
#[async_trait]
pub trait ListingSource: Send + Sync {
    async fn lookup(
        &self,
        app_id: &str,
        country: &str,
        lang: &str,
    ) -> Result<RawListing, ListingError>;
}

/// Live Google Play details-page lookup.
#[derive(Debug, Clone)]
pub struct PlayStoreProvider {
    base_url: String,
    http: Client,
}

impl PlayStoreProvider {
    pub fn new(base_url: Option<&str>, timeout_secs: Option<u64>) -> anyhow::Result<Self> {
        let base_url = base_url
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/')
            .to_string();
        let http = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(timeout_secs.unwrap_or(30)))
            .build()?;
        Ok(Self { base_url, http })
    }

    pub fn details_url(&self) -> String {
        format!("{}/store/apps/details", self.base_url)
    }
}

#[async_trait]
impl ListingSource for PlayStoreProvider {
    async fn lookup(
        &self,
        app_id: &str,
        country: &str,
        lang: &str,
    ) -> Result<RawListing, ListingError> {
        debug!(app = app_id, country, lang, "play_store: requesting details page");
        let resp = self
            .http
            .get(self.details_url())
            .query(&[("id", app_id), ("hl", lang), ("gl", country)])
            .send()
            .await?;

        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            warn!(app = app_id, country, "play_store: app not listed");
            return Err(ListingError::NotFound {
                app_id: app_id.to_string(),
                country: country.to_string(),
            });
        }
        if !status.is_success() {
            return Err(ListingError::Http {
                app_id: app_id.to_string(),
                country: country.to_string(),
                status: status.as_u16(),
            });
        }

        let html = resp.text().await?;
        parse_details(app_id, &html)
    }
}
