//! One full fetch-and-write cycle: every app in every global market, then
//! both tables written once.
use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use serde_json::Value;
use tracing::{debug, info};

use crate::config::{Catalog, DEFAULT_LANG, HISTORY_TABLE, OVERVIEW_TABLE};
use crate::models::{header_cells, OutputRow};
use crate::play_store::{fetch_listing, ListingSource};
use crate::sheets::{resolve_table, write_history, write_overview, SheetBackend};

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub lang: String,
    pub overview_table: String,
    pub history_table: String,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            lang: DEFAULT_LANG.to_string(),
            overview_table: OVERVIEW_TABLE.to_string(),
            history_table: HISTORY_TABLE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub rows_written: usize,
    pub query_time_iso: String,
}

impl RunSummary {
    pub fn message(&self) -> String {
        format!(
            "Wrote {} rows to Play_Overview and Play_History.",
            self.rows_written
        )
    }
}

/// Current UTC instant as ISO-8601 with an explicit `+00:00` offset.
pub fn run_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, false)
}

/// Fetch every (app, market) pair in catalog order and tag the results.
///
/// The first failed lookup aborts the whole collection.
pub async fn collect_rows<S>(
    source: &S,
    catalog: &Catalog,
    lang: &str,
    query_time_iso: &str,
) -> Result<Vec<OutputRow>>
where
    S: ListingSource + ?Sized,
{
    let markets = catalog.markets.global();
    let mut rows = Vec::with_capacity(catalog.apps.len() * markets.len());

    for app in &catalog.apps {
        for country in &markets {
            let listing = fetch_listing(source, app.id, country, lang)
                .await
                .with_context(|| format!("fetching {} ({}) in {}", app.alias, app.id, country))?;
            rows.push(OutputRow {
                query_time_iso: query_time_iso.to_string(),
                app_alias: app.alias.to_string(),
                listing,
                is_apac: catalog.markets.is_apac(country),
                is_focus: catalog.markets.is_focus(country),
            });
        }
        debug!(app = app.alias, markets = markets.len(), "app collected");
    }
    Ok(rows)
}

/// Resolve both tables, collect all rows, then replace the overview and
/// extend the history. Nothing is written unless every lookup succeeded.
pub async fn run_sync<S, B>(
    source: &S,
    sheets: &B,
    catalog: &Catalog,
    opts: &RunOptions,
) -> Result<RunSummary>
where
    S: ListingSource + ?Sized,
    B: SheetBackend + ?Sized,
{
    let overview = resolve_table(sheets, &opts.overview_table).await?;
    let history = resolve_table(sheets, &opts.history_table).await?;

    let query_time_iso = run_timestamp();
    info!(
        apps = catalog.apps.len(),
        expected_rows = catalog.expected_rows(),
        run = %query_time_iso,
        "collecting listings"
    );

    let rows = collect_rows(source, catalog, &opts.lang, &query_time_iso).await?;
    let header = header_cells();
    let cells: Vec<Vec<Value>> = rows.iter().map(OutputRow::to_cells).collect();

    write_overview(sheets, &overview, &header, &cells).await?;
    write_history(sheets, &history, &header, &cells).await?;

    Ok(RunSummary {
        rows_written: rows.len(),
        query_time_iso,
    })
}
