use anyhow::Result;
use clap::Parser;
use itertools::Itertools;
use play_sheets::config::{Catalog, Settings, SCOPES};
use play_sheets::logging::{init_tracing, DEFAULT_FILTER};
use play_sheets::play_store::PlayStoreProvider;
use play_sheets::sheets::{MemorySheets, SheetsClient};
use play_sheets::util::env as env_util;
use play_sheets::{run_sync, RunOptions};
use serde_json::Value;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "play_sheets",
    version,
    about = "Snapshot Play Store listings per market into Google Sheets"
)]
struct Cli {
    /// Service-account key file (default: service_account.json)
    #[arg(long)]
    credentials: Option<PathBuf>,
    /// Target spreadsheet id
    #[arg(long)]
    sheet_id: Option<String>,
    /// Store language code
    #[arg(long)]
    lang: Option<String>,
    /// Fetch every listing but write to memory and print the rows instead
    #[arg(long, default_value_t = false)]
    dry_run: bool,
}

fn cell_text(cell: &Value) -> String {
    match cell {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    env_util::init_env();
    init_tracing(DEFAULT_FILTER)?;
    let cli = Cli::parse();

    let mut settings = Settings::from_env();
    if let Some(path) = cli.credentials {
        settings.credentials = path;
    }
    if let Some(id) = cli.sheet_id {
        settings.sheet_id = id;
    }
    if let Some(lang) = cli.lang {
        settings.lang = lang;
    }

    let catalog = Catalog::default();
    let opts = RunOptions {
        lang: settings.lang.clone(),
        ..RunOptions::default()
    };
    let source = PlayStoreProvider::new(
        settings.store_base_url.as_deref(),
        settings.http_timeout_secs,
    )?;

    if cli.dry_run {
        info!("dry run: rows stay in memory");
        let sheets = MemorySheets::new();
        let summary = run_sync(&source, &sheets, &catalog, &opts).await?;
        println!("{}", summary.message());
        for row in sheets.rows(&opts.overview_table).unwrap_or_default() {
            println!("{}", row.iter().map(cell_text).join("\t"));
        }
        return Ok(());
    }

    let client = SheetsClient::authorize(&settings.credentials, &SCOPES).await?;
    let sheets = client.open_by_key(&settings.sheet_id).await?;
    let summary = run_sync(&source, &sheets, &catalog, &opts).await?;
    println!("{}", summary.message());
    Ok(())
}
