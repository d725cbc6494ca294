//! Static run configuration: tracked apps, market lists, spreadsheet targets.
use itertools::Itertools;
use std::path::PathBuf;

use crate::models::AppEntry;
use crate::util::env::{env_opt, env_parse_opt};

/// Spreadsheet that receives both tables.
pub const SHEET_ID: &str = "11Tyct_cEqn8syyuOmMbFbx9Rt2VZf7BZerUfwufknT8";

pub const OVERVIEW_TABLE: &str = "Current_Overview";
pub const HISTORY_TABLE: &str = "Overview_History";

/// Service-account key, relative to the working directory.
pub const SERVICE_ACCOUNT_FILE: &str = "service_account.json";

pub const SCOPES: [&str; 4] = [
    "https://spreadsheets.google.com/feeds",
    "https://www.googleapis.com/auth/spreadsheets",
    "https://www.googleapis.com/auth/drive",
    "https://www.googleapis.com/auth/drive.file",
];

pub const DEFAULT_LANG: &str = "en";

/// Size given to a table created on first use.
pub const NEW_TABLE_ROWS: u32 = 1000;
pub const NEW_TABLE_COLS: u32 = 20;

pub const APPS: &[AppEntry] = &[
    AppEntry::new("dtcpay", "com.dtc.wallet.app"),
    AppEntry::new("YouTrip", "co.you.youapp"),
    AppEntry::new("Wise", "com.transferwise.android"),
    AppEntry::new("Revolut", "com.revolut.revolut"),
    AppEntry::new("Redotpay", "com.redotpay"),
];

/// Markets reported with `is_focus`. Expected to be a subset of APAC.
pub const FOCUS_MARKETS: &[&str] = &["sg", "my", "hk"];

pub const APAC_MARKETS: &[&str] = &[
    "sg", "my", "hk", "au", "nz", "jp", "kr", "tw", "cn", "in", "id", "th", "ph", "vn",
];

pub const OTHER_MARKETS: &[&str] = &[
    "us", "ca", "gb", "ie", "de", "fr", "it", "es", "nl", "se", "ch", "dk", "no", "fi", "br",
    "mx", "ar", "ae", "sa",
];

/// Market classification used to tag rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Markets {
    pub focus: Vec<String>,
    pub apac: Vec<String>,
    pub other: Vec<String>,
}

impl Default for Markets {
    fn default() -> Self {
        Self::new(FOCUS_MARKETS, APAC_MARKETS, OTHER_MARKETS)
    }
}

impl Markets {
    pub fn new(focus: &[&str], apac: &[&str], other: &[&str]) -> Self {
        Self {
            focus: owned(focus),
            apac: owned(apac),
            other: owned(other),
        }
    }

    /// Sorted, duplicate-free union of APAC and OTHER.
    pub fn global(&self) -> Vec<String> {
        self.apac
            .iter()
            .chain(self.other.iter())
            .cloned()
            .sorted()
            .dedup()
            .collect()
    }

    pub fn is_apac(&self, country: &str) -> bool {
        self.apac.iter().any(|c| c == country)
    }

    pub fn is_focus(&self, country: &str) -> bool {
        self.focus.iter().any(|c| c == country)
    }
}

fn owned(codes: &[&str]) -> Vec<String> {
    codes.iter().map(|c| c.to_string()).collect()
}

/// Apps and markets iterated by one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    pub apps: Vec<AppEntry>,
    pub markets: Markets,
}

impl Default for Catalog {
    fn default() -> Self {
        Self {
            apps: APPS.to_vec(),
            markets: Markets::default(),
        }
    }
}

impl Catalog {
    /// Rows a successful run produces: one per (app, global market).
    pub fn expected_rows(&self) -> usize {
        self.apps.len() * self.markets.global().len()
    }
}

/// Deployment settings. Each falls back to its constant when the env var is unset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub credentials: PathBuf,
    pub sheet_id: String,
    pub lang: String,
    pub store_base_url: Option<String>,
    pub http_timeout_secs: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            credentials: PathBuf::from(SERVICE_ACCOUNT_FILE),
            sheet_id: SHEET_ID.to_string(),
            lang: DEFAULT_LANG.to_string(),
            store_base_url: None,
            http_timeout_secs: None,
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            credentials: env_opt("PLAY_SHEETS_CREDENTIALS")
                .map(PathBuf::from)
                .unwrap_or(defaults.credentials),
            sheet_id: env_opt("PLAY_SHEETS_SHEET_ID").unwrap_or(defaults.sheet_id),
            lang: env_opt("PLAY_SHEETS_LANG").unwrap_or(defaults.lang),
            store_base_url: env_opt("PLAY_STORE_BASE_URL"),
            http_timeout_secs: env_parse_opt("PLAY_SHEETS_HTTP_TIMEOUT_SECS"),
        }
    }
}
