//! Google Sheets v4 REST backend.
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

use super::auth::{fetch_access_token, load_key, AccessToken};
use super::{SheetBackend, Worksheet};

const SHEETS_API: &str = "https://sheets.googleapis.com/v4/spreadsheets";

#[derive(Debug, Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    properties: Option<SpreadsheetProperties>,
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Debug, Deserialize)]
struct SpreadsheetProperties {
    title: String,
}

#[derive(Debug, Deserialize)]
struct SheetEntry {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SheetProperties {
    sheet_id: i64,
    title: String,
}

impl From<SheetProperties> for Worksheet {
    fn from(p: SheetProperties) -> Self {
        Worksheet {
            sheet_id: p.sheet_id,
            title: p.title,
        }
    }
}

#[derive(Debug, Deserialize)]
struct BatchUpdateResponse {
    #[serde(default)]
    replies: Vec<Reply>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Reply {
    add_sheet: Option<SheetEntry>,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

/// Authorized Sheets API handle; opens spreadsheets by key.
#[derive(Debug, Clone)]
pub struct SheetsClient {
    http: Client,
    token: AccessToken,
    base_url: String,
}

impl SheetsClient {
    /// Load the service-account key at `credentials` and obtain a token for `scopes`.
    pub async fn authorize(credentials: &Path, scopes: &[&str]) -> Result<Self> {
        let key = load_key(credentials)?;
        let http = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .context("building sheets HTTP client")?;
        let token = fetch_access_token(&http, &key, scopes)
            .await
            .with_context(|| format!("authorizing with {}", credentials.display()))?;
        info!(
            credentials = %credentials.display(),
            expires_at = %token.expires_at.to_rfc3339(),
            "sheets: authorized"
        );
        Ok(Self {
            http,
            token,
            base_url: SHEETS_API.to_string(),
        })
    }

    /// Open a spreadsheet, failing if it does not exist or is not shared with the account.
    pub async fn open_by_key(&self, spreadsheet_id: &str) -> Result<GoogleSheets> {
        let sheet = GoogleSheets {
            http: self.http.clone(),
            token: self.token.token.clone(),
            spreadsheet_url: format!("{}/{}", self.base_url, spreadsheet_id),
        };
        let meta: SpreadsheetMeta = sheet
            .send(
                sheet
                    .http
                    .get(&sheet.spreadsheet_url)
                    .query(&[("fields", "spreadsheetId,properties.title")]),
            )
            .await
            .with_context(|| format!("opening spreadsheet {spreadsheet_id}"))?;
        info!(
            spreadsheet = spreadsheet_id,
            title = %meta.properties.map(|p| p.title).unwrap_or_default(),
            "sheets: spreadsheet opened"
        );
        Ok(sheet)
    }
}

/// One open spreadsheet.
#[derive(Debug, Clone)]
pub struct GoogleSheets {
    http: Client,
    token: String,
    spreadsheet_url: String,
}

/// A1 range covering a whole table, percent-encoded for use in a URL path.
pub fn table_range(title: &str) -> String {
    let quoted = format!("'{}'", title.replace('\'', "''"));
    urlencoding::encode(&quoted).into_owned()
}

impl GoogleSheets {
    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T> {
        let resp = req
            .bearer_auth(&self.token)
            .send()
            .await
            .context("sheets request failed")?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("sheets API error: {} - {}", status, body);
        }
        resp.json::<T>().await.context("parsing sheets response")
    }

    fn values_url(&self, ws: &Worksheet) -> String {
        format!("{}/values/{}", self.spreadsheet_url, table_range(&ws.title))
    }

    fn add_sheet_request(&self, title: &str, rows: u32, cols: u32) -> RequestBuilder {
        let body = json!({
            "requests": [{
                "addSheet": {
                    "properties": {
                        "title": title,
                        "gridProperties": { "rowCount": rows, "columnCount": cols }
                    }
                }
            }]
        });
        self.http
            .post(format!("{}:batchUpdate", self.spreadsheet_url))
            .json(&body)
    }

    fn clear_request(&self, ws: &Worksheet) -> RequestBuilder {
        self.http
            .post(format!("{}:clear", self.values_url(ws)))
            .json(&json!({}))
    }

    fn append_request(&self, ws: &Worksheet, rows: &[Vec<Value>]) -> RequestBuilder {
        self.http
            .post(format!("{}:append", self.values_url(ws)))
            .query(&[("valueInputOption", "RAW")])
            .json(&json!({ "values": rows }))
    }
}

#[async_trait]
impl SheetBackend for GoogleSheets {
    async fn find_worksheet(&self, title: &str) -> Result<Option<Worksheet>> {
        let meta: SpreadsheetMeta = self
            .send(
                self.http
                    .get(&self.spreadsheet_url)
                    .query(&[("fields", "sheets.properties(sheetId,title)")]),
            )
            .await
            .context("listing worksheets")?;
        Ok(meta
            .sheets
            .into_iter()
            .map(|s| Worksheet::from(s.properties))
            .find(|ws| ws.title == title))
    }

    async fn add_worksheet(&self, title: &str, rows: u32, cols: u32) -> Result<Worksheet> {
        let resp: BatchUpdateResponse = self
            .send(self.add_sheet_request(title, rows, cols))
            .await
            .with_context(|| format!("adding worksheet {title}"))?;
        resp.replies
            .into_iter()
            .find_map(|r| r.add_sheet)
            .map(|s| Worksheet::from(s.properties))
            .with_context(|| format!("addSheet reply missing for {title}"))
    }

    async fn clear(&self, ws: &Worksheet) -> Result<()> {
        debug!(table = %ws.title, "sheets: clearing");
        let _: Value = self
            .send(self.clear_request(ws))
            .await
            .with_context(|| format!("clearing {}", ws.title))?;
        Ok(())
    }

    async fn append_rows(&self, ws: &Worksheet, rows: &[Vec<Value>]) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }
        debug!(table = %ws.title, rows = rows.len(), "sheets: appending");
        let _: Value = self
            .send(self.append_request(ws, rows))
            .await
            .with_context(|| format!("appending {} rows to {}", rows.len(), ws.title))?;
        Ok(())
    }

    async fn row_count(&self, ws: &Worksheet) -> Result<usize> {
        let range: ValueRange = self
            .send(self.http.get(self.values_url(ws)))
            .await
            .with_context(|| format!("reading {}", ws.title))?;
        Ok(range.values.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{NEW_TABLE_COLS, NEW_TABLE_ROWS, OVERVIEW_TABLE};

    const BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets/sheet123";

    fn sheet() -> GoogleSheets {
        GoogleSheets {
            http: Client::new(),
            token: "token".into(),
            spreadsheet_url: BASE.into(),
        }
    }

    fn overview() -> Worksheet {
        Worksheet {
            sheet_id: 7,
            title: OVERVIEW_TABLE.into(),
        }
    }

    fn body_json(req: &reqwest::Request) -> Value {
        let bytes = req.body().and_then(|b| b.as_bytes()).unwrap();
        serde_json::from_slice(bytes).unwrap()
    }

    #[test]
    fn append_posts_raw_values_to_table_range() {
        let rows = vec![vec![json!("2025-01-01T00:00:00+00:00"), Value::Null, json!(true)]];
        let req = sheet().append_request(&overview(), &rows).build().unwrap();
        assert_eq!(req.method(), reqwest::Method::POST);
        assert_eq!(
            req.url().as_str(),
            format!("{BASE}/values/%27Current_Overview%27:append?valueInputOption=RAW")
        );
        assert_eq!(body_json(&req), json!({ "values": rows }));
    }

    #[test]
    fn clear_posts_to_values_clear_endpoint() {
        let req = sheet().clear_request(&overview()).build().unwrap();
        assert_eq!(req.method(), reqwest::Method::POST);
        assert_eq!(
            req.url().as_str(),
            format!("{BASE}/values/%27Current_Overview%27:clear")
        );
        assert_eq!(body_json(&req), json!({}));
    }

    #[test]
    fn add_sheet_requests_default_grid_size() {
        let req = sheet()
            .add_sheet_request("Overview_History", NEW_TABLE_ROWS, NEW_TABLE_COLS)
            .build()
            .unwrap();
        assert_eq!(req.url().as_str(), format!("{BASE}:batchUpdate"));
        let props = &body_json(&req)["requests"][0]["addSheet"]["properties"];
        assert_eq!(props["title"], json!("Overview_History"));
        assert_eq!(props["gridProperties"]["rowCount"], json!(1000));
        assert_eq!(props["gridProperties"]["columnCount"], json!(20));
    }

    #[test]
    fn table_range_quotes_and_encodes() {
        assert_eq!(table_range("Current_Overview"), "%27Current_Overview%27");
        assert_eq!(table_range("Bob's tab"), "%27Bob%27%27s%20tab%27");
    }

    #[test]
    fn add_sheet_reply_parses_into_worksheet() {
        let raw = r#"{"spreadsheetId":"x","replies":[{"addSheet":{"properties":{"sheetId":42,"title":"Overview_History","index":1}}}]}"#;
        let resp: BatchUpdateResponse = serde_json::from_str(raw).unwrap();
        let ws = resp
            .replies
            .into_iter()
            .find_map(|r| r.add_sheet)
            .map(|s| Worksheet::from(s.properties))
            .unwrap();
        assert_eq!(
            ws,
            Worksheet {
                sheet_id: 42,
                title: "Overview_History".into()
            }
        );
    }

    #[test]
    fn empty_value_range_has_no_rows() {
        let range: ValueRange =
            serde_json::from_str(r#"{"range":"'Overview_History'!A1:Z1000","majorDimension":"ROWS"}"#)
                .unwrap();
        assert!(range.values.is_empty());
    }
}
