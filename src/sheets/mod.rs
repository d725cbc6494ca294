//! Spreadsheet access: the backend seam, its Google and in-memory
//! implementations, and the two table write policies.
pub mod auth;
pub mod google;
pub mod memory;
pub mod writer;

pub use google::{GoogleSheets, SheetsClient};
pub use memory::MemorySheets;
pub use writer::{resolve_table, write_history, write_overview};

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

/// A named table (tab) inside one spreadsheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Worksheet {
    pub sheet_id: i64,
    pub title: String,
}

/// Operations the writer needs from one open spreadsheet.
///
/// Cells are JSON values; `Value::Null` is an empty cell.
#[async_trait]
pub trait SheetBackend: Send + Sync {
    async fn find_worksheet(&self, title: &str) -> Result<Option<Worksheet>>;

    async fn add_worksheet(&self, title: &str, rows: u32, cols: u32) -> Result<Worksheet>;

    /// Remove every value in the table. The table itself stays.
    async fn clear(&self, ws: &Worksheet) -> Result<()>;

    /// Append rows after the last non-empty row. Empty input is a no-op.
    async fn append_rows(&self, ws: &Worksheet, rows: &[Vec<Value>]) -> Result<()>;

    /// Number of rows currently holding values.
    async fn row_count(&self, ws: &Worksheet) -> Result<usize>;
}
