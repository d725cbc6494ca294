use anyhow::{Context, Result};
use serde_json::Value;
use tracing::info;

use super::{SheetBackend, Worksheet};
use crate::config::{NEW_TABLE_COLS, NEW_TABLE_ROWS};

/// Look a table up by title, creating it (1000x20) when absent.
pub async fn resolve_table<B>(backend: &B, title: &str) -> Result<Worksheet>
where
    B: SheetBackend + ?Sized,
{
    if let Some(ws) = backend.find_worksheet(title).await? {
        return Ok(ws);
    }
    info!(table = title, "sheets: table missing, creating");
    backend
        .add_worksheet(title, NEW_TABLE_ROWS, NEW_TABLE_COLS)
        .await
        .with_context(|| format!("creating table {title}"))
}

/// Replace policy: clear, header, then every row in one append.
pub async fn write_overview<B>(
    backend: &B,
    ws: &Worksheet,
    header: &[Value],
    rows: &[Vec<Value>],
) -> Result<()>
where
    B: SheetBackend + ?Sized,
{
    backend.clear(ws).await?;
    backend.append_rows(ws, &[header.to_vec()]).await?;
    if !rows.is_empty() {
        backend.append_rows(ws, rows).await?;
    }
    info!(table = %ws.title, rows = rows.len(), "sheets: overview replaced");
    Ok(())
}

/// Append-only policy: header only into an empty table, rows always appended.
pub async fn write_history<B>(
    backend: &B,
    ws: &Worksheet,
    header: &[Value],
    rows: &[Vec<Value>],
) -> Result<()>
where
    B: SheetBackend + ?Sized,
{
    if backend.row_count(ws).await? == 0 {
        backend.append_rows(ws, &[header.to_vec()]).await?;
    }
    backend.append_rows(ws, rows).await?;
    info!(table = %ws.title, rows = rows.len(), "sheets: history appended");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheets::MemorySheets;
    use serde_json::json;

    fn header() -> Vec<Value> {
        vec![json!("a"), json!("b")]
    }

    fn batch(tag: &str, n: usize) -> Vec<Vec<Value>> {
        (0..n).map(|i| vec![json!(tag), json!(i)]).collect()
    }

    #[tokio::test]
    async fn resolve_creates_once() {
        let sheets = MemorySheets::new();
        let first = resolve_table(&sheets, "Current_Overview").await.unwrap();
        let second = resolve_table(&sheets, "Current_Overview").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(sheets.table_titles(), vec!["Current_Overview".to_string()]);
    }

    #[tokio::test]
    async fn overview_never_accumulates() {
        let sheets = MemorySheets::new();
        let ws = resolve_table(&sheets, "O").await.unwrap();
        write_overview(&sheets, &ws, &header(), &batch("run1", 3)).await.unwrap();
        write_overview(&sheets, &ws, &header(), &batch("run2", 3)).await.unwrap();

        let rows = sheets.rows("O").unwrap();
        assert_eq!(rows.len(), 1 + 3);
        assert_eq!(rows[0], header());
        assert!(rows[1..].iter().all(|r| r[0] == json!("run2")));
    }

    #[tokio::test]
    async fn overview_writes_header_even_without_rows() {
        let sheets = MemorySheets::new().with_table("O", batch("old", 2));
        let ws = resolve_table(&sheets, "O").await.unwrap();
        write_overview(&sheets, &ws, &header(), &[]).await.unwrap();
        assert_eq!(sheets.rows("O").unwrap(), vec![header()]);
    }

    #[tokio::test]
    async fn history_is_strictly_additive() {
        let sheets = MemorySheets::new();
        let ws = resolve_table(&sheets, "H").await.unwrap();
        write_history(&sheets, &ws, &header(), &batch("run1", 4)).await.unwrap();
        let after_first = sheets.rows("H").unwrap();

        write_history(&sheets, &ws, &header(), &batch("run2", 4)).await.unwrap();
        let after_second = sheets.rows("H").unwrap();

        assert_eq!(after_second.len(), after_first.len() + 4);
        assert_eq!(after_second[..after_first.len()], after_first[..]);
    }

    #[tokio::test]
    async fn history_header_written_once() {
        let sheets = MemorySheets::new().with_table("H", vec![vec![json!("legacy")]]);
        let ws = resolve_table(&sheets, "H").await.unwrap();
        write_history(&sheets, &ws, &header(), &batch("run", 2)).await.unwrap();

        let rows = sheets.rows("H").unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows.iter().filter(|r| **r == header()).count(), 0);
    }

    #[tokio::test]
    async fn history_with_no_rows_only_adds_header_to_empty_table() {
        let sheets = MemorySheets::new();
        let ws = resolve_table(&sheets, "H").await.unwrap();
        write_history(&sheets, &ws, &header(), &[]).await.unwrap();
        write_history(&sheets, &ws, &header(), &[]).await.unwrap();
        assert_eq!(sheets.rows("H").unwrap(), vec![header()]);
    }
}
