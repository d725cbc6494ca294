use anyhow::{bail, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::{Mutex, MutexGuard};

use super::{SheetBackend, Worksheet};

#[derive(Debug)]
struct Table {
    ws: Worksheet,
    rows: Vec<Vec<Value>>,
}

#[derive(Debug, Default)]
struct State {
    next_id: i64,
    tables: Vec<Table>,
}

/// In-process spreadsheet. Backs `--dry-run` and the tests.
#[derive(Debug, Default)]
pub struct MemorySheets {
    state: Mutex<State>,
}

impl MemorySheets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate a table, as if an earlier run had written it.
    pub fn with_table(self, title: &str, rows: Vec<Vec<Value>>) -> Self {
        {
            let mut state = self.lock();
            let sheet_id = state.next_id;
            state.next_id += 1;
            state.tables.push(Table {
                ws: Worksheet {
                    sheet_id,
                    title: title.to_string(),
                },
                rows,
            });
        }
        self
    }

    /// Current contents of a table, or `None` if it does not exist.
    pub fn rows(&self, title: &str) -> Option<Vec<Vec<Value>>> {
        self.lock()
            .tables
            .iter()
            .find(|t| t.ws.title == title)
            .map(|t| t.rows.clone())
    }

    pub fn table_titles(&self) -> Vec<String> {
        self.lock().tables.iter().map(|t| t.ws.title.clone()).collect()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn table_mut<'a>(state: &'a mut State, ws: &Worksheet) -> Result<&'a mut Table> {
        match state.tables.iter_mut().find(|t| t.ws.sheet_id == ws.sheet_id) {
            Some(table) => Ok(table),
            None => bail!("no worksheet with id {} ({})", ws.sheet_id, ws.title),
        }
    }
}

#[async_trait]
impl SheetBackend for MemorySheets {
    async fn find_worksheet(&self, title: &str) -> Result<Option<Worksheet>> {
        let state = self.lock();
        Ok(state
            .tables
            .iter()
            .find(|t| t.ws.title == title)
            .map(|t| t.ws.clone()))
    }

    async fn add_worksheet(&self, title: &str, _rows: u32, _cols: u32) -> Result<Worksheet> {
        let mut state = self.lock();
        if state.tables.iter().any(|t| t.ws.title == title) {
            bail!("a sheet with the name \"{title}\" already exists");
        }
        let ws = Worksheet {
            sheet_id: state.next_id,
            title: title.to_string(),
        };
        state.next_id += 1;
        state.tables.push(Table {
            ws: ws.clone(),
            rows: Vec::new(),
        });
        Ok(ws)
    }

    async fn clear(&self, ws: &Worksheet) -> Result<()> {
        let mut state = self.lock();
        Self::table_mut(&mut state, ws)?.rows.clear();
        Ok(())
    }

    async fn append_rows(&self, ws: &Worksheet, rows: &[Vec<Value>]) -> Result<()> {
        let mut state = self.lock();
        Self::table_mut(&mut state, ws)?
            .rows
            .extend(rows.iter().cloned());
        Ok(())
    }

    async fn row_count(&self, ws: &Worksheet) -> Result<usize> {
        let mut state = self.lock();
        Ok(Self::table_mut(&mut state, ws)?.rows.len())
    }
}
