use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::range::A1Range;
use super::store::{is_blank, Rows, SheetStore, SheetsError};

/// In-process spreadsheet used for offline development and tests.
///
/// Mirrors the values API closely enough for the services: reads drop
/// trailing empty cells and trailing empty rows, appends land after the last
/// non-blank row, clears blank the cells without shifting anything.
#[derive(Clone, Default)]
pub struct MemoryStore {
    // tab -> grid, grid[0] is sheet row 1
    tabs: Arc<RwLock<HashMap<String, Vec<Vec<String>>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw grid of a tab, row 1 first. Intended for assertions.
    pub async fn snapshot(&self, tab: &str) -> Vec<Vec<String>> {
        self.tabs.read().await.get(tab).cloned().unwrap_or_default()
    }
}

fn set_cell(grid: &mut Vec<Vec<String>>, row: usize, col: usize, value: String) {
    if grid.len() <= row {
        grid.resize_with(row + 1, Vec::new);
    }
    let cells = &mut grid[row];
    if cells.len() <= col {
        cells.resize(col + 1, String::new());
    }
    cells[col] = value;
}

fn trim_trailing(mut cells: Vec<String>) -> Vec<String> {
    while cells.last().map(|c| c.is_empty()).unwrap_or(false) {
        cells.pop();
    }
    cells
}

#[async_trait]
impl SheetStore for MemoryStore {
    async fn read(&self, range: &str) -> Result<Rows, SheetsError> {
        let a1 = A1Range::parse(range)?;
        let tabs = self.tabs.read().await;
        let Some(grid) = tabs.get(&a1.tab) else {
            return Err(SheetsError::Api {
                status: 400,
                message: format!("Unable to parse range: {}", range),
            });
        };

        let first = a1.start_row - 1;
        let last = a1.end_row.map(|r| r.min(grid.len())).unwrap_or(grid.len());

        let mut rows: Rows = (first..last)
            .map(|r| {
                let cells = &grid[r];
                let slice = (a1.start_col..=a1.end_col)
                    .map(|c| cells.get(c).cloned().unwrap_or_default())
                    .collect();
                trim_trailing(slice)
            })
            .collect();

        while rows.last().map(|r| r.is_empty()).unwrap_or(false) {
            rows.pop();
        }
        Ok(rows)
    }

    async fn write(&self, range: &str, rows: Rows) -> Result<(), SheetsError> {
        let a1 = A1Range::parse(range)?;
        let mut tabs = self.tabs.write().await;
        let grid = tabs.entry(a1.tab.clone()).or_default();

        for (i, row) in rows.into_iter().enumerate() {
            for (j, value) in row.into_iter().enumerate() {
                set_cell(grid, a1.start_row - 1 + i, a1.start_col + j, value);
            }
        }
        Ok(())
    }

    async fn append(&self, range: &str, rows: Rows) -> Result<(), SheetsError> {
        let a1 = A1Range::parse(range)?;
        let mut tabs = self.tabs.write().await;
        let grid = tabs.entry(a1.tab.clone()).or_default();

        let last_used = grid
            .iter()
            .rposition(|cells| {
                let end = cells.len().min(a1.end_col + 1);
                a1.start_col < end && !is_blank(&cells[a1.start_col..end])
            })
            .map(|idx| idx + 1)
            .unwrap_or(0);
        let start = last_used.max(a1.start_row - 1);

        for (i, row) in rows.into_iter().enumerate() {
            for (j, value) in row.into_iter().enumerate() {
                set_cell(grid, start + i, a1.start_col + j, value);
            }
        }
        Ok(())
    }

    async fn clear(&self, range: &str) -> Result<(), SheetsError> {
        let a1 = A1Range::parse(range)?;
        let mut tabs = self.tabs.write().await;
        if let Some(grid) = tabs.get_mut(&a1.tab) {
            let first = a1.start_row - 1;
            let last = a1.end_row.map(|r| r.min(grid.len())).unwrap_or(grid.len());
            for cells in grid.iter_mut().take(last).skip(first) {
                for c in a1.start_col..=a1.end_col {
                    if let Some(cell) = cells.get_mut(c) {
                        cell.clear();
                    }
                }
            }
        }
        Ok(())
    }

    async fn ping(&self) -> Result<(), SheetsError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[tokio::test]
    async fn append_lands_after_last_used_row() {
        let store = MemoryStore::new();
        store.write("Tab!A1:C1", vec![row(&["a", "b", "c"])]).await.unwrap();
        store.append("Tab!A2:C", vec![row(&["1", "2", "3"])]).await.unwrap();
        store.append("Tab!A2:C", vec![row(&["4", "5", "6"])]).await.unwrap();

        let rows = store.read("Tab!A2:C").await.unwrap();
        assert_eq!(rows, vec![row(&["1", "2", "3"]), row(&["4", "5", "6"])]);
    }

    #[tokio::test]
    async fn cleared_rows_read_back_empty_and_trailing_rows_are_dropped() {
        let store = MemoryStore::new();
        store
            .append("Tab!A2:B", vec![row(&["1", "x"]), row(&["2", "y"]), row(&["3", "z"])])
            .await
            .unwrap();

        store.clear("Tab!A3:B3").await.unwrap();
        let rows = store.read("Tab!A2:B").await.unwrap();
        assert_eq!(rows, vec![row(&["1", "x"]), vec![], row(&["3", "z"])]);

        store.clear("Tab!A4:B4").await.unwrap();
        let rows = store.read("Tab!A2:B").await.unwrap();
        assert_eq!(rows, vec![row(&["1", "x"])]);
    }

    #[tokio::test]
    async fn reads_drop_trailing_empty_cells() {
        let store = MemoryStore::new();
        store.write("Tab!A2:C2", vec![row(&["1", "", ""])]).await.unwrap();
        assert_eq!(store.read("Tab!A2:C").await.unwrap(), vec![row(&["1"])]);
    }

    #[tokio::test]
    async fn unknown_tab_is_an_api_error() {
        let store = MemoryStore::new();
        let err = store.read("Missing!A2:C").await.unwrap_err();
        assert!(matches!(err, SheetsError::Api { status: 400, .. }));
    }
}
