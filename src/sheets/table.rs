use std::marker::PhantomData;
use std::sync::Arc;

use tracing::warn;

use super::range::{sheet_row, CellRange};
use super::store::{is_blank, SheetStore, SheetsError};

/// A record type stored one-per-row in a tab.
pub trait SheetRow: Sized {
    /// Column headers, in sheet order. Their count fixes the range width.
    const COLUMNS: &'static [&'static str];

    fn from_cells(cells: &[String]) -> Result<Self, String>;

    fn to_cells(&self) -> Vec<String>;
}

/// A decoded record and the absolute sheet row it was read from.
#[derive(Debug, Clone)]
pub struct Located<T> {
    pub row: usize,
    pub record: T,
}

/// Repository over one tab. Every call fetches the range fresh and scans it
/// linearly; row numbers are only valid until the next write.
pub struct Table<T> {
    range: CellRange,
    store: Arc<dyn SheetStore>,
    _phantom: PhantomData<T>,
}

impl<T> Clone for Table<T> {
    fn clone(&self) -> Self {
        Self {
            range: self.range.clone(),
            store: self.store.clone(),
            _phantom: PhantomData,
        }
    }
}

impl<T: SheetRow> Table<T> {
    pub fn new(tab: impl Into<String>, store: Arc<dyn SheetStore>) -> Self {
        Self {
            range: CellRange::new(tab, T::COLUMNS.len()),
            store,
            _phantom: PhantomData,
        }
    }

    pub fn tab(&self) -> &str {
        self.range.tab()
    }

    /// Every non-blank row that decodes. Rows that fail to decode are logged
    /// and skipped.
    pub async fn all(&self) -> Result<Vec<Located<T>>, SheetsError> {
        let rows = self.store.read(&self.range.data()).await?;

        let mut records = Vec::with_capacity(rows.len());
        for (index, cells) in rows.iter().enumerate() {
            if is_blank(cells) {
                continue;
            }
            let row = sheet_row(index);
            match T::from_cells(cells) {
                Ok(record) => records.push(Located { row, record }),
                Err(reason) => {
                    let err = SheetsError::MalformedRow {
                        range: self.range.tab().to_string(),
                        row,
                        reason,
                    };
                    warn!("Skipping row: {}", err);
                }
            }
        }
        Ok(records)
    }

    pub async fn find<P>(&self, mut predicate: P) -> Result<Option<Located<T>>, SheetsError>
    where
        P: FnMut(&T) -> bool,
    {
        Ok(self.all().await?.into_iter().find(|located| predicate(&located.record)))
    }

    pub async fn insert(&self, record: &T) -> Result<(), SheetsError> {
        self.store.append(&self.range.data(), vec![record.to_cells()]).await
    }

    pub async fn insert_many(&self, records: &[T]) -> Result<(), SheetsError> {
        if records.is_empty() {
            return Ok(());
        }
        let rows = records.iter().map(T::to_cells).collect();
        self.store.append(&self.range.data(), rows).await
    }

    pub async fn update(&self, row: usize, record: &T) -> Result<(), SheetsError> {
        self.store.write(&self.range.row(row), vec![record.to_cells()]).await
    }

    /// Blanks the row. Scans skip blank rows, so the record disappears without
    /// shifting the rows below it.
    pub async fn delete(&self, row: usize) -> Result<(), SheetsError> {
        self.store.clear(&self.range.row(row)).await
    }

    /// Writes the header row when row 1 does not already hold it. Returns
    /// whether anything was written.
    pub async fn ensure_header(&self) -> Result<bool, SheetsError> {
        let expected: Vec<String> = T::COLUMNS.iter().map(|c| c.to_string()).collect();

        let current = match self.store.read(&self.range.header()).await {
            Ok(rows) => rows.into_iter().next().unwrap_or_default(),
            // A missing tab reads as an error on both backends
            Err(SheetsError::Api { status: 400, .. }) => Vec::new(),
            Err(e) => return Err(e),
        };
        if current == expected {
            return Ok(false);
        }

        self.store.write(&self.range.header(), vec![expected]).await?;
        Ok(true)
    }
}
