use async_trait::async_trait;
use thiserror::Error;

/// Errors from the spreadsheet store
#[derive(Debug, Error)]
pub enum SheetsError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Sheets API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Invalid range: {0}")]
    InvalidRange(String),

    #[error("Malformed row {row} in {range}: {reason}")]
    MalformedRow {
        range: String,
        row: usize,
        reason: String,
    },

    #[error("Failed to decode response: {0}")]
    Decode(String),
}

/// Rows of cell strings as the values API returns them. Rows may be ragged:
/// trailing empty cells are omitted.
pub type Rows = Vec<Vec<String>>;

/// Cell-range level access to a spreadsheet.
///
/// Every method takes an A1-notation range such as `Products!A2:F`.
#[async_trait]
pub trait SheetStore: Send + Sync {
    async fn read(&self, range: &str) -> Result<Rows, SheetsError>;

    async fn write(&self, range: &str, rows: Rows) -> Result<(), SheetsError>;

    /// Appends after the last non-empty row of the table found in `range`.
    async fn append(&self, range: &str, rows: Rows) -> Result<(), SheetsError>;

    async fn clear(&self, range: &str) -> Result<(), SheetsError>;

    async fn ping(&self) -> Result<(), SheetsError>;
}

pub fn is_blank(row: &[String]) -> bool {
    row.iter().all(|cell| cell.trim().is_empty())
}
