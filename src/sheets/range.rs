use super::store::SheetsError;

/// First sheet row holding data; row 1 is the header.
pub const FIRST_DATA_ROW: usize = 2;

/// A1-notation range builder for one tab.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellRange {
    tab: String,
    width: usize,
}

impl CellRange {
    pub fn new(tab: impl Into<String>, width: usize) -> Self {
        Self {
            tab: tab.into(),
            width: width.max(1),
        }
    }

    pub fn tab(&self) -> &str {
        &self.tab
    }

    pub fn width(&self) -> usize {
        self.width
    }

    fn last_column(&self) -> String {
        column_letter(self.width - 1)
    }

    /// Every data row, open-ended: `Tab!A2:F`
    pub fn data(&self) -> String {
        format!("{}!A{}:{}", self.quoted_tab(), FIRST_DATA_ROW, self.last_column())
    }

    /// One absolute sheet row: `Tab!A7:F7`
    pub fn row(&self, sheet_row: usize) -> String {
        format!("{}!A{}:{}{}", self.quoted_tab(), sheet_row, self.last_column(), sheet_row)
    }

    pub fn header(&self) -> String {
        self.row(1)
    }

    /// Tab names with spaces or punctuation must be single-quoted in A1 notation.
    fn quoted_tab(&self) -> String {
        if self.tab.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            self.tab.clone()
        } else {
            format!("'{}'", self.tab.replace('\'', "''"))
        }
    }
}

/// Converts a 0-based data index (position within `data()`) to a sheet row.
pub fn sheet_row(index: usize) -> usize {
    index + FIRST_DATA_ROW
}

/// 0-based column index to letters: 0 → A, 25 → Z, 26 → AA.
pub fn column_letter(index: usize) -> String {
    let mut n = index + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push((b'A' + rem as u8) as char);
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// Letters to 0-based column index: A → 0, AA → 26.
pub fn column_index(letters: &str) -> Option<usize> {
    if letters.is_empty() || !letters.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let mut n = 0usize;
    for c in letters.chars() {
        let digit = (c.to_ascii_uppercase() as u8 - b'A') as usize + 1;
        n = n.checked_mul(26)?.checked_add(digit)?;
    }
    Some(n - 1)
}

/// A parsed A1 range. Row bounds are 1-based; `end_row` is `None` for
/// open-ended ranges like `A2:F`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct A1Range {
    pub tab: String,
    pub start_col: usize,
    pub start_row: usize,
    pub end_col: usize,
    pub end_row: Option<usize>,
}

impl A1Range {
    pub fn parse(range: &str) -> Result<Self, SheetsError> {
        let invalid = || SheetsError::InvalidRange(range.to_string());

        let (tab, cells) = range.rsplit_once('!').ok_or_else(invalid)?;
        let tab = match tab.strip_prefix('\'').and_then(|t| t.strip_suffix('\'')) {
            Some(quoted) => quoted.replace("''", "'"),
            None => tab.to_string(),
        };
        if tab.is_empty() {
            return Err(invalid());
        }

        let (start, end) = cells.split_once(':').unwrap_or((cells, cells));
        let (start_col, start_row) = split_cell(start).ok_or_else(invalid)?;
        let (end_col, end_row) = split_cell(end).ok_or_else(invalid)?;

        Ok(Self {
            tab,
            start_col,
            start_row: start_row.unwrap_or(1),
            end_col,
            end_row,
        })
    }

    pub fn width(&self) -> usize {
        self.end_col.saturating_sub(self.start_col) + 1
    }
}

fn split_cell(cell: &str) -> Option<(usize, Option<usize>)> {
    let split = cell.find(|c: char| c.is_ascii_digit()).unwrap_or(cell.len());
    let (letters, digits) = cell.split_at(split);
    let col = column_index(letters)?;
    let row = if digits.is_empty() {
        None
    } else {
        Some(digits.parse::<usize>().ok().filter(|r| *r > 0)?)
    };
    Some((col, row))
}
