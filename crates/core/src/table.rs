// Positional table as read from a spreadsheet or CSV file

/// One source row. Cells are addressed by zero-based column index.
///
/// Cell text is trimmed on construction and blank cells are stored as `None`,
/// so "missing" has a single representation regardless of the source format.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawRow {
    /// 1-based row number in the source sheet (for diagnostics).
    pub source_row: usize,
    cells: Vec<Option<String>>,
}

impl RawRow {
    pub fn new<I, S>(source_row: usize, cells: I) -> Self
    where
        I: IntoIterator<Item = Option<S>>,
        S: AsRef<str>,
    {
        let cells = cells
            .into_iter()
            .map(|cell| cell.and_then(|s| clean_cell(s.as_ref())))
            .collect();
        Self { source_row, cells }
    }

    /// Build a row from plain strings; empty strings become missing cells.
    pub fn from_strs(source_row: usize, cells: &[&str]) -> Self {
        Self::new(source_row, cells.iter().map(|s| Some(*s)))
    }

    /// Cell text at `col`, or `None` when the cell is blank or past the row end.
    pub fn get(&self, col: usize) -> Option<&str> {
        self.cells.get(col).and_then(|c| c.as_deref())
    }

    pub fn is_missing(&self, col: usize) -> bool {
        self.get(col).is_none()
    }

    /// Overwrite a cell, growing the row if needed.
    pub fn set(&mut self, col: usize, value: Option<String>) {
        if col >= self.cells.len() {
            self.cells.resize(col + 1, None);
        }
        self.cells[col] = value.and_then(|s| clean_cell(&s));
    }

    pub fn width(&self) -> usize {
        self.cells.len()
    }

    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(Option::is_none)
    }
}

fn clean_cell(s: &str) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// A whole sheet in source order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawTable {
    rows: Vec<RawRow>,
}

impl RawTable {
    pub fn new(rows: Vec<RawRow>) -> Self {
        Self { rows }
    }

    /// Convenience constructor numbering rows from 1.
    pub fn from_rows(rows: &[&[&str]]) -> Self {
        Self {
            rows: rows
                .iter()
                .enumerate()
                .map(|(i, cells)| RawRow::from_strs(i + 1, cells))
                .collect(),
        }
    }

    pub fn rows(&self) -> &[RawRow] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<RawRow> {
        self.rows
    }

    pub fn push(&mut self, row: RawRow) {
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Widest row, in columns.
    pub fn width(&self) -> usize {
        self.rows.iter().map(RawRow::width).max().unwrap_or(0)
    }
}
