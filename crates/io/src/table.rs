// Plan table loading: format dispatch by extension

use std::path::Path;

use stainplan_core::RawTable;

use crate::error::LoadError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    /// Any workbook calamine can open.
    Spreadsheet,
    /// Delimited text; `None` means sniff the delimiter.
    Delimited(Option<u8>),
}

impl TableFormat {
    pub fn from_path(path: &Path) -> Result<Self, LoadError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => Ok(TableFormat::Spreadsheet),
            "csv" | "txt" => Ok(TableFormat::Delimited(None)),
            "tsv" | "tab" => Ok(TableFormat::Delimited(Some(b'\t'))),
            _ => Err(LoadError::UnsupportedFormat { path: path.to_path_buf(), ext }),
        }
    }
}

/// Load a plan table from `path`.
///
/// `sheet` selects a worksheet by name in workbooks and is ignored (with a
/// warning) for delimited files.
pub fn load_table(path: &Path, sheet: Option<&str>) -> Result<RawTable, LoadError> {
    if !path.exists() {
        return Err(LoadError::NotFound(path.to_path_buf()));
    }
    match TableFormat::from_path(path)? {
        TableFormat::Spreadsheet => crate::xlsx::read_sheet(path, sheet),
        TableFormat::Delimited(delimiter) => {
            if let Some(sheet) = sheet {
                log::warn!("ignoring sheet '{}' for delimited file {}", sheet, path.display());
            }
            crate::csv::read_delimited(path, delimiter)
        }
    }
}
