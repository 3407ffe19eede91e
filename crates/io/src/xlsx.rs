// Excel / ODS plan tables (xlsx, xlsm, xls, xlsb, ods)

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader, Sheets};
use stainplan_core::{RawRow, RawTable};

use crate::error::LoadError;

/// Read one worksheet into a positional table.
///
/// `sheet = None` reads the first sheet. Rows are numbered as in the
/// spreadsheet (row 1 = first sheet row), so a used range that starts below
/// A1 is padded with blank rows and columns to keep positions absolute.
pub fn read_sheet(path: &Path, sheet: Option<&str>) -> Result<RawTable, LoadError> {
    if !path.exists() {
        return Err(LoadError::NotFound(path.to_path_buf()));
    }

    let parse_err = |message: String| LoadError::Parse { path: path.to_path_buf(), message };

    let mut workbook: Sheets<_> = open_workbook_auto(path)
        .map_err(|e| parse_err(format!("failed to open workbook: {}", e)))?;

    let sheet_names: Vec<String> = workbook.sheet_names().to_vec();
    let name = match sheet {
        Some(wanted) => sheet_names
            .iter()
            .find(|n| n.as_str() == wanted)
            .cloned()
            .ok_or_else(|| LoadError::SheetNotFound {
                path: path.to_path_buf(),
                sheet: wanted.to_string(),
                available: sheet_names.join(", "),
            })?,
        None => sheet_names
            .first()
            .cloned()
            .ok_or_else(|| parse_err("workbook contains no sheets".to_string()))?,
    };

    let range = workbook
        .worksheet_range(&name)
        .map_err(|e| parse_err(format!("failed to read sheet '{}': {}", name, e)))?;

    let mut table = RawTable::default();
    let (height, width) = range.get_size();
    if height == 0 || width == 0 {
        log::warn!("sheet '{}' in {} is empty", name, path.display());
        return Ok(table);
    }

    // Range start offset (data may not begin at A1)
    let (start_row, start_col) = range.start().unwrap_or((0, 0));
    let (start_row, start_col) = (start_row as usize, start_col as usize);

    for row_idx in 0..start_row {
        table.push(RawRow::new(row_idx + 1, std::iter::empty::<Option<String>>()));
    }
    for (row_idx, row) in range.rows().enumerate() {
        let cells = std::iter::repeat(None)
            .take(start_col)
            .chain(row.iter().map(cell_text));
        table.push(RawRow::new(start_row + row_idx + 1, cells));
    }

    log::debug!(
        "read {} row(s) from sheet '{}' of {}",
        table.len(),
        name,
        path.display()
    );
    Ok(table)
}

/// Cell text as the plan reader sees it.
///
/// Integral floats lose their decimal part (`3.0` -> `"3"`) so step keys and
/// times read the same whether the sheet stored them as numbers or text.
fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty => None,
        Data::String(s) => Some(s.clone()),
        Data::Float(n) => Some(format_number(*n)),
        Data::Int(n) => Some(n.to_string()),
        Data::Bool(b) => Some(if *b { "TRUE" } else { "FALSE" }.to_string()),
        Data::Error(e) => Some(format!("#{:?}", e)),
        // Serial number; plan sheets have no date columns
        Data::DateTime(dt) => Some(format_number(dt.as_f64())),
        Data::DateTimeIso(s) => Some(s.clone()),
        Data::DurationIso(s) => Some(s.clone()),
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_xlsxwriter::Workbook;
    use tempfile::tempdir;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(3.0), "3");
        assert_eq!(format_number(1500.0), "1500");
        assert_eq!(format_number(2.5), "2.5");
        assert_eq!(format_number(-4.0), "-4");
    }

    #[test]
    fn test_read_first_sheet_with_numbers() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("plan.xlsx");

        let mut wb = Workbook::new();
        let ws = wb.add_worksheet();
        ws.write_string(0, 0, "Step").unwrap();
        ws.write_string(0, 1, "Marker").unwrap();
        ws.write_number(1, 0, 1.0).unwrap();
        ws.write_string(1, 1, "CD3").unwrap();
        ws.write_number(1, 2, 1500.0).unwrap();
        ws.write_string(2, 1, "CD4").unwrap();
        wb.save(&path).unwrap();

        let table = read_sheet(&path, None).unwrap();
        assert_eq!(table.len(), 3);
        let rows = table.rows();
        assert_eq!(rows[1].get(0), Some("1"));
        assert_eq!(rows[1].get(2), Some("1500"));
        assert_eq!(rows[2].get(0), None);
        assert_eq!(rows[2].source_row, 3);
    }

    #[test]
    fn test_named_sheet_and_offset_range() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("plan.xlsx");

        let mut wb = Workbook::new();
        wb.add_worksheet().set_name("Notes").unwrap();
        let ws = wb.add_worksheet();
        ws.set_name("Plan").unwrap();
        // Data starts at C3
        ws.write_string(2, 2, "x").unwrap();
        ws.write_string(3, 3, "y").unwrap();
        wb.save(&path).unwrap();

        let table = read_sheet(&path, Some("Plan")).unwrap();
        let rows = table.rows();
        assert_eq!(rows[2].source_row, 3);
        assert_eq!(rows[2].get(2), Some("x"));
        assert_eq!(rows[3].get(3), Some("y"));
        assert!(rows[0].is_blank());
    }

    #[test]
    fn test_unknown_sheet_lists_available() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("plan.xlsx");

        let mut wb = Workbook::new();
        wb.add_worksheet().set_name("Plan").unwrap();
        wb.save(&path).unwrap();

        let err = read_sheet(&path, Some("Missing")).unwrap_err();
        match err {
            LoadError::SheetNotFound { available, .. } => assert_eq!(available, "Plan"),
            other => panic!("unexpected error: {}", other),
        }
    }
}
