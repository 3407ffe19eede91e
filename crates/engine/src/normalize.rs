// Row normalizer: raw positional rows -> named StepRows

use stainplan_core::{RawRow, RawTable, StepRow};

use crate::error::EngineError;
use crate::layout::{ConcentrationSource, IncubationTimeSource, TableLayout};

/// Normalize a raw table according to `layout`.
///
/// 1. drop `layout.skip_rows` leading rows
/// 2. drop rows whose `required_column` is blank (separator rows)
/// 3. forward-fill the step key (and incubation time when read from a column)
/// 4. project each row onto [`StepRow`]
///
/// Rows that still have no step key after the fill (data above the first key)
/// are dropped with a warning. An empty table yields an empty vector.
pub fn normalize(table: &RawTable, layout: &TableLayout) -> Result<Vec<StepRow>, EngineError> {
    let kept: Vec<RawRow> = table
        .rows()
        .iter()
        .skip(layout.skip_rows)
        .filter(|row| !row.is_missing(layout.required_column))
        .cloned()
        .collect();

    let mut filled = kept;
    for col in layout.fill_columns() {
        forward_fill(&mut filled, col);
    }

    let mut rows = Vec::with_capacity(filled.len());
    for raw in &filled {
        if raw.is_missing(layout.columns.step_key) {
            log::warn!(
                "row {}: no step key above this row, skipping",
                raw.source_row
            );
            continue;
        }
        rows.push(project_row(raw, layout)?);
    }

    log::debug!(
        "normalized {} of {} rows with layout '{}'",
        rows.len(),
        table.len(),
        layout.name
    );
    Ok(rows)
}

/// Carry the last non-missing value of `col` down through missing cells.
pub fn forward_fill(rows: &mut [RawRow], col: usize) {
    let mut last: Option<String> = None;
    for row in rows.iter_mut() {
        match row.get(col) {
            Some(value) => last = Some(value.to_string()),
            None => {
                if let Some(ref value) = last {
                    row.set(col, Some(value.clone()));
                }
            }
        }
    }
}

fn project_row(raw: &RawRow, layout: &TableLayout) -> Result<StepRow, EngineError> {
    let cols = &layout.columns;
    let row = raw.source_row;

    let bleach_cell = raw.get(cols.bleach_time).ok_or(EngineError::MissingValue {
        row,
        field: "bleach time",
        column: cols.bleach_time,
    })?;
    let bleach_time_ms =
        parse_count(bleach_cell).ok_or_else(|| EngineError::InvalidNumber {
            row,
            field: "bleach time",
            column: cols.bleach_time,
            value: bleach_cell.to_string(),
        })?;

    let incubation_time = match layout.incubation_time {
        IncubationTimeSource::Column { column } => raw.get(column).map(str::to_string),
        IncubationTimeSource::Fixed => None,
    };
    let concentration = match layout.concentration {
        ConcentrationSource::RatioColumn { column } => raw.get(column).map(str::to_string),
        ConcentrationSource::Fixed => None,
    };

    Ok(StepRow {
        source_row: row,
        // Presence checked by the caller
        step_key: raw.get(cols.step_key).unwrap_or_default().to_string(),
        marker: raw.get(cols.marker).unwrap_or_default().to_string(),
        dye: raw.get(cols.dye).map(str::to_string),
        bleach_time_ms,
        well: raw.get(cols.well).map(str::to_string),
        concentration,
        incubation_time,
    })
}

/// Parse a non-negative count such as `"1500"` or `"1500.0"`.
///
/// Fractional values truncate toward zero. Returns `None` for negative,
/// non-finite, out-of-range or non-numeric input.
pub fn parse_count(s: &str) -> Option<u32> {
    let s = s.trim();
    if let Ok(n) = s.parse::<u32>() {
        return Some(n);
    }
    let f = s.parse::<f64>().ok()?;
    if !f.is_finite() || f < 0.0 || f > u32::MAX as f64 {
        return None;
    }
    Some(f.trunc() as u32)
}
