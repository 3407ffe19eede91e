use serde::Deserialize;

use crate::defaults::InstrumentDefaults;
use crate::error::EngineError;

// ---------------------------------------------------------------------------
// Top-level layout
// ---------------------------------------------------------------------------

/// Declares where each logical field lives in a plan sheet.
///
/// Plan spreadsheets are positional: the layout is the one place that maps
/// column indices (zero-based) to field names. It is validated once at load
/// time; the normalizer then reads fields by name only.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TableLayout {
    #[serde(default = "default_name")]
    pub name: String,
    /// Sheet to read; `None` reads the first sheet.
    #[serde(default)]
    pub sheet: Option<String>,
    /// Leading rows to drop (header rows, unit rows).
    #[serde(default)]
    pub skip_rows: usize,
    /// Rows with a blank cell in this column are separator rows and dropped.
    pub required_column: usize,
    pub columns: ColumnMap,
    #[serde(default)]
    pub incubation_time: IncubationTimeSource,
    #[serde(default)]
    pub concentration: ConcentrationSource,
    #[serde(default)]
    pub instrument: InstrumentDefaults,
}

fn default_name() -> String {
    "custom".to_string()
}

// ---------------------------------------------------------------------------
// Column mapping
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ColumnMap {
    pub step_key: usize,
    pub marker: usize,
    pub dye: usize,
    pub well: usize,
    pub bleach_time: usize,
}

// ---------------------------------------------------------------------------
// Field sources
// ---------------------------------------------------------------------------

/// Where a step's incubation time comes from.
///
/// Plan revisions disagree: older sheets run every step for the instrument
/// default, newer ones carry a per-step time column. The choice is explicit
/// per layout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum IncubationTimeSource {
    /// Use `instrument.incubation_time` for every step.
    #[default]
    Fixed,
    /// Read the first row of each group; the column is forward-filled.
    Column { column: usize },
}

/// Where a stain entry's marker concentration comes from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum ConcentrationSource {
    /// Use `instrument.concentration_placeholder` for every entry.
    #[default]
    Fixed,
    /// Read a dilution denominator from the row and render it as `1:{value}`.
    RatioColumn { column: usize },
}

// ---------------------------------------------------------------------------
// Presets
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutPreset {
    /// One sheet, header plus two description rows, fixed incubation time.
    SingleSheet,
    /// Named plan sheet with two header rows, per-step incubation time and
    /// per-row dilution.
    MultiSheet,
}

impl LayoutPreset {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "single-sheet" => Some(Self::SingleSheet),
            "multi-sheet" => Some(Self::MultiSheet),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::SingleSheet => "single-sheet",
            Self::MultiSheet => "multi-sheet",
        }
    }

    pub fn layout(&self) -> TableLayout {
        match self {
            Self::SingleSheet => TableLayout::single_sheet(),
            Self::MultiSheet => TableLayout::multi_sheet(),
        }
    }
}

impl std::fmt::Display for LayoutPreset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl TableLayout {
    pub fn single_sheet() -> Self {
        Self {
            name: LayoutPreset::SingleSheet.name().to_string(),
            sheet: None,
            skip_rows: 3,
            required_column: 1,
            columns: ColumnMap {
                step_key: 0,
                marker: 1,
                dye: 2,
                well: 5,
                bleach_time: 12,
            },
            incubation_time: IncubationTimeSource::Fixed,
            concentration: ConcentrationSource::Fixed,
            instrument: InstrumentDefaults::default(),
        }
    }

    pub fn multi_sheet() -> Self {
        Self {
            name: LayoutPreset::MultiSheet.name().to_string(),
            sheet: None,
            skip_rows: 2,
            required_column: 1,
            columns: ColumnMap {
                step_key: 0,
                marker: 1,
                dye: 2,
                well: 5,
                bleach_time: 12,
            },
            incubation_time: IncubationTimeSource::Column { column: 3 },
            concentration: ConcentrationSource::RatioColumn { column: 6 },
            instrument: InstrumentDefaults::default(),
        }
    }

    /// Columns that are forward-filled before grouping.
    pub fn fill_columns(&self) -> Vec<usize> {
        let mut cols = vec![self.columns.step_key];
        if let IncubationTimeSource::Column { column } = self.incubation_time {
            cols.push(column);
        }
        cols
    }

    // -----------------------------------------------------------------------
    // Parse + Validate
    // -----------------------------------------------------------------------

    pub fn from_toml(input: &str) -> Result<Self, EngineError> {
        let layout: TableLayout =
            toml::from_str(input).map_err(|e| EngineError::LayoutParse(e.to_string()))?;
        layout.validate()?;
        Ok(layout)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        let c = &self.columns;

        // The three identity columns must be distinct
        let identity = [("step_key", c.step_key), ("marker", c.marker), ("dye", c.dye)];
        for (i, (a_name, a)) in identity.iter().enumerate() {
            for (b_name, b) in &identity[i + 1..] {
                if a == b {
                    return Err(EngineError::LayoutValidation(format!(
                        "columns.{a_name} and columns.{b_name} both use column {a}"
                    )));
                }
            }
        }

        if let IncubationTimeSource::Column { column } = self.incubation_time {
            if column == c.step_key {
                return Err(EngineError::LayoutValidation(format!(
                    "incubation_time column {column} collides with columns.step_key"
                )));
            }
        }

        if let ConcentrationSource::RatioColumn { column } = self.concentration {
            if column == c.step_key || column == c.dye {
                return Err(EngineError::LayoutValidation(format!(
                    "concentration column {column} collides with an identity column"
                )));
            }
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
