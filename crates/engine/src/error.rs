use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// TOML parse / deserialization error in a layout file.
    #[error("layout parse error: {0}")]
    LayoutParse(String),
    /// Layout validation error (colliding columns, bad preset, etc.).
    #[error("layout validation error: {0}")]
    LayoutValidation(String),
    /// Dye mapping table is not a JSON object of strings.
    #[error("dye mapping parse error: {0}")]
    MapperParse(String),
    /// A required numeric cell is blank.
    #[error("row {row}: missing {field} (column {column})")]
    MissingValue { row: usize, field: &'static str, column: usize },
    /// A numeric cell could not be read as a non-negative number.
    #[error("row {row}: cannot parse {field} '{value}' (column {column})")]
    InvalidNumber { row: usize, field: &'static str, column: usize, value: String },
    /// Step key is not an integer (or integral float).
    #[error("row {row}: step key '{value}' is not a number")]
    InvalidStepKey { row: usize, value: String },
}
