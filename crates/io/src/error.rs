use std::path::PathBuf;

use stainplan_engine::EngineError;
use thiserror::Error;

/// Failure to read a plan table.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("unsupported table format '.{ext}': {}", path.display())]
    UnsupportedFormat { path: PathBuf, ext: String },
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },
    #[error("sheet '{sheet}' not found in {} (available: {available})", path.display())]
    SheetNotFound { path: PathBuf, sheet: String, available: String },
}

/// Failure to parse or serialize an XML document.
#[derive(Debug, Error)]
pub enum XmlError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed XML at byte {position}: {message}")]
    Parse { position: u64, message: String },
    #[error("document has no root element")]
    NoRoot,
    #[error("failed to write XML: {0}")]
    Write(String),
}

/// Failure anywhere in the generate pipeline.
///
/// Every variant names the file involved so the CLI can print a one-line
/// diagnostic.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("template not found: {}", .0.display())]
    TemplateNotFound(PathBuf),
    #[error("dye mapping not found: {}", .0.display())]
    MapperNotFound(PathBuf),
    #[error("template {}: {source}", path.display())]
    Template {
        path: PathBuf,
        #[source]
        source: XmlError,
    },
    #[error("failed to read dye mapping {}: {source}", path.display())]
    MapperRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("dye mapping {}: {source}", path.display())]
    Mapper {
        path: PathBuf,
        #[source]
        source: EngineError,
    },
    #[error(transparent)]
    Table(#[from] LoadError),
    #[error("{}: {source}", path.display())]
    Plan {
        path: PathBuf,
        #[source]
        source: EngineError,
    },
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: XmlError,
    },
}
