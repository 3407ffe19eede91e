// File I/O operations

pub mod csv;
pub mod error;
pub mod patch;
pub mod pipeline;
pub mod render;
pub mod table;
pub mod xlsx;
pub mod xml;

pub use error::{GenerateError, LoadError, XmlError};
pub use patch::{apply_run_setting, read_run_setting, PatchReport};
pub use pipeline::{default_output_path, generate, prepare, GenerateReport, GenerateRequest, Prepared};
pub use table::{load_table, TableFormat};
pub use xml::{Document, Element, Node};

/// Namespace of the instrument schema (default namespace of the template root).
pub const INSTRUMENT_NS: &str = "http://www.meltec.de/2004/xschema";

/// Namespace bound to the `xlink` prefix for link attributes.
pub const XLINK_NS: &str = "http://www.w3.org/1999/xlink";
