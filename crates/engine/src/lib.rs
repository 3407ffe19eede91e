//! `stainplan-engine`: turns a positional plan table into incubation steps.
//!
//! Pure engine crate: receives a pre-loaded table, returns built steps.
//! No file IO or XML.

pub mod builder;
pub mod defaults;
pub mod dye_map;
pub mod engine;
pub mod error;
pub mod group;
pub mod layout;
pub mod lookahead;
pub mod normalize;

pub use defaults::InstrumentDefaults;
pub use dye_map::DyeFilterMap;
pub use engine::{run, Plan};
pub use error::EngineError;
pub use layout::{ColumnMap, ConcentrationSource, IncubationTimeSource, LayoutPreset, TableLayout};
