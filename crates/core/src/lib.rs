//! `stainplan-core`: shared data model.
//!
//! Plain types passed between the stages of the generator. No IO, no logic
//! beyond small accessors.

pub mod run_setting;
pub mod step;
pub mod table;

pub use run_setting::{RunSetting, VisualFieldConfig};
pub use step::{ChannelKind, ChannelStep, IncubationStep, StepGroup, StepRow, Well};
pub use table::{RawRow, RawTable};
