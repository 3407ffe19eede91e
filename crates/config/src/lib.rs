// Configuration loading

pub mod paths;
pub mod run_setting;

pub use run_setting::{parse_field_counts, ConfigError, RunSettingStore, RunSettingUpdate};
