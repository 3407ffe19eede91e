// Persisted run setting
// Loaded from ~/.config/stainplan/runsetting.json

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use stainplan_core::{RunSetting, VisualFieldConfig};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode run setting: {0}")]
    Encode(#[from] serde_json::Error),
}

/// The run-setting record on disk.
///
/// Reads are forgiving: a missing file, unreadable JSON or a wrongly typed
/// field never fails, it only drops what cannot be used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSettingStore {
    path: PathBuf,
}

impl RunSettingStore {
    /// Store at the default location.
    pub fn new() -> Self {
        Self::at(crate::paths::default_run_setting_path())
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Load the record, or `None` when there is nothing usable on disk.
    ///
    /// `None` means "apply no overrides", which differs from an empty record
    /// only in logging.
    pub fn load_optional(&self) -> Option<RunSetting> {
        if !self.path.exists() {
            log::debug!("no run setting at {}", self.path.display());
            return None;
        }

        let contents = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) => {
                log::warn!("cannot read {}: {}, ignoring run setting", self.path.display(), e);
                return None;
            }
        };

        // Strip comments (lines starting with //)
        let cleaned: String = contents
            .lines()
            .filter(|line| !line.trim().starts_with("//"))
            .collect::<Vec<_>>()
            .join("\n");

        match serde_json::from_str::<Value>(&cleaned) {
            Ok(Value::Object(obj)) => Some(from_object(&obj, &self.path)),
            Ok(_) => {
                log::warn!("{} is not a JSON object, ignoring run setting", self.path.display());
                None
            }
            Err(e) => {
                log::warn!("error parsing {}: {}, ignoring run setting", self.path.display(), e);
                None
            }
        }
    }

    /// Load the record, falling back to an empty one.
    pub fn load(&self) -> RunSetting {
        self.load_optional().unwrap_or_default()
    }

    /// Save as pretty JSON, creating the parent directory.
    pub fn save(&self, setting: &RunSetting) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|source| self.io_err(source))?;
            }
        }
        let mut json = serde_json::to_string_pretty(setting)?;
        json.push('\n');
        fs::write(&self.path, json).map_err(|source| self.io_err(source))?;
        log::info!("saved run setting to {}", self.path.display());
        Ok(())
    }

    /// Delete the record. Returns whether a file was removed.
    pub fn reset(&self) -> Result<bool, ConfigError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(self.io_err(source)),
        }
    }

    fn io_err(&self, source: std::io::Error) -> ConfigError {
        ConfigError::Io { path: self.path.clone(), source }
    }
}

impl Default for RunSettingStore {
    fn default() -> Self {
        Self::new()
    }
}

fn from_object(obj: &Map<String, Value>, path: &Path) -> RunSetting {
    let visual_field_configs = match obj.get("visualFieldConfigs") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(i, item)| match item {
                Value::Object(cfg) => VisualFieldConfig {
                    image_count_negative: count(cfg, "imageCountNegative", path),
                    image_count_positive: count(cfg, "imageCountPositive", path),
                },
                _ => {
                    log::warn!("{}: visualFieldConfigs[{}] is not an object, ignoring it", path.display(), i);
                    VisualFieldConfig::default()
                }
            })
            .collect(),
        Some(other) => {
            log::warn!("{}: visualFieldConfigs must be a list, got {}", path.display(), other);
            Vec::new()
        }
    };

    RunSetting {
        step_count: count(obj, "stepCount", path),
        visual_field_count: count(obj, "visualFieldCount", path),
        visual_field_configs,
    }
}

/// A non-negative integer field. Integral floats (`3.0`) and numeric strings
/// (`"3"`) are accepted since hand-edited records contain both.
fn count(obj: &Map<String, Value>, key: &str, path: &Path) -> Option<u32> {
    let value = obj.get(key)?;
    let parsed = match value {
        Value::Null => return None,
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0 && *f >= 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    match parsed.and_then(|n| u32::try_from(n).ok()) {
        Some(n) => Some(n),
        None => {
            log::warn!("{}: ignoring {} = {}", path.display(), key, value);
            None
        }
    }
}

/// Field-wise edit of a stored record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSettingUpdate {
    pub step_count: Option<u32>,
    pub visual_field_count: Option<u32>,
    /// Replaces the whole list when set.
    pub visual_field_configs: Option<Vec<VisualFieldConfig>>,
}

impl RunSettingUpdate {
    pub fn is_empty(&self) -> bool {
        self.step_count.is_none()
            && self.visual_field_count.is_none()
            && self.visual_field_configs.is_none()
    }

    pub fn apply(self, setting: &mut RunSetting) {
        if let Some(n) = self.step_count {
            setting.step_count = Some(n);
        }
        if let Some(n) = self.visual_field_count {
            setting.visual_field_count = Some(n);
        }
        if let Some(configs) = self.visual_field_configs {
            setting.visual_field_configs = configs;
        }
    }
}

/// Parse `NEG:POS` image counts for one visual field.
///
/// Either side may be left empty to leave that count unset (`"5:"`, `":8"`).
pub fn parse_field_counts(s: &str) -> Result<VisualFieldConfig, String> {
    let (neg, pos) = s
        .split_once(':')
        .ok_or_else(|| format!("expected NEG:POS, got '{}'", s))?;
    let side = |v: &str, what: &str| -> Result<Option<u32>, String> {
        let v = v.trim();
        if v.is_empty() {
            return Ok(None);
        }
        v.parse::<u32>()
            .map(Some)
            .map_err(|_| format!("{} image count '{}' is not a non-negative integer", what, v))
    };
    Ok(VisualFieldConfig {
        image_count_negative: side(neg, "negative")?,
        image_count_positive: side(pos, "positive")?,
    })
}
