use std::collections::HashMap;

use serde::Deserialize;

use crate::error::EngineError;

/// Dye → filter lookup.
///
/// Fluorescence and bleach filters are resolved independently even though the
/// stock table maps both to the same filter. A JSON entry is either a filter
/// name (used for both) or an object with separate names:
///
/// ```json
/// { "FITC": "GFP", "Cy5": { "fluorescence": "Cy5", "bleach": "Cy5-HQ" }, "DAPI": null }
/// ```
///
/// `null` entries are treated as unmapped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DyeFilterMap {
    fluorescence: HashMap<String, String>,
    bleach: HashMap<String, String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FilterEntry {
    Same(String),
    Split {
        fluorescence: Option<String>,
        #[serde(default)]
        bleach: Option<String>,
    },
}

impl DyeFilterMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(input: &str) -> Result<Self, EngineError> {
        let raw: HashMap<String, Option<FilterEntry>> =
            serde_json::from_str(input).map_err(|e| EngineError::MapperParse(e.to_string()))?;

        let mut map = Self::new();
        for (dye, entry) in raw {
            let dye = dye.trim().to_string();
            match entry {
                Some(FilterEntry::Same(filter)) => map.insert(dye, filter),
                Some(FilterEntry::Split { fluorescence, bleach }) => {
                    // A split entry without a bleach filter bleaches through
                    // the fluorescence filter.
                    let bleach = bleach.or_else(|| fluorescence.clone());
                    if let Some(f) = fluorescence {
                        map.fluorescence.insert(dye.clone(), f);
                    }
                    if let Some(b) = bleach {
                        map.bleach.insert(dye, b);
                    }
                }
                None => {}
            }
        }
        Ok(map)
    }

    /// Map `dye` to `filter` for both lookups.
    pub fn insert(&mut self, dye: impl Into<String>, filter: impl Into<String>) {
        let dye = dye.into();
        let filter = filter.into();
        self.bleach.insert(dye.clone(), filter.clone());
        self.fluorescence.insert(dye, filter);
    }

    /// Returns `None` for unmapped dyes.
    pub fn fluorescence_filter(&self, dye: &str) -> Option<&str> {
        self.fluorescence.get(dye.trim()).map(String::as_str)
    }

    /// Returns `None` for unmapped dyes.
    pub fn bleach_filter(&self, dye: &str) -> Option<&str> {
        self.bleach.get(dye.trim()).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fluorescence.len().max(self.bleach.len())
    }

    pub fn is_empty(&self) -> bool {
        self.fluorescence.is_empty() && self.bleach.is_empty()
    }
}
