use serde::{Deserialize, Serialize};

/// Image counts for one visual field's z-stack.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VisualFieldConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_count_negative: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_count_positive: Option<u32>,
}

/// Global run parameters that override the template's `runSetting` section.
///
/// Every field is optional: an unset field leaves the template value alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RunSetting {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visual_field_count: Option<u32>,
    pub visual_field_configs: Vec<VisualFieldConfig>,
}

impl RunSetting {
    /// Maximum number of incubation steps to emit.
    ///
    /// A step count of zero means "no ceiling".
    pub fn step_ceiling(&self) -> Option<usize> {
        self.step_count.filter(|&n| n > 0).map(|n| n as usize)
    }

    pub fn is_empty(&self) -> bool {
        self.step_count.is_none()
            && self.visual_field_count.is_none()
            && self.visual_field_configs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_step_count_is_no_ceiling() {
        let rs = RunSetting { step_count: Some(0), ..Default::default() };
        assert_eq!(rs.step_ceiling(), None);
        let rs = RunSetting { step_count: Some(2), ..Default::default() };
        assert_eq!(rs.step_ceiling(), Some(2));
        assert_eq!(RunSetting::default().step_ceiling(), None);
    }

    #[test]
    fn serializes_camel_case_and_skips_unset() {
        let rs = RunSetting {
            step_count: Some(4),
            visual_field_count: None,
            visual_field_configs: vec![VisualFieldConfig {
                image_count_negative: Some(5),
                image_count_positive: None,
            }],
        };
        let json = serde_json::to_string(&rs).unwrap();
        assert_eq!(
            json,
            r#"{"stepCount":4,"visualFieldConfigs":[{"imageCountNegative":5}]}"#
        );
        let back: RunSetting = serde_json::from_str(&json).unwrap();
        assert_eq!(back, rs);
    }
}
