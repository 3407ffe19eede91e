// Run-setting patcher: overwrite global run parameters in the template

use stainplan_core::{RunSetting, VisualFieldConfig};

use crate::xml::Element;

const RUN_SETTING: &str = "runSetting";
const STEP_COUNT: &str = "stepCount";
const VISUAL_FIELD_COUNT: &str = "visualFieldCount";
const VISUAL_FIELD_CONFIG: &str = "visualFieldConfig";
const STACK: &str = "stack";
const IMAGE_COUNT_NEGATIVE: &str = "imageCountNegative";
const IMAGE_COUNT_POSITIVE: &str = "imageCountPositive";

/// What a patch pass changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PatchReport {
    /// Configured fields whose target element was found and overwritten.
    pub written: usize,
    /// Configured fields with no matching element in the template.
    pub skipped: usize,
}

/// Apply `setting` to the `runSetting` child of `root`.
///
/// Only configured fields are written, and only when the target element
/// exists. The i-th configured visual-field entry patches the i-th
/// `visualFieldConfig` section; sections past the configured list are left
/// alone. Applying the same setting twice yields the same tree.
pub fn apply_run_setting(root: &mut Element, setting: &RunSetting) -> PatchReport {
    let mut report = PatchReport::default();

    let Some(run) = root.child_mut(RUN_SETTING) else {
        log::debug!("template has no <{}>, run setting not applied", RUN_SETTING);
        return report;
    };

    if let Some(n) = setting.step_count {
        set_child_text(run, STEP_COUNT, n, &mut report);
    }
    if let Some(n) = setting.visual_field_count {
        set_child_text(run, VISUAL_FIELD_COUNT, n, &mut report);
    }

    let mut sections = run.children_named_mut(VISUAL_FIELD_CONFIG);
    for (i, config) in setting.visual_field_configs.iter().enumerate() {
        let Some(section) = sections.next() else {
            log::debug!(
                "template has {} <{}> section(s), ignoring configured entry {}",
                i,
                VISUAL_FIELD_CONFIG,
                i + 1
            );
            report.skipped += configured_fields(config);
            continue;
        };
        let Some(stack) = section.child_mut(STACK) else {
            log::debug!("<{}> {} has no <{}>", VISUAL_FIELD_CONFIG, i + 1, STACK);
            report.skipped += configured_fields(config);
            continue;
        };
        if let Some(n) = config.image_count_negative {
            set_child_text(stack, IMAGE_COUNT_NEGATIVE, n, &mut report);
        }
        if let Some(n) = config.image_count_positive {
            set_child_text(stack, IMAGE_COUNT_POSITIVE, n, &mut report);
        }
    }

    log::info!(
        "run setting: {} field(s) written, {} skipped",
        report.written,
        report.skipped
    );
    report
}

/// Read the current run-setting values out of a template.
///
/// Fields that are absent or not a non-negative integer come back as `None`.
pub fn read_run_setting(root: &Element) -> RunSetting {
    let Some(run) = root.child(RUN_SETTING) else {
        return RunSetting::default();
    };
    let number = |parent: &Element, name: &str| {
        parent.child(name).and_then(|e| e.text().trim().parse::<u32>().ok())
    };

    RunSetting {
        step_count: number(run, STEP_COUNT),
        visual_field_count: number(run, VISUAL_FIELD_COUNT),
        visual_field_configs: run
            .children_named(VISUAL_FIELD_CONFIG)
            .map(|section| match section.child(STACK) {
                Some(stack) => VisualFieldConfig {
                    image_count_negative: number(stack, IMAGE_COUNT_NEGATIVE),
                    image_count_positive: number(stack, IMAGE_COUNT_POSITIVE),
                },
                None => VisualFieldConfig::default(),
            })
            .collect(),
    }
}

fn set_child_text(parent: &mut Element, name: &str, value: u32, report: &mut PatchReport) {
    match parent.child_mut(name) {
        Some(target) => {
            target.set_text(value.to_string());
            report.written += 1;
        }
        None => {
            log::debug!("<{}> has no <{}>, skipping", parent.name, name);
            report.skipped += 1;
        }
    }
}

fn configured_fields(config: &VisualFieldConfig) -> usize {
    config.image_count_negative.is_some() as usize + config.image_count_positive.is_some() as usize
}
