use stainplan_core::{IncubationStep, RawTable};

use crate::builder::build_steps;
use crate::dye_map::DyeFilterMap;
use crate::error::EngineError;
use crate::group::{group_rows, truncate_groups};
use crate::layout::TableLayout;
use crate::normalize::normalize;

/// Built incubation steps plus counts for reporting.
#[derive(Debug, Clone)]
pub struct Plan {
    pub layout: String,
    /// Rows left after normalization.
    pub rows: usize,
    /// Distinct step keys before any ceiling was applied.
    pub groups_found: usize,
    pub steps: Vec<IncubationStep>,
}

impl Plan {
    pub fn channel_count(&self) -> usize {
        self.steps.iter().map(|s| s.channels.len()).sum()
    }

    pub fn prep_count(&self) -> usize {
        self.steps.iter().map(|s| s.prep_channels().count()).sum()
    }
}

/// Normalize, group, apply the step ceiling, and build steps.
pub fn run(
    table: &RawTable,
    layout: &TableLayout,
    mapper: &DyeFilterMap,
    step_ceiling: Option<usize>,
) -> Result<Plan, EngineError> {
    let rows = normalize(table, layout)?;
    let row_count = rows.len();

    let groups = group_rows(rows);
    let groups_found = groups.len();
    let groups = truncate_groups(groups, step_ceiling);

    let steps = build_steps(&groups, layout, mapper)?;
    log::info!(
        "built {} incubation step(s) from {} row(s) ({} step key(s) found)",
        steps.len(),
        row_count,
        groups_found
    );

    Ok(Plan {
        layout: layout.name.clone(),
        rows: row_count,
        groups_found,
        steps,
    })
}
