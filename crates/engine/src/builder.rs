// Step document builder: StepGroups -> IncubationSteps

use stainplan_core::{ChannelKind, ChannelStep, IncubationStep, StepGroup, StepRow, Well};

use crate::defaults::InstrumentDefaults;
use crate::dye_map::DyeFilterMap;
use crate::error::EngineError;
use crate::group::step_number;
use crate::layout::{ConcentrationSource, IncubationTimeSource, TableLayout};
use crate::lookahead::prep_dyes;
use crate::normalize::parse_count;

const DEFAULT_WELL_LETTER: &str = "A";
const DEFAULT_WELL_NUMBER: &str = "1";

/// Build one incubation step per group, in group order.
pub fn build_steps(
    groups: &[StepGroup],
    layout: &TableLayout,
    mapper: &DyeFilterMap,
) -> Result<Vec<IncubationStep>, EngineError> {
    (0..groups.len())
        .map(|i| build_step(groups, i, layout, mapper))
        .collect()
}

/// Build the incubation step for `groups[index]`.
///
/// Stain entries (one per row, in row order) come first, followed by a prep
/// entry for every dye the next group needs that this one lacks. Sequence
/// numbers run 1..=K across both.
pub fn build_step(
    groups: &[StepGroup],
    index: usize,
    layout: &TableLayout,
    mapper: &DyeFilterMap,
) -> Result<IncubationStep, EngineError> {
    let group = &groups[index];
    let inst = &layout.instrument;
    let first = group.first_row();

    let step_number = step_number(&group.key).ok_or_else(|| EngineError::InvalidStepKey {
        row: first.map(|r| r.source_row).unwrap_or(0),
        value: group.key.clone(),
    })?;

    let (letter, number) = parse_well(first.and_then(|r| r.well.as_deref()));

    let mut channels = Vec::with_capacity(group.rows.len());
    for row in &group.rows {
        let sequence = channels.len() as u32 + 1;
        channels.push(stain_channel(row, sequence, layout, mapper));
    }

    let prep = prep_dyes(groups, index);
    if !prep.is_empty() {
        log::debug!("step {}: prepping {}", step_number, prep.join(", "));
    }
    for dye in &prep {
        let sequence = channels.len() as u32 + 1;
        channels.push(prep_channel(dye, sequence, inst, mapper));
    }

    Ok(IncubationStep {
        step_number,
        incubation_time: incubation_time(first, layout),
        pipetting_volume: inst.pipetting_volume,
        ab_ratio: inst.ab_ratio,
        ab_mix_count: inst.ab_mix_count,
        clean_cycle: inst.clean_cycle,
        no_imaging: inst.no_imaging,
        well: Well {
            plate_name: inst.plate_name.clone(),
            plate_ref: inst.plate_ref.clone(),
            letter,
            number,
            volume: inst.well_volume,
        },
        channels,
    })
}

/// Split a well location like `"C7"` into letter and number.
///
/// Leading alphabetic characters form the letter, the rest the number.
/// Returns `("A", "1")` when the field is absent; an empty half falls back
/// to its default.
pub fn parse_well(well: Option<&str>) -> (String, String) {
    let Some(well) = well.map(str::trim).filter(|w| !w.is_empty()) else {
        return (DEFAULT_WELL_LETTER.to_string(), DEFAULT_WELL_NUMBER.to_string());
    };
    let split = well
        .char_indices()
        .find(|(_, c)| !c.is_alphabetic())
        .map(|(i, _)| i)
        .unwrap_or(well.len());
    let (letter, number) = well.split_at(split);
    let letter = if letter.is_empty() { DEFAULT_WELL_LETTER } else { letter };
    let number = number.trim();
    let number = if number.is_empty() { DEFAULT_WELL_NUMBER } else { number };
    (letter.to_string(), number.to_string())
}

/// Bleach cycles are whole hundreds of milliseconds.
pub fn bleach_cycle(bleach_time_ms: u32) -> u32 {
    bleach_time_ms / 100
}

fn incubation_time(first: Option<&StepRow>, layout: &TableLayout) -> u32 {
    let fallback = layout.instrument.incubation_time;
    let IncubationTimeSource::Column { column } = layout.incubation_time else {
        return fallback;
    };
    let Some(row) = first else {
        return fallback;
    };
    match row.incubation_time.as_deref() {
        Some(cell) => parse_count(cell).unwrap_or_else(|| {
            log::warn!(
                "row {}: incubation time '{}' in column {} is not a number, using {}",
                row.source_row,
                cell,
                column,
                fallback
            );
            fallback
        }),
        None => {
            log::warn!(
                "row {}: no incubation time in column {}, using {}",
                row.source_row,
                column,
                fallback
            );
            fallback
        }
    }
}

/// Concentration text for a stain entry.
///
/// Ratio columns render as `1:{value}`; a value that already contains `:`
/// is used as-is. Blank cells fall back to the placeholder.
fn concentration(row: &StepRow, layout: &TableLayout) -> String {
    let placeholder = &layout.instrument.concentration_placeholder;
    match layout.concentration {
        ConcentrationSource::Fixed => placeholder.clone(),
        ConcentrationSource::RatioColumn { .. } => match row.concentration.as_deref() {
            Some(v) if v.contains(':') => v.to_string(),
            Some(v) => format!("1:{}", v),
            None => placeholder.clone(),
        },
    }
}

fn stain_channel(
    row: &StepRow,
    sequence: u32,
    layout: &TableLayout,
    mapper: &DyeFilterMap,
) -> ChannelStep {
    let inst = &layout.instrument;
    let dye = row.dye.as_deref().unwrap_or("");
    ChannelStep {
        sequence,
        kind: ChannelKind::Stain,
        exposure_type: inst.exposure_type.clone(),
        exposure_time_ms: inst.exposure_time_ms,
        bleach_time_ms: row.bleach_time_ms,
        bleach_cycle: bleach_cycle(row.bleach_time_ms),
        marker_name: marker_name(&row.marker, dye, inst),
        marker_ref: inst.marker_ref.clone(),
        concentration: concentration(row, layout),
        fluorescence_filter: mapper.fluorescence_filter(dye).map(str::to_string),
        bleach_filter: mapper.bleach_filter(dye).map(str::to_string),
        filter_ref: inst.filter_ref.clone(),
        stop_after_imaging: false,
    }
}

fn prep_channel(
    dye: &str,
    sequence: u32,
    inst: &InstrumentDefaults,
    mapper: &DyeFilterMap,
) -> ChannelStep {
    ChannelStep {
        sequence,
        kind: ChannelKind::Prep,
        exposure_type: inst.exposure_type.clone(),
        exposure_time_ms: inst.exposure_time_ms,
        bleach_time_ms: 0,
        bleach_cycle: bleach_cycle(0),
        marker_name: marker_name(&inst.prep_buffer, dye, inst),
        marker_ref: inst.marker_ref.clone(),
        concentration: inst.concentration_placeholder.clone(),
        fluorescence_filter: mapper.fluorescence_filter(dye).map(str::to_string),
        bleach_filter: mapper.bleach_filter(dye).map(str::to_string),
        filter_ref: inst.filter_ref.clone(),
        stop_after_imaging: false,
    }
}

fn marker_name(marker: &str, dye: &str, inst: &InstrumentDefaults) -> String {
    format!("{}-{}_{}", marker, dye, inst.exposure_time_ms)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(key: &str, marker: &str, dye: &str, bleach: u32, well: Option<&str>) -> StepRow {
        StepRow {
            source_row: 1,
            step_key: key.to_string(),
            marker: marker.to_string(),
            dye: Some(dye.to_string()),
            bleach_time_ms: bleach,
            well: well.map(str::to_string),
            concentration: None,
            incubation_time: None,
        }
    }

    fn groups() -> Vec<StepGroup> {
        vec![
            StepGroup {
                key: "1".into(),
                rows: vec![
                    row("1", "CD3", "A", 1500, Some("C7")),
                    row("1", "CD4", "B", 250, None),
                ],
            },
            StepGroup {
                key: "2".into(),
                rows: vec![row("2", "CD8", "B", 0, None), row("2", "CD20", "C", 99, None)],
            },
        ]
    }

    fn mapper() -> DyeFilterMap {
        let mut m = DyeFilterMap::new();
        m.insert("A", "GFP");
        m.insert("C", "Cy5");
        m
    }

    #[test]
    fn stain_then_prep_with_contiguous_sequence() {
        let layout = TableLayout::single_sheet();
        let steps = build_steps(&groups(), &layout, &mapper()).unwrap();
        assert_eq!(steps.len(), 2);

        let first = &steps[0];
        assert_eq!(first.step_number, 1);
        let seq: Vec<u32> = first.channels.iter().map(|c| c.sequence).collect();
        assert_eq!(seq, vec![1, 2, 3]);
        assert_eq!(first.stain_channels().count(), 2);

        let prep: Vec<&ChannelStep> = first.prep_channels().collect();
        assert_eq!(prep.len(), 1);
        assert_eq!(prep[0].marker_name, "PBS-C_450");
        assert_eq!(prep[0].bleach_time_ms, 0);
        assert_eq!(prep[0].bleach_cycle, 0);
        assert_eq!(prep[0].concentration, "1:50");
        assert_eq!(prep[0].fluorescence_filter.as_deref(), Some("Cy5"));

        assert_eq!(steps[1].prep_channels().count(), 0, "last step has no prep");
    }

    #[test]
    fn stain_channel_fields() {
        let layout = TableLayout::single_sheet();
        let step = build_step(&groups(), 0, &layout, &mapper()).unwrap();
        let c = &step.channels[0];
        assert_eq!(c.marker_name, "CD3-A_450");
        assert_eq!(c.bleach_time_ms, 1500);
        assert_eq!(c.bleach_cycle, 15);
        assert_eq!(c.exposure_type, "full");
        assert_eq!(c.exposure_time_ms, 450);
        assert_eq!(c.fluorescence_filter.as_deref(), Some("GFP"));
        assert_eq!(c.bleach_filter.as_deref(), Some("GFP"));
        assert_eq!(c.concentration, "1:50");

        let unmapped = &step.channels[1];
        assert_eq!(unmapped.bleach_cycle, 2);
        assert_eq!(unmapped.fluorescence_filter, None);
        assert_eq!(unmapped.bleach_filter, None);
    }

    #[test]
    fn well_from_first_row_only() {
        let layout = TableLayout::single_sheet();
        let steps = build_steps(&groups(), &layout, &mapper()).unwrap();
        assert_eq!((steps[0].well.letter.as_str(), steps[0].well.number.as_str()), ("C", "7"));
        assert_eq!((steps[1].well.letter.as_str(), steps[1].well.number.as_str()), ("A", "1"));
        assert_eq!(steps[0].well.plate_name, "AK96_1_1");
        assert_eq!(steps[0].well.volume, 60);
    }

    #[test]
    fn fixed_instrument_parameters() {
        let layout = TableLayout::single_sheet();
        let step = build_step(&groups(), 1, &layout, &mapper()).unwrap();
        assert_eq!(step.incubation_time, 3000);
        assert_eq!(step.pipetting_volume, 100);
        assert_eq!(step.ab_ratio, 50);
        assert_eq!(step.ab_mix_count, 1);
        assert_eq!(step.clean_cycle, 30);
        assert!(!step.no_imaging);
    }

    #[test]
    fn column_sources() {
        let layout = TableLayout::multi_sheet();
        let mut gs = groups();
        gs[0].rows[0].incubation_time = Some("1800".into());
        gs[0].rows[0].concentration = Some("200".into());
        gs[0].rows[1].concentration = Some("1:25".into());
        gs[1].rows[0].incubation_time = Some("soon".into());

        let steps = build_steps(&gs, &layout, &mapper()).unwrap();
        assert_eq!(steps[0].incubation_time, 1800);
        assert_eq!(steps[0].channels[0].concentration, "1:200");
        assert_eq!(steps[0].channels[1].concentration, "1:25");
        assert_eq!(steps[1].incubation_time, 3000, "unparseable falls back");
        assert_eq!(steps[1].channels[0].concentration, "1:50", "blank falls back");
    }

    #[test]
    fn non_numeric_key_is_fatal() {
        let mut gs = groups();
        gs[0].key = "first".into();
        let err = build_steps(&gs, &TableLayout::single_sheet(), &mapper()).unwrap_err();
        assert!(matches!(err, EngineError::InvalidStepKey { .. }));
    }

    #[test]
    fn parse_well_variants() {
        assert_eq!(parse_well(Some("C7")), ("C".to_string(), "7".to_string()));
        assert_eq!(parse_well(Some("H12")), ("H".to_string(), "12".to_string()));
        assert_eq!(parse_well(None), ("A".to_string(), "1".to_string()));
        assert_eq!(parse_well(Some("  ")), ("A".to_string(), "1".to_string()));
        assert_eq!(parse_well(Some("D")), ("D".to_string(), "1".to_string()));
        assert_eq!(parse_well(Some("5")), ("A".to_string(), "5".to_string()));
    }
}
