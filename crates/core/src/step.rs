// ---------------------------------------------------------------------------
// Input side
// ---------------------------------------------------------------------------

/// A normalized plan row with named fields.
///
/// Produced once by the normalizer from a positional [`crate::RawRow`]; every
/// later stage reads fields by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepRow {
    /// 1-based row number in the source sheet.
    pub source_row: usize,
    /// Step identifier, forward-filled so it is always present.
    pub step_key: String,
    pub marker: String,
    /// Trimmed dye identifier; `None` when the cell is blank.
    pub dye: Option<String>,
    pub bleach_time_ms: u32,
    /// Combined well location such as `"C7"`.
    pub well: Option<String>,
    /// Raw concentration cell, when the layout reads one.
    pub concentration: Option<String>,
    /// Raw incubation time cell, when the layout reads one.
    pub incubation_time: Option<String>,
}

/// Rows sharing one step key, in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepGroup {
    pub key: String,
    pub rows: Vec<StepRow>,
}

impl StepGroup {
    pub fn first_row(&self) -> Option<&StepRow> {
        self.rows.first()
    }

    /// Non-missing dye identifiers in row order (may repeat).
    pub fn dyes(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().filter_map(|r| r.dye.as_deref())
    }
}

// ---------------------------------------------------------------------------
// Output side
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    /// One per plan row.
    Stain,
    /// Synthetic entry staging a dye needed by the following step.
    Prep,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Well {
    pub plate_name: String,
    pub plate_ref: String,
    pub letter: String,
    pub number: String,
    pub volume: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelStep {
    /// 1-based, contiguous within the parent step.
    pub sequence: u32,
    pub kind: ChannelKind,
    pub exposure_type: String,
    pub exposure_time_ms: u32,
    pub bleach_time_ms: u32,
    pub bleach_cycle: u32,
    pub marker_name: String,
    pub marker_ref: String,
    pub concentration: String,
    pub fluorescence_filter: Option<String>,
    pub bleach_filter: Option<String>,
    pub filter_ref: String,
    pub stop_after_imaging: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncubationStep {
    pub step_number: i64,
    pub incubation_time: u32,
    pub pipetting_volume: u32,
    pub ab_ratio: u32,
    pub ab_mix_count: u32,
    pub clean_cycle: u32,
    pub no_imaging: bool,
    pub well: Well,
    pub channels: Vec<ChannelStep>,
}

impl IncubationStep {
    pub fn stain_channels(&self) -> impl Iterator<Item = &ChannelStep> {
        self.channels.iter().filter(|c| c.kind == ChannelKind::Stain)
    }

    pub fn prep_channels(&self) -> impl Iterator<Item = &ChannelStep> {
        self.channels.iter().filter(|c| c.kind == ChannelKind::Prep)
    }
}
