use serde::Deserialize;

/// Fixed instrument parameters written into every incubation step.
///
/// The values match the instrument's stock protocol; a layout file may
/// override any of them under `[instrument]`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InstrumentDefaults {
    /// Used when the layout does not read incubation time from a column,
    /// and as the fallback when that column is blank.
    pub incubation_time: u32,
    pub pipetting_volume: u32,
    pub ab_ratio: u32,
    pub ab_mix_count: u32,
    pub clean_cycle: u32,
    pub no_imaging: bool,
    pub plate_name: String,
    pub plate_ref: String,
    pub well_volume: u32,
    pub exposure_type: String,
    pub exposure_time_ms: u32,
    pub marker_ref: String,
    /// Concentration for prep entries and for rows without a value.
    pub concentration_placeholder: String,
    pub filter_ref: String,
    /// Buffer name used in prep marker names (`"{buffer}-{dye}_450"`).
    pub prep_buffer: String,
}

impl Default for InstrumentDefaults {
    fn default() -> Self {
        Self {
            incubation_time: 3000,
            pipetting_volume: 100,
            ab_ratio: 50,
            ab_mix_count: 1,
            clean_cycle: 30,
            no_imaging: false,
            plate_name: "AK96_1_1".to_string(),
            plate_ref: "URN:LSID:lsid.meltec.de:plate:2".to_string(),
            well_volume: 60,
            exposure_type: "full".to_string(),
            exposure_time_ms: 450,
            marker_ref: "URN:LSID:lsid.meltec.de:marker:1002".to_string(),
            concentration_placeholder: "1:50".to_string(),
            filter_ref: "URN:LSID:lsid.meltec.de:filter:1".to_string(),
            prep_buffer: "PBS".to_string(),
        }
    }
}
