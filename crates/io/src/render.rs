// Step renderer: IncubationStep values -> instrument XML elements

use stainplan_core::{ChannelStep, IncubationStep};

use crate::xml::Element;
use crate::XLINK_NS;

const HREF: &str = "xlink:href";
const XMLNS_XLINK: &str = "xmlns:xlink";

/// Declare the `xlink` prefix on the root if the template does not.
pub fn ensure_xlink_namespace(root: &mut Element) {
    if root.attr(XMLNS_XLINK).is_none() {
        log::debug!("template root lacks {}, adding it", XMLNS_XLINK);
        root.set_attr(XMLNS_XLINK, XLINK_NS);
    }
}

/// Append one `incStep` per step to the end of the root, in order.
pub fn append_steps(root: &mut Element, steps: &[IncubationStep]) {
    ensure_xlink_namespace(root);
    for step in steps {
        root.push(incubation_step_element(step));
    }
}

pub fn incubation_step_element(step: &IncubationStep) -> Element {
    let well = &step.well;
    let mut el = Element::new("incStep")
        .with_attr("stepNumber", step.step_number.to_string())
        .with_child(text("incTime", step.incubation_time))
        .with_child(text("pipVolume", step.pipetting_volume))
        .with_child(text("pipABRatio", step.ab_ratio))
        .with_child(text("pipABMixCount", step.ab_mix_count))
        .with_child(text("cleanCycle", step.clean_cycle))
        .with_child(text("noImaging", step.no_imaging))
        .with_child(
            Element::new("well")
                .with_attr("plateName", well.plate_name.as_str())
                .with_child(Element::new("plateLSID").with_attr(HREF, well.plate_ref.as_str()))
                .with_child(text("letter", &well.letter))
                .with_child(text("number", &well.number))
                .with_child(text("volume", well.volume)),
        );

    for channel in &step.channels {
        el.push(channel_step_element(channel));
    }
    el
}

fn channel_step_element(c: &ChannelStep) -> Element {
    Element::new("channelStep")
        .with_attr("stepNumber", c.sequence.to_string())
        .with_child(text("type", &c.exposure_type))
        .with_child(text("exposureTime", c.exposure_time_ms))
        .with_child(text("bleachTime", c.bleach_time_ms))
        .with_child(text("bleachCycle", c.bleach_cycle))
        .with_child(
            Element::new("marker")
                .with_attr("name", c.marker_name.as_str())
                .with_attr(HREF, c.marker_ref.as_str()),
        )
        .with_child(text("markerConcentration", &c.concentration))
        .with_child(filter_element("fluorescenceFilter", c.fluorescence_filter.as_deref(), &c.filter_ref))
        .with_child(filter_element("bleachFilter", c.bleach_filter.as_deref(), &c.filter_ref))
        .with_child(text("stopAfterImaging", c.stop_after_imaging))
}

/// Unmapped dyes get a filter element with only the link attribute.
fn filter_element(tag: &str, filter: Option<&str>, href: &str) -> Element {
    let mut el = Element::new(tag);
    if let Some(name) = filter {
        el.set_attr("name", name);
    }
    el.with_attr(HREF, href)
}

fn text(tag: &str, value: impl ToString) -> Element {
    Element::new(tag).with_text(value.to_string())
}
