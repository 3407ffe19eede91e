// Lookahead diff: dyes the next step needs that the current one lacks

use std::collections::BTreeSet;

use stainplan_core::StepGroup;

/// Distinct, trimmed, non-missing dye identifiers of a group.
pub fn dye_set(group: &StepGroup) -> BTreeSet<&str> {
    group.dyes().map(str::trim).filter(|d| !d.is_empty()).collect()
}

/// Dyes used by `groups[index + 1]` but not by `groups[index]`, sorted.
///
/// The last group (or an out-of-range index) has no successor and always
/// yields an empty list.
pub fn prep_dyes(groups: &[StepGroup], index: usize) -> Vec<String> {
    let (Some(current), Some(next)) = (groups.get(index), groups.get(index + 1)) else {
        return Vec::new();
    };
    let current = dye_set(current);
    dye_set(next)
        .difference(&current)
        .map(|d| d.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use stainplan_core::StepRow;

    fn group(key: &str, dyes: &[Option<&str>]) -> StepGroup {
        StepGroup {
            key: key.to_string(),
            rows: dyes
                .iter()
                .map(|d| StepRow {
                    source_row: 0,
                    step_key: key.to_string(),
                    marker: "m".to_string(),
                    dye: d.map(str::to_string),
                    bleach_time_ms: 0,
                    well: None,
                    concentration: None,
                    incubation_time: None,
                })
                .collect(),
        }
    }

    #[test]
    fn next_minus_current() {
        let groups = vec![
            group("1", &[Some("A"), Some("B")]),
            group("2", &[Some("B"), Some("C")]),
        ];
        assert_eq!(prep_dyes(&groups, 0), vec!["C"]);
        assert!(prep_dyes(&groups, 1).is_empty());
    }

    #[test]
    fn result_is_sorted_and_deduplicated() {
        let groups = vec![
            group("1", &[Some("FITC")]),
            group("2", &[Some("PE"), Some("Cy5"), Some("PE"), Some("APC")]),
        ];
        assert_eq!(prep_dyes(&groups, 0), vec!["APC", "Cy5", "PE"]);
    }

    #[test]
    fn missing_dyes_are_ignored() {
        let groups = vec![group("1", &[None]), group("2", &[None, Some(" DAPI ")])];
        assert_eq!(prep_dyes(&groups, 0), vec!["DAPI"]);
        assert_eq!(dye_set(&groups[0]).len(), 0);
    }

    #[test]
    fn out_of_range_index_is_empty() {
        let groups = vec![group("1", &[Some("A")])];
        assert!(prep_dyes(&groups, 0).is_empty());
        assert!(prep_dyes(&groups, 5).is_empty());
        assert!(prep_dyes(&[], 0).is_empty());
    }
}
