// Step grouper

use std::collections::HashMap;

use stainplan_core::{StepGroup, StepRow};

/// Partition rows into groups by step key.
///
/// Groups come out in first-seen key order, not sorted: plan sheets are not
/// guaranteed to number their steps monotonically. Rows keep their source
/// order inside each group.
pub fn group_rows(rows: Vec<StepRow>) -> Vec<StepGroup> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<StepGroup> = Vec::new();

    for row in rows {
        match index.get(&row.step_key) {
            Some(&i) => groups[i].rows.push(row),
            None => {
                index.insert(row.step_key.clone(), groups.len());
                groups.push(StepGroup {
                    key: row.step_key.clone(),
                    rows: vec![row],
                });
            }
        }
    }

    groups
}

/// Keep only the first `ceiling` groups. `None` keeps everything.
pub fn truncate_groups(mut groups: Vec<StepGroup>, ceiling: Option<usize>) -> Vec<StepGroup> {
    if let Some(n) = ceiling {
        if groups.len() > n {
            log::info!("step ceiling {}: dropping {} trailing step(s)", n, groups.len() - n);
            groups.truncate(n);
        }
    }
    groups
}

/// Coerce a step key to the integer written to `stepNumber`.
///
/// Accepts `"3"` and spreadsheet floats such as `"3.0"`; fractional values
/// truncate toward zero. Returns `None` for anything non-numeric.
pub fn step_number(key: &str) -> Option<i64> {
    let key = key.trim();
    if let Ok(n) = key.parse::<i64>() {
        return Some(n);
    }
    let f = key.parse::<f64>().ok()?;
    if !f.is_finite() || f.abs() > i64::MAX as f64 {
        return None;
    }
    Some(f.trunc() as i64)
}
