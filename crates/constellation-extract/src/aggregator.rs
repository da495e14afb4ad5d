//! Context aggregation: turns citation records into presentation labels.

use std::collections::HashSet;

use crate::models::{ContextLabel, ContextRecord, SectionPath, UNKNOWN_SECTION_LABEL};
use crate::walker::citation::CiteMacro;

/// Drop records whose (path, macro) pair was already seen.
/// Keeps first-seen order.
pub fn dedup_records(records: &[ContextRecord]) -> Vec<&ContextRecord> {
    let mut seen: HashSet<(&SectionPath, CiteMacro)> = HashSet::new();
    records
        .iter()
        .filter(|r| seen.insert((&r.path, r.macro_name)))
        .collect()
}

/// Build the label list for one paper.
///
/// Records with the same path text collapse into one label listing the
/// macros used there. An empty input yields the single "no context found"
/// label, never an empty list.
pub fn aggregate(records: &[ContextRecord]) -> Vec<ContextLabel> {
    let mut labels: Vec<ContextLabel> = Vec::new();

    for record in dedup_records(records) {
        let text = record
            .path
            .label()
            .unwrap_or_else(|| UNKNOWN_SECTION_LABEL.to_string());

        match labels.iter_mut().find(|l| l.text == text) {
            Some(label) => {
                if !label.macros.contains(&record.macro_name) {
                    label.macros.push(record.macro_name);
                }
            }
            None => labels.push(ContextLabel { text, macros: vec![record.macro_name] }),
        }
    }

    if labels.is_empty() {
        labels.push(ContextLabel::no_context());
    }
    labels
}
