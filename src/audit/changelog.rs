//! Change-log text parsing
//!
//! OpenSpecimen renders the changes of one audit record as a single line of
//! `field=value` pairs separated by commas. Values may themselves be
//! structured (`{id=3, name=Foo}` or `[a, b]`), so only commas outside any
//! bracket or brace separate entries.

use crate::models::ChangeLogEntry;

/// Split a change log on top-level commas
///
/// Nesting depth goes up on `[` or `{` and down on `]` or `}`. A comma only
/// separates segments at depth zero. Segments are trimmed and empty ones are
/// dropped. Unbalanced input is not rejected: the depth counter may end
/// non-zero or go negative and the same rule keeps applying.
pub fn split_top_level(log: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut depth: i32 = 0;

    for c in log.chars() {
        match c {
            '[' | '{' => {
                depth += 1;
                current.push(c);
            }
            ']' | '}' => {
                depth -= 1;
                current.push(c);
            }
            ',' if depth == 0 => push_segment(&mut segments, &mut current),
            _ => current.push(c),
        }
    }
    push_segment(&mut segments, &mut current);

    segments
}

fn push_segment(segments: &mut Vec<String>, current: &mut String) {
    let trimmed = current.trim();
    if !trimmed.is_empty() {
        segments.push(trimmed.to_string());
    }
    current.clear();
}

/// Split one segment at its first `=`; segments without one are ignored
pub fn parse_entry(segment: &str) -> Option<ChangeLogEntry> {
    let (field, value) = segment.split_once('=')?;
    let field = field.trim();
    if field.is_empty() {
        return None;
    }
    Some(ChangeLogEntry::new(field, value.trim()))
}

/// Parse every `field=value` entry of a change log, in order
pub fn parse_change_log(log: &str) -> Vec<ChangeLogEntry> {
    split_top_level(log)
        .iter()
        .filter_map(|segment| parse_entry(segment))
        .collect()
}
