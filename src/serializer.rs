//! Directive serializer: renders a [`Sheet`]'s metadata back into the
//! textual description block. Inverse of [`crate::parser`].

use crate::models::{Sheet, State};
use std::fmt::Write;

/// Render the directive block for a sheet.
///
/// Only metadata is rendered, never pixels. `delay` is emitted only
/// when the list is non-empty and `rewind` only when set, so a parsed
/// block re-serializes without inventing directives. Delay values use
/// `Display` formatting, which round-trips fractional ticks exactly
/// (`0.5` stays `0.5`, `10` stays `10`).
pub fn serialize_sheet(sheet: &Sheet) -> String {
    let mut out = String::from("# BEGIN DMI\n");
    // Writing to a String cannot fail, so the fmt results are moot.
    let _ = writeln!(out, "version = {}", sheet.version);
    let _ = writeln!(out, "\twidth = {}", sheet.width);
    let _ = writeln!(out, "\theight = {}", sheet.height);
    for state in &sheet.states {
        serialize_state(&mut out, state);
    }
    out.push_str("# END DMI\n");
    out
}

fn serialize_state(out: &mut String, state: &State) {
    let _ = writeln!(out, "state = \"{}\"", state.name);
    let _ = writeln!(out, "\tdirs = {}", state.dirs);
    let _ = writeln!(out, "\tframes = {}", state.frames);
    if !state.delays.is_empty() {
        let joined = state
            .delays
            .iter()
            .map(f32::to_string)
            .collect::<Vec<_>>()
            .join(",");
        let _ = writeln!(out, "\tdelay = {}", joined);
    }
    if state.rewind {
        let _ = writeln!(out, "\trewind = 1");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::State;
    use crate::parser::parse_sheet;

    fn sheet_with(states: Vec<State>) -> Sheet {
        let mut sheet = Sheet::new("test");
        for s in states {
            sheet.push_state(s);
        }
        sheet
    }

    #[test]
    fn test_example_block_byte_equivalent() {
        let block = "# BEGIN DMI\nversion = 4.0\n\twidth = 32\n\theight = 32\nstate = \"idle\"\n\tdirs = 4\n\tframes = 2\n\tdelay = 10,20\n# END DMI\n";
        let sheet = parse_sheet("mob", block).unwrap();
        assert_eq!(serialize_sheet(&sheet), block);
    }

    #[test]
    fn test_delay_omitted_when_empty() {
        let sheet = sheet_with(vec![
            State::new("a".into(), 1, 2, vec![], false).unwrap()
        ]);
        let text = serialize_sheet(&sheet);
        assert!(!text.contains("delay"));
        assert!(!text.contains("rewind"));
    }

    #[test]
    fn test_rewind_emitted_only_when_set() {
        let sheet = sheet_with(vec![
            State::new("a".into(), 1, 1, vec![], true).unwrap()
        ]);
        assert!(serialize_sheet(&sheet).contains("\trewind = 1\n"));
    }

    #[test]
    fn test_fractional_delays_roundtrip() {
        let sheet = sheet_with(vec![
            State::new("a".into(), 1, 3, vec![0.5, 1.25, 10.0], false).unwrap()
        ]);
        let text = serialize_sheet(&sheet);
        assert!(text.contains("\tdelay = 0.5,1.25,10\n"));

        let back = parse_sheet("test", &text).unwrap();
        assert_eq!(back.states[0].delays, vec![0.5, 1.25, 10.0]);
    }

    #[test]
    fn test_single_element_delay_list() {
        let sheet = sheet_with(vec![
            State::new("a".into(), 1, 3, vec![7.0], false).unwrap()
        ]);
        assert!(serialize_sheet(&sheet).contains("\tdelay = 7\n"));
    }

    #[test]
    fn test_parse_serialize_parse_equivalence() {
        let block = "# BEGIN DMI\nversion = 4.0\n\twidth = 64\n\theight = 48\nstate = \"idle\"\n\tdirs = 4\n\tframes = 2\n\tdelay = 10,20\nstate = \"idle\"\n\tdirs = 8\n\tframes = 1\nstate = \"walk\"\n\tdirs = 2\n\tframes = 3\n\tdelay = 2.5\n\trewind = 1\n# END DMI\n";
        let first = parse_sheet("m", block).unwrap();
        let second = parse_sheet("m", &serialize_sheet(&first)).unwrap();

        assert_eq!(first.version, second.version);
        assert_eq!((first.width, first.height), (second.width, second.height));
        assert_eq!(first.states.len(), second.states.len());
        for (a, b) in first.states.iter().zip(&second.states) {
            assert_eq!(a.name, b.name);
            assert_eq!(a.dirs, b.dirs);
            assert_eq!(a.frames, b.frames);
            assert_eq!(a.delays, b.delays);
            assert_eq!(a.rewind, b.rewind);
        }
    }
}
