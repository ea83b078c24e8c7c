//! Directive parser: the textual description block embedded in a DMI
//! file, decoded into a [`Sheet`].
//!
//! The grammar is a fixed, line-oriented `key = value` stream, so this
//! is a hand-rolled peek/consume parser rather than a grammar engine.
//! A state block consumes its lines in fixed order: `dirs`, `frames`,
//! then optionally `delay` and `rewind` when the very next line carries
//! them. Unrecognized top-level lines are ignored.

use crate::error::FormatError;
use crate::models::{Sheet, State};
use std::iter::Peekable;

/// Parse a directive block into a sheet named `name`.
///
/// The first non-blank line must be the literal `# BEGIN DMI` marker;
/// parsing stops at `# END DMI` or end of input. Pure function: no
/// pixel data is touched, only metadata.
pub fn parse_sheet(name: &str, block: &str) -> Result<Sheet, FormatError> {
    let mut lines = block.lines().peekable();

    let first = loop {
        match lines.next() {
            Some(l) if l.trim().is_empty() => continue,
            Some(l) => break l,
            None => return Err(FormatError::NotDmi),
        }
    };
    if first.trim() != "# BEGIN DMI" {
        return Err(FormatError::NotDmi);
    }

    let mut sheet = Sheet::new(name);

    // Version token: must be present, value accepted as-is.
    let version_line = lines
        .next()
        .ok_or_else(|| FormatError::truncated("version directive"))?;
    sheet.version = value_of(version_line).to_string();

    // Optional width/height pair overriding the 32x32 default. The
    // height line is mandatory once width appears.
    if let Some(line) = lines.next_if(|l| l.contains("width")) {
        sheet.width = parse_dim("width", value_of(line))?;
        let height_line = lines
            .next()
            .filter(|l| l.contains("height"))
            .ok_or_else(|| FormatError::truncated("height directive"))?;
        sheet.height = parse_dim("height", value_of(height_line))?;
    }

    while let Some(line) = lines.next() {
        if line.trim() == "# END DMI" {
            break;
        }
        if line.contains("state =") {
            let state_name = value_of(line).to_string();
            let state = parse_state(state_name, &mut lines)?;
            sheet.push_state(state);
        }
        // Any other top-level line is ignored.
    }

    Ok(sheet)
}

/// Consume one state block: `dirs` and `frames` are required, `delay`
/// and `rewind` are taken only when the immediately following line
/// carries them.
fn parse_state<'a, I>(name: String, lines: &mut Peekable<I>) -> Result<State, FormatError>
where
    I: Iterator<Item = &'a str>,
{
    let dirs_line = lines
        .next()
        .filter(|l| l.contains("dirs"))
        .ok_or_else(|| FormatError::truncated("dirs directive"))?;
    let dirs = parse_u32("dirs", value_of(dirs_line))?;

    let frames_line = lines
        .next()
        .filter(|l| l.contains("frames"))
        .ok_or_else(|| FormatError::truncated("frames directive"))?;
    let frames = parse_u32("frames", value_of(frames_line))?;

    let mut delays = Vec::new();
    if let Some(line) = lines.next_if(|l| l.contains("delay")) {
        for part in value_of(line).split(',') {
            delays.push(parse_f32("delay", part)?);
        }
    }

    let mut rewind = false;
    if let Some(line) = lines.next_if(|l| l.contains("rewind")) {
        rewind = parse_u32("rewind", value_of(line))? > 0;
    }

    State::new(name, dirs, frames, delays, rewind)
}

/// Extract the value of a `key = value` line: everything after the
/// first `=` with one leading space trimmed, minus a surrounding quote
/// pair when both are present.
fn value_of(line: &str) -> &str {
    let Some((_, rest)) = line.split_once('=') else {
        return "";
    };
    let rest = rest.strip_prefix(' ').unwrap_or(rest);
    let rest = rest.strip_suffix('\r').unwrap_or(rest);
    if rest.len() >= 2 && rest.starts_with('"') && rest.ends_with('"') {
        &rest[1..rest.len() - 1]
    } else {
        rest
    }
}

fn parse_u32(field: &'static str, value: &str) -> Result<u32, FormatError> {
    value
        .trim()
        .parse()
        .map_err(|_| FormatError::bad_number(field, value))
}

fn parse_f32(field: &'static str, value: &str) -> Result<f32, FormatError> {
    let trimmed = value.trim();
    let parsed: f32 = trimmed
        .parse()
        .map_err(|_| FormatError::bad_number(field, value))?;
    if parsed < 0.0 || !parsed.is_finite() {
        return Err(FormatError::bad_number(field, value));
    }
    Ok(parsed)
}

/// Tile dimensions must be positive.
fn parse_dim(field: &'static str, value: &str) -> Result<u32, FormatError> {
    match parse_u32(field, value)? {
        0 => Err(FormatError::bad_number(field, value)),
        dim => Ok(dim),
    }
}
