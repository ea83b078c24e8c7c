//! Per-tile workspace storage between the extract and rebuild phases.
//!
//! Each sheet gets its own directory holding a `sheet.json` manifest
//! (the parsed metadata plus the applied scale factor) and one PNG per
//! tile, addressed by `(state index, frame index, direction tag)`:
//!
//! ```text
//! <sheet-dir>/sheet.json
//! <sheet-dir>/<state>/<frame>/<dir-tag>.png
//! ```
//!
//! This is what lets an out-of-process upscaler replace individual
//! tiles between the two phases.

use crate::error::{DmiError, FormatError, Result};
use crate::models::{Direction, DirectionImage, Frame, Sheet};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

/// Manifest file name inside a sheet workspace directory.
pub const MANIFEST_FILE: &str = "sheet.json";

/// On-disk manifest: the sheet metadata plus the scale factor the
/// tiles were written at, so rebuild needs no out-of-band flag.
#[derive(Debug, Serialize, Deserialize)]
pub struct Manifest {
    pub scale: u32,
    pub sheet: Sheet,
}

#[derive(Serialize)]
struct ManifestRef<'a> {
    scale: u32,
    sheet: &'a Sheet,
}

/// Path of one tile inside a sheet workspace directory.
pub fn tile_path(root: &Path, state: usize, frame: usize, dir: Direction) -> PathBuf {
    root.join(state.to_string())
        .join(frame.to_string())
        .join(format!("{}.png", dir.tag()))
}

/// Write the manifest and every populated tile under `root`.
pub fn save_sheet(root: &Path, sheet: &Sheet, scale: u32) -> Result<()> {
    std::fs::create_dir_all(root)?;

    for (state_idx, state) in sheet.states.iter().enumerate() {
        for (frame_idx, frame) in state.frame_data.iter().enumerate() {
            for tile in &frame.images {
                let path = tile_path(root, state_idx, frame_idx, tile.dir);
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                tile.pixels.save(&path)?;
            }
        }
    }

    let file = File::create(root.join(MANIFEST_FILE))?;
    serde_json::to_writer_pretty(BufWriter::new(file), &ManifestRef { scale, sheet })?;
    Ok(())
}

/// Load and validate a manifest from a sheet workspace directory.
pub fn load_manifest(root: &Path) -> Result<Manifest> {
    let file = File::open(root.join(MANIFEST_FILE))?;
    let manifest: Manifest = serde_json::from_reader(BufReader::new(file))?;
    manifest.sheet.validate()?;
    Ok(manifest)
}

/// Rebuild the frame tree from per-tile files under `root`.
///
/// The tree shape comes from the sheet metadata; every expected tile
/// file must exist. A missing tile fails the whole sheet rather than
/// silently reusing stale pixels.
pub fn load_tiles(sheet: &mut Sheet, root: &Path) -> Result<()> {
    let mut loaded = Vec::with_capacity(sheet.states.len());
    for (state_idx, state) in sheet.states.iter().enumerate() {
        let mut frames = Vec::with_capacity(state.frames as usize);
        for frame_idx in 0..state.frames {
            let mut frame = Frame::new(state.delay_for(frame_idx));
            for &dir in state.directions() {
                let path = tile_path(root, state_idx, frame_idx as usize, dir);
                if !path.exists() {
                    return Err(DmiError::Format(FormatError::truncated(format!(
                        "tile file missing: {}",
                        path.display()
                    ))));
                }
                let pixels = image::open(&path)?.to_rgba8();
                frame.push(DirectionImage::new(dir, pixels));
            }
            frames.push(frame);
        }
        loaded.push(frames);
    }
    for (state, frames) in sheet.states.iter_mut().zip(loaded) {
        state.frame_data = frames;
    }
    Ok(())
}
