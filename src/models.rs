//! Data model for a parsed DMI sheet: states, frames, direction images.
//!
//! The tree is plain owned data. Sheet and State metadata are what the
//! directive parser produces and the manifest carries between pipeline
//! phases; frame pixel payloads are populated by the extraction tiler
//! (or reloaded from per-tile files) and are never serialized here.

use crate::error::FormatError;
use image::RgbaImage;
use serde::{Deserialize, Serialize};

/// One of the eight facing tags a frame can be rendered for.
///
/// The declaration order below is the canonical tile order within a
/// frame and must not be reordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    South,
    North,
    East,
    West,
    Southeast,
    Southwest,
    Northeast,
    Northwest,
}

/// All directions in canonical tile order.
pub static DIRECTION_ORDER: [Direction; 8] = [
    Direction::South,
    Direction::North,
    Direction::East,
    Direction::West,
    Direction::Southeast,
    Direction::Southwest,
    Direction::Northeast,
    Direction::Northwest,
];

impl Direction {
    /// Engine-numeric tag for this direction, used to name per-tile files.
    pub fn tag(self) -> u8 {
        match self {
            Direction::South => 2,
            Direction::North => 1,
            Direction::East => 4,
            Direction::West => 8,
            Direction::Southeast => 6,
            Direction::Southwest => 10,
            Direction::Northeast => 5,
            Direction::Northwest => 9,
        }
    }

    /// The active directions for a declared direction count.
    ///
    /// Only 1, 2, 4, and 8 are legal counts; anything else is
    /// `FormatError::BadDirCount`.
    pub fn ring(count: u32) -> Result<&'static [Direction], FormatError> {
        match count {
            1 | 2 | 4 | 8 => Ok(&DIRECTION_ORDER[..count as usize]),
            other => Err(FormatError::BadDirCount(other)),
        }
    }
}

/// One tile: a direction tag plus its pixel data.
#[derive(Debug, Clone)]
pub struct DirectionImage {
    pub dir: Direction,
    pub pixels: RgbaImage,
}

impl DirectionImage {
    pub fn new(dir: Direction, pixels: RgbaImage) -> Self {
        Self { dir, pixels }
    }
}

/// One time-step within a state, holding one image per active direction.
#[derive(Debug, Clone, Default)]
pub struct Frame {
    /// Effective delay in ticks, resolved from the state's delay list.
    pub delay: f32,
    pub images: Vec<DirectionImage>,
}

impl Frame {
    pub fn new(delay: f32) -> Self {
        Self { delay, images: Vec::new() }
    }

    pub fn push(&mut self, image: DirectionImage) {
        self.images.push(image);
    }
}

/// One named animation group.
///
/// Names are not unique; duplicates are legal and declaration order is
/// significant because it fixes tile positions in the packed canvas.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct State {
    pub name: String,
    /// Direction count, one of {1, 2, 4, 8}.
    pub dirs: u32,
    /// Declared frame count (>= 0).
    pub frames: u32,
    /// Delay list: empty, a single broadcast value, or one per frame.
    /// A mismatched length is the producer's fault and falls back to
    /// per-frame lookup rather than being rejected here.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub delays: Vec<f32>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub rewind: bool,
    /// Populated by the extraction tiler; never serialized.
    #[serde(skip)]
    pub frame_data: Vec<Frame>,
}

impl State {
    pub fn new(
        name: String,
        dirs: u32,
        frames: u32,
        delays: Vec<f32>,
        rewind: bool,
    ) -> Result<Self, FormatError> {
        // Validate the count up front; the ring itself is re-derived
        // wherever tiles are walked.
        Direction::ring(dirs)?;
        Ok(Self { name, dirs, frames, delays, rewind, frame_data: Vec::new() })
    }

    /// The active directions for this state, in canonical order.
    ///
    /// `dirs` was validated on construction, or by `Sheet::validate`
    /// after a manifest load.
    pub fn directions(&self) -> &'static [Direction] {
        Direction::ring(self.dirs).unwrap_or(&DIRECTION_ORDER[..1])
    }

    /// Resolve the effective delay for frame `i`: the list entry at `i`
    /// if present, else the first entry, else 0.
    pub fn delay_for(&self, i: u32) -> f32 {
        match self.delays.get(i as usize) {
            Some(d) => *d,
            None => self.delays.first().copied().unwrap_or(0.0),
        }
    }

    /// Declared tile count: frames times active directions.
    pub fn declared_tiles(&self) -> u32 {
        self.frames * self.dirs
    }

    pub fn push_frame(&mut self, frame: Frame) {
        self.frame_data.push(frame);
    }
}

fn default_version() -> String {
    "4.0".to_string()
}

fn default_tile_dim() -> u32 {
    32
}

/// One parsed sprite-sheet file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sheet {
    /// Display name, normally the source file stem.
    pub name: String,
    /// Version token from the directive block, written back verbatim.
    #[serde(default = "default_version")]
    pub version: String,
    /// Tile width in pixels.
    #[serde(default = "default_tile_dim")]
    pub width: u32,
    /// Tile height in pixels.
    #[serde(default = "default_tile_dim")]
    pub height: u32,
    /// States in declaration order.
    #[serde(default)]
    pub states: Vec<State>,
}

impl Sheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: default_version(),
            width: default_tile_dim(),
            height: default_tile_dim(),
            states: Vec::new(),
        }
    }

    pub fn push_state(&mut self, state: State) {
        self.states.push(state);
    }

    /// Tile count declared by the metadata (before any tiling).
    pub fn declared_tiles(&self) -> u32 {
        self.states.iter().map(State::declared_tiles).sum()
    }

    /// Tile count actually populated with pixel data.
    pub fn packed_tiles(&self) -> u32 {
        self.states
            .iter()
            .flat_map(|s| s.frame_data.iter())
            .map(|f| f.images.len() as u32)
            .sum()
    }

    /// Re-check invariants after an external load (manifest JSON can
    /// carry anything).
    pub fn validate(&self) -> Result<(), FormatError> {
        if self.width == 0 || self.height == 0 {
            return Err(FormatError::bad_number(
                "width/height",
                "0 (tile dimensions must be positive)",
            ));
        }
        for state in &self.states {
            Direction::ring(state.dirs)?;
        }
        Ok(())
    }
}
