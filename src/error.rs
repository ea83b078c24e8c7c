//! Error types for DMI decoding, tiling, and re-encoding.

use std::path::PathBuf;
use thiserror::Error;

/// Error raised while decoding the directive block or walking tile data.
///
/// Any of these is terminal for the sheet being processed: no partial
/// sheet is ever emitted. The batch driver reports the failure with the
/// file identity and moves on to the next sheet.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormatError {
    /// The text block does not start with the `# BEGIN DMI` marker.
    #[error("missing `# BEGIN DMI` marker - not a DMI description block")]
    NotDmi,
    /// A required directive or the tile pixel data ran out early.
    #[error("truncated DMI data: {0}")]
    Truncated(String),
    /// A numeric field failed to parse.
    #[error("malformed number in `{field}`: {value:?}")]
    BadNumber { field: &'static str, value: String },
    /// A direction count outside {1, 2, 4, 8}.
    #[error("invalid direction count {0} (expected 1, 2, 4, or 8)")]
    BadDirCount(u32),
}

impl FormatError {
    pub(crate) fn truncated(what: impl Into<String>) -> Self {
        FormatError::Truncated(what.into())
    }

    pub(crate) fn bad_number(field: &'static str, value: &str) -> Self {
        FormatError::BadNumber { field, value: value.to_string() }
    }
}

/// Crate-level error: a format failure or a collaborator fault
/// (file I/O, PNG container, per-tile image codec).
#[derive(Debug, Error)]
pub enum DmiError {
    #[error(transparent)]
    Format(#[from] FormatError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("PNG decode error: {0}")]
    PngDecode(#[from] png::DecodingError),
    #[error("PNG encode error: {0}")]
    PngEncode(#[from] png::EncodingError),
    #[error("manifest error: {0}")]
    Manifest(#[from] serde_json::Error),
    /// The embedded description block is absent from the container.
    #[error("{}: no Description text chunk found", .0.display())]
    MissingDescription(PathBuf),
}

impl DmiError {
    /// True when the failure is a format fault in the sheet itself, as
    /// opposed to an I/O or codec fault.
    pub fn is_format(&self) -> bool {
        matches!(self, DmiError::Format(_))
    }
}

pub type Result<T> = std::result::Result<T, DmiError>;
