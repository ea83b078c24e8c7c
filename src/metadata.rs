//! PNG container glue: the directive block travels in a `Description`
//! text chunk next to the packed canvas.
//!
//! The `image` crate handles pixel decoding elsewhere but exposes no
//! text chunks, so reading and embedding the description goes through
//! the `png` crate directly. Reading accepts tEXt, zTXt, and iTXt;
//! writing always emits zTXt, which is what the format's tooling
//! produces for the (often multi-kilobyte) block.

use crate::error::Result;
use image::RgbaImage;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Chunk keyword carrying the directive block.
const DESCRIPTION_KEYWORD: &str = "Description";

/// Read the embedded directive block from a PNG file, if present.
pub fn read_description(path: &Path) -> Result<Option<String>> {
    let decoder = png::Decoder::new(File::open(path)?);
    let mut reader = decoder.read_info()?;

    if let Some(text) = find_description(reader.info())? {
        return Ok(Some(text));
    }
    // Text chunks are allowed after the image data; drain to IEND and
    // look again.
    reader.finish()?;
    find_description(reader.info())
}

fn find_description(info: &png::Info<'_>) -> Result<Option<String>> {
    for chunk in &info.uncompressed_latin1_text {
        if chunk.keyword == DESCRIPTION_KEYWORD {
            return Ok(Some(chunk.text.clone()));
        }
    }
    for chunk in &info.compressed_latin1_text {
        if chunk.keyword == DESCRIPTION_KEYWORD {
            return Ok(Some(chunk.get_text()?));
        }
    }
    for chunk in &info.utf8_text {
        if chunk.keyword == DESCRIPTION_KEYWORD {
            return Ok(Some(chunk.get_text()?));
        }
    }
    Ok(None)
}

/// Encode a canvas plus directive block to `path`.
///
/// Parent directories are created as needed.
pub fn write_sheet_png(path: &Path, canvas: &RgbaImage, description: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let mut encoder = png::Encoder::new(writer, canvas.width(), canvas.height());
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    encoder.add_ztxt_chunk(DESCRIPTION_KEYWORD.to_string(), description.to_string())?;

    let mut writer = encoder.write_header()?;
    writer.write_image_data(canvas.as_raw())?;
    Ok(())
}
