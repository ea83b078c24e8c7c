//! Tiling: mapping the sprite description onto pixel rectangles.
//!
//! Extraction walks the packed source canvas as one continuous raster
//! (state -> frame -> direction, no padding anywhere) and cuts each
//! tile out into its own image. Packing is the inverse walk into a
//! fresh canvas, with one deliberate quirk: rows fill bottom-up and
//! every tile is written vertically mirrored. That layout is what the
//! format's downstream consumers expect, so it is reproduced exactly
//! rather than replaced with a plain top-down copy.

use crate::error::FormatError;
use crate::models::{Direction, DirectionImage, Frame, Sheet};
use image::{imageops, RgbaImage};

/// Where one tile landed in the packed canvas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TilePlacement {
    pub state: usize,
    pub frame: usize,
    pub dir: Direction,
    /// Top-left corner of the tile's destination rectangle.
    pub x: u32,
    pub y: u32,
}

/// A packed canvas plus the destination coordinate of every tile.
#[derive(Debug)]
pub struct PackedSheet {
    pub canvas: RgbaImage,
    pub placements: Vec<TilePlacement>,
}

/// Maximum tiles per packed row.
const MAX_COLUMNS: u32 = 10;

/// Populate every state's frame tree with tiles cut from `canvas`.
///
/// The cursor starts at the canvas origin and advances one tile width
/// per direction image, wrapping to the next row when the remaining
/// width cannot hold another tile. Tiles are strictly consecutive:
/// state and frame boundaries do not realign the cursor. Walking off
/// the bottom of the canvas is a [`FormatError::Truncated`] failure,
/// and the sheet is left untouched on any error.
pub fn extract_tiles(sheet: &mut Sheet, canvas: &RgbaImage) -> Result<(), FormatError> {
    let (canvas_w, canvas_h) = canvas.dimensions();
    let (tile_w, tile_h) = (sheet.width, sheet.height);
    if tile_w > canvas_w {
        return Err(FormatError::truncated(format!(
            "canvas width {canvas_w} cannot hold a {tile_w}px tile"
        )));
    }

    // Cut everything first and only attach to the sheet once the whole
    // walk has succeeded, so a truncated canvas never emits a partial
    // sheet.
    let mut extracted = Vec::with_capacity(sheet.states.len());
    let mut x = 0u32;
    let mut y = 0u32;
    for state in &sheet.states {
        let mut frames = Vec::with_capacity(state.frames as usize);
        for i in 0..state.frames {
            let mut frame = Frame::new(state.delay_for(i));
            for &dir in state.directions() {
                if x + tile_w > canvas_w {
                    x = 0;
                    y += tile_h;
                }
                if y + tile_h > canvas_h {
                    return Err(FormatError::truncated(format!(
                        "tile data for state \"{}\" frame {i} runs past the \
                         {canvas_w}x{canvas_h} canvas",
                        state.name
                    )));
                }
                let tile = imageops::crop_imm(canvas, x, y, tile_w, tile_h).to_image();
                frame.push(DirectionImage::new(dir, tile));
                x += tile_w;
            }
            frames.push(frame);
        }
        extracted.push(frames);
    }
    for (state, frames) in sheet.states.iter_mut().zip(extracted) {
        state.frame_data = frames;
    }
    Ok(())
}

/// Pack every populated tile into a new canvas.
///
/// Layout: `columns = min(10, total)`, canvas width `tileW * columns`,
/// height `tileH * ceil(total / columns)`. Tiles land in the same order
/// the extraction walk produced them, but the first row sits at the
/// bottom of the canvas and rows fill upward, with each tile mirrored
/// about its horizontal axis (`dest row = baseline - src row`). Unused
/// trailing cells stay fully transparent.
pub fn pack_tiles(sheet: &Sheet) -> Result<PackedSheet, FormatError> {
    let total = sheet.packed_tiles();
    if total == 0 {
        return Err(FormatError::truncated("no tiles populated for packing"));
    }
    let (tile_w, tile_h) = (sheet.width, sheet.height);
    let columns = total.min(MAX_COLUMNS);
    let rows = total.div_ceil(columns);
    let canvas_w = tile_w * columns;
    let canvas_h = tile_h * rows;

    // A fresh RgbaImage is zero-filled, i.e. fully transparent.
    let mut canvas = RgbaImage::new(canvas_w, canvas_h);
    let mut placements = Vec::with_capacity(total as usize);

    let mut index = 0u32;
    for (state_idx, state) in sheet.states.iter().enumerate() {
        for (frame_idx, frame) in state.frame_data.iter().enumerate() {
            for tile in &frame.images {
                if tile.pixels.dimensions() != (tile_w, tile_h) {
                    return Err(FormatError::truncated(format!(
                        "tile for state \"{}\" frame {frame_idx} is {}x{}, \
                         expected {tile_w}x{tile_h}",
                        state.name,
                        tile.pixels.width(),
                        tile.pixels.height()
                    )));
                }

                let col = index % columns;
                let row = index / columns;
                let dest_x = col * tile_w;
                // Rows fill bottom-up; the baseline is the bottom
                // scanline of this tile's cell.
                let baseline = canvas_h - row * tile_h - 1;
                for src_y in 0..tile_h {
                    for src_x in 0..tile_w {
                        let px = *tile.pixels.get_pixel(src_x, src_y);
                        canvas.put_pixel(dest_x + src_x, baseline - src_y, px);
                    }
                }
                placements.push(TilePlacement {
                    state: state_idx,
                    frame: frame_idx,
                    dir: tile.dir,
                    x: dest_x,
                    y: baseline + 1 - tile_h,
                });
                index += 1;
            }
        }
    }

    Ok(PackedSheet { canvas, placements })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::State;
    use image::Rgba;

    /// Sheet with one state of `dirs x frames`, tiles `w x h`.
    fn metadata_sheet(dirs: u32, frames: u32, w: u32, h: u32) -> Sheet {
        let mut sheet = Sheet::new("test");
        sheet.width = w;
        sheet.height = h;
        sheet.push_state(State::new("s".into(), dirs, frames, vec![], false).unwrap());
        sheet
    }

    /// Canvas of `cols x rows` solid tiles, each tile a unique color.
    fn numbered_canvas(cols: u32, rows: u32, tile: u32) -> RgbaImage {
        let mut canvas = RgbaImage::new(cols * tile, rows * tile);
        for (i, (ty, tx)) in (0..rows)
            .flat_map(|r| (0..cols).map(move |c| (r, c)))
            .enumerate()
        {
            let color = Rgba([i as u8, 0, 0, 255]);
            for y in 0..tile {
                for x in 0..tile {
                    canvas.put_pixel(tx * tile + x, ty * tile + y, color);
                }
            }
        }
        canvas
    }

    #[test]
    fn test_extraction_order_and_dir_count() {
        for dirs in [1u32, 2, 4, 8] {
            let mut sheet = metadata_sheet(dirs, 2, 8, 8);
            let canvas = numbered_canvas(8, 2, 8);
            extract_tiles(&mut sheet, &canvas).unwrap();

            let state = &sheet.states[0];
            assert_eq!(state.frame_data.len(), 2);
            for frame in &state.frame_data {
                assert_eq!(frame.images.len(), dirs as usize);
                let got: Vec<Direction> = frame.images.iter().map(|t| t.dir).collect();
                assert_eq!(got.as_slice(), state.directions());
            }
        }
    }

    #[test]
    fn test_extraction_is_a_continuous_raster_walk() {
        // Two states (3 + 2 tiles) over a 4-column canvas: tiles 0..4
        // on the first row, tile 4 wrapping to the second.
        let mut sheet = Sheet::new("walk");
        sheet.width = 8;
        sheet.height = 8;
        sheet.push_state(State::new("a".into(), 1, 3, vec![], false).unwrap());
        sheet.push_state(State::new("b".into(), 2, 1, vec![], false).unwrap());
        let canvas = numbered_canvas(4, 2, 8);

        extract_tiles(&mut sheet, &canvas).unwrap();

        let seen: Vec<u8> = sheet
            .states
            .iter()
            .flat_map(|s| s.frame_data.iter())
            .flat_map(|f| f.images.iter())
            .map(|t| t.pixels.get_pixel(0, 0)[0])
            .collect();
        assert_eq!(seen, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_extraction_resolves_delays() {
        let mut sheet = metadata_sheet(1, 3, 8, 8);
        sheet.states[0].delays = vec![5.0];
        let canvas = numbered_canvas(3, 1, 8);
        extract_tiles(&mut sheet, &canvas).unwrap();
        for frame in &sheet.states[0].frame_data {
            assert_eq!(frame.delay, 5.0);
        }
    }

    #[test]
    fn test_extraction_truncated_canvas() {
        // 4 dirs x 2 frames = 8 tiles, but the canvas only holds 4.
        let mut sheet = metadata_sheet(4, 2, 8, 8);
        let canvas = numbered_canvas(4, 1, 8);
        assert!(matches!(
            extract_tiles(&mut sheet, &canvas),
            Err(FormatError::Truncated(_))
        ));
    }

    #[test]
    fn test_extraction_canvas_narrower_than_tile() {
        let mut sheet = metadata_sheet(1, 1, 32, 32);
        let canvas = RgbaImage::new(16, 64);
        assert!(matches!(
            extract_tiles(&mut sheet, &canvas),
            Err(FormatError::Truncated(_))
        ));
    }

    #[test]
    fn test_packing_canvas_dimensions_23_tiles() {
        // 23 tiles at 32x32: 10 columns, 3 rows, 320x96 canvas.
        let mut sheet = metadata_sheet(1, 23, 32, 32);
        let canvas = numbered_canvas(10, 3, 32);
        extract_tiles(&mut sheet, &canvas).unwrap();

        let packed = pack_tiles(&sheet).unwrap();
        assert_eq!(packed.canvas.dimensions(), (320, 96));
        assert_eq!(packed.placements.len(), 23);

        // The last 7 cells of the final row are transparent. Rows fill
        // bottom-up, so the final (partial) row is the topmost one.
        for cell in 3..10u32 {
            for y in 0..32 {
                for x in 0..32 {
                    let px = packed.canvas.get_pixel(cell * 32 + x, y);
                    assert_eq!(px[3], 0, "cell {cell} not transparent");
                }
            }
        }
    }

    #[test]
    fn test_packing_fewer_than_ten_tiles_narrows_canvas() {
        let mut sheet = metadata_sheet(1, 3, 8, 8);
        let canvas = numbered_canvas(3, 1, 8);
        extract_tiles(&mut sheet, &canvas).unwrap();
        let packed = pack_tiles(&sheet).unwrap();
        assert_eq!(packed.canvas.dimensions(), (24, 8));
    }

    #[test]
    fn test_packing_vertical_inversion() {
        // One tile whose top scanline is marked: after packing, the
        // mark must sit on the canvas's bottom scanline.
        let mut sheet = metadata_sheet(1, 1, 4, 4);
        let mut tile = RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 255]));
        tile.put_pixel(1, 0, Rgba([255, 0, 0, 255]));
        let mut frame = Frame::new(0.0);
        frame.push(DirectionImage::new(Direction::South, tile));
        sheet.states[0].frame_data = vec![frame];

        let packed = pack_tiles(&sheet).unwrap();
        assert_eq!(packed.canvas.get_pixel(1, 3), &Rgba([255, 0, 0, 255]));
        assert_eq!(packed.canvas.get_pixel(1, 0), &Rgba([0, 0, 0, 255]));
        assert_eq!(packed.placements[0].x, 0);
        assert_eq!(packed.placements[0].y, 0);
    }

    #[test]
    fn test_pack_then_unpack_restores_tiles() {
        let mut sheet = metadata_sheet(4, 3, 8, 8);
        let source = numbered_canvas(6, 2, 8);
        extract_tiles(&mut sheet, &source).unwrap();
        let packed = pack_tiles(&sheet).unwrap();

        // Undo the documented inversion by reading each placement
        // bottom-up and compare against the original tiles.
        let tiles: Vec<&DirectionImage> = sheet
            .states
            .iter()
            .flat_map(|s| s.frame_data.iter())
            .flat_map(|f| f.images.iter())
            .collect();
        assert_eq!(tiles.len(), packed.placements.len());

        for (tile, place) in tiles.iter().zip(&packed.placements) {
            for y in 0..8u32 {
                for x in 0..8u32 {
                    let expected = tile.pixels.get_pixel(x, y);
                    let actual = packed.canvas.get_pixel(place.x + x, place.y + 7 - y);
                    assert_eq!(expected, actual);
                }
            }
        }
    }

    #[test]
    fn test_packing_rejects_empty_sheet() {
        let sheet = metadata_sheet(1, 0, 32, 32);
        assert!(matches!(
            pack_tiles(&sheet),
            Err(FormatError::Truncated(_))
        ));
    }

    #[test]
    fn test_packing_rejects_mismatched_tile() {
        let mut sheet = metadata_sheet(1, 1, 8, 8);
        let mut frame = Frame::new(0.0);
        frame.push(DirectionImage::new(Direction::South, RgbaImage::new(4, 4)));
        sheet.states[0].frame_data = vec![frame];
        assert!(matches!(
            pack_tiles(&sheet),
            Err(FormatError::Truncated(_))
        ));
    }

    #[test]
    fn test_placements_follow_raster_order() {
        let mut sheet = metadata_sheet(2, 2, 8, 8);
        let canvas = numbered_canvas(4, 1, 8);
        extract_tiles(&mut sheet, &canvas).unwrap();
        let packed = pack_tiles(&sheet).unwrap();

        let coords: Vec<(u32, u32)> = packed.placements.iter().map(|p| (p.x, p.y)).collect();
        assert_eq!(coords, vec![(0, 0), (8, 0), (16, 0), (24, 0)]);
        assert_eq!(packed.placements[0].dir, Direction::South);
        assert_eq!(packed.placements[1].dir, Direction::North);
        assert_eq!(packed.placements[2].frame, 1);
    }
}
