//! Batch pipeline: discover sheets, extract and upscale tiles, rebuild.
//!
//! The conversion is two strict phases per sheet. Extraction decodes
//! the directive block and the packed canvas, upscales every tile, and
//! parks the result in the workspace (`<out>/raw/...`). Rebuild reads
//! the workspace back - after any out-of-process tile replacement - and
//! packs a fresh sheet into `<out>/processed/...`. A failure in either
//! phase is reported with the file identity and never aborts sibling
//! sheets.

use crate::error::{DmiError, Result};
use crate::scale::{self, ScaleFilter};
use crate::{metadata, parser, serializer, store, tiler};
use glob::glob;
use rayon::prelude::*;
use std::path::{Path, PathBuf};

/// Batch configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Directory searched recursively for `.dmi` files.
    pub input: PathBuf,
    /// Output root; workspace goes to `raw/`, results to `processed/`.
    pub output: PathBuf,
    /// Upscale factor, 2 or 4.
    pub scale: u32,
    pub filter: ScaleFilter,
    /// One rayon worker per file instead of a sequential walk.
    pub parallel: bool,
}

/// Counts for one batch run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BatchSummary {
    pub extracted: usize,
    pub skipped: usize,
    pub rebuilt: usize,
    pub failed: usize,
}

/// Find all `.dmi` files under `dir`, recursively, in stable order.
pub fn find_dmi_files(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    if let Ok(paths) = glob(&format!("{}/**/*.dmi", dir.display())) {
        files.extend(paths.filter_map(std::result::Result::ok));
    }
    files.sort();
    files
}

fn is_power_of_two(n: u32) -> bool {
    n != 0 && n & (n - 1) == 0
}

/// Validity gate: a sheet enters the pipeline unless *neither* tile
/// dimension is a power of two. This matches the original tooling's
/// observed behavior and stays as-is for compatibility.
pub fn passes_gate(width: u32, height: u32) -> bool {
    is_power_of_two(width) || is_power_of_two(height)
}

/// Phase 1 for one file: decode, gate, extract, upscale, park.
///
/// Returns the sheet's workspace directory, or `None` when the gate
/// skipped the sheet.
pub fn extract_file(
    file: &Path,
    input_root: &Path,
    raw_root: &Path,
    factor: u32,
    filter: ScaleFilter,
) -> Result<Option<PathBuf>> {
    let name = file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "sheet".to_string());

    let block = metadata::read_description(file)?
        .ok_or_else(|| DmiError::MissingDescription(file.to_path_buf()))?;
    let mut sheet = parser::parse_sheet(&name, &block)?;

    if !passes_gate(sheet.width, sheet.height) {
        return Ok(None);
    }

    // `.dmi` is not a recognized extension, so sniff the PNG content
    // instead of letting `image::open` guess from the path.
    let canvas = image::io::Reader::open(file)?
        .with_guessed_format()?
        .decode()?
        .to_rgba8();
    tiler::extract_tiles(&mut sheet, &canvas)?;

    for state in &mut sheet.states {
        for frame in &mut state.frame_data {
            for tile in &mut frame.images {
                tile.pixels = scale::upscale(&tile.pixels, factor, filter);
            }
        }
    }

    let rel_dir = file
        .parent()
        .and_then(|p| p.strip_prefix(input_root).ok())
        .unwrap_or_else(|| Path::new(""));
    let sheet_dir = raw_root.join(rel_dir).join(&sheet.name);
    store::save_sheet(&sheet_dir, &sheet, factor)?;
    Ok(Some(sheet_dir))
}

/// Phase 2 for one workspace directory: reload, pack, re-embed, write.
pub fn rebuild_file(
    sheet_dir: &Path,
    raw_root: &Path,
    processed_root: &Path,
) -> Result<PathBuf> {
    let manifest = store::load_manifest(sheet_dir)?;
    let mut sheet = manifest.sheet;
    // Tiles on disk are already upscaled; the metadata catches up here.
    sheet.width *= manifest.scale;
    sheet.height *= manifest.scale;
    store::load_tiles(&mut sheet, sheet_dir)?;

    let packed = tiler::pack_tiles(&sheet)?;
    let block = serializer::serialize_sheet(&sheet);

    let rel = sheet_dir.strip_prefix(raw_root).unwrap_or(sheet_dir);
    let out_path = processed_root.join(rel).with_extension("dmi");
    metadata::write_sheet_png(&out_path, &packed.canvas, &block)?;
    Ok(out_path)
}

enum ExtractOutcome {
    Parked(PathBuf),
    Skipped,
    Failed,
}

/// Find every parked sheet workspace (directories holding a manifest)
/// under `<output>/raw`, in stable order.
pub fn find_parked_sheets(output: &Path) -> Vec<PathBuf> {
    let raw_root = output.join("raw");
    let mut dirs = Vec::new();
    if let Ok(paths) = glob(&format!(
        "{}/**/{}",
        raw_root.display(),
        store::MANIFEST_FILE
    )) {
        dirs.extend(
            paths
                .filter_map(std::result::Result::ok)
                .filter_map(|p| p.parent().map(Path::to_path_buf)),
        );
    }
    dirs.sort();
    dirs
}

/// Phase 1 over every discovered file. Returns the summary so far and
/// the workspace directories of the parked sheets.
pub fn run_extract(config: &PipelineConfig) -> (BatchSummary, Vec<PathBuf>) {
    let files = find_dmi_files(&config.input);
    let raw_root = config.output.join("raw");

    let extract_one = |file: &PathBuf| -> ExtractOutcome {
        match extract_file(file, &config.input, &raw_root, config.scale, config.filter) {
            Ok(Some(dir)) => {
                println!("extracted {}", file.display());
                ExtractOutcome::Parked(dir)
            }
            Ok(None) => {
                println!("skipped {} (tile size gate)", file.display());
                ExtractOutcome::Skipped
            }
            Err(e) => {
                eprintln!("{}: {}", file.display(), e);
                ExtractOutcome::Failed
            }
        }
    };

    let outcomes: Vec<ExtractOutcome> = if config.parallel {
        files.par_iter().map(extract_one).collect()
    } else {
        files.iter().map(extract_one).collect()
    };

    let mut summary = BatchSummary::default();
    let mut parked = Vec::new();
    for outcome in outcomes {
        match outcome {
            ExtractOutcome::Parked(dir) => {
                summary.extracted += 1;
                parked.push(dir);
            }
            ExtractOutcome::Skipped => summary.skipped += 1,
            ExtractOutcome::Failed => summary.failed += 1,
        }
    }
    (summary, parked)
}

/// Phase 2 over a set of parked sheet workspaces.
pub fn run_rebuild(output: &Path, parked: &[PathBuf], parallel: bool) -> BatchSummary {
    let raw_root = output.join("raw");
    let processed_root = output.join("processed");

    let rebuild_one = |dir: &PathBuf| -> bool {
        match rebuild_file(dir, &raw_root, &processed_root) {
            Ok(out) => {
                println!("rebuilt {}", out.display());
                true
            }
            Err(e) => {
                eprintln!("{}: {}", dir.display(), e);
                false
            }
        }
    };

    let rebuilt: Vec<bool> = if parallel {
        parked.par_iter().map(rebuild_one).collect()
    } else {
        parked.iter().map(rebuild_one).collect()
    };

    let mut summary = BatchSummary::default();
    for ok in rebuilt {
        if ok {
            summary.rebuilt += 1;
        } else {
            summary.failed += 1;
        }
    }
    summary
}

/// Run the full batch: phase 1 over every discovered file, then phase 2
/// over the sheets that phase 1 parked.
pub fn run(config: &PipelineConfig) -> BatchSummary {
    let (mut summary, parked) = run_extract(config);
    let rebuild = run_rebuild(&config.output, &parked, config.parallel);
    summary.rebuilt = rebuild.rebuilt;
    summary.failed += rebuild.failed;
    summary
}
