//! Command-line interface for the dmiscale batch converter.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::pipeline::{self, BatchSummary, PipelineConfig};
use crate::scale::ScaleFilter;
use crate::{metadata, parser};

pub(crate) const EXIT_SUCCESS: u8 = 0;
pub(crate) const EXIT_ERROR: u8 = 1;

/// Batch upscaler for DMI sprite sheets
#[derive(Parser)]
#[command(name = "dmiscale")]
#[command(about = "Batch upscaler for DMI sprite sheets - decode, retile, upscale, repack")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

fn parse_factor(s: &str) -> Result<u32, String> {
    match s {
        "2" => Ok(2),
        "4" => Ok(4),
        _ => Err("scale factor must be 2 or 4".to_string()),
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Extract, upscale, and rebuild every sheet under a directory
    Convert {
        /// Directory searched recursively for .dmi files
        input: PathBuf,
        /// Output root: workspace under raw/, results under processed/
        output: PathBuf,
        /// Upscale factor (2 or 4)
        #[arg(long, default_value = "2", value_parser = parse_factor)]
        scale: u32,
        /// Upscaling filter
        #[arg(long, value_enum, default_value_t = ScaleFilter::Scale2x)]
        filter: ScaleFilter,
        /// Process files in parallel, one worker per sheet
        #[arg(short = 'p', long)]
        parallel: bool,
    },
    /// Extract and upscale only, parking per-tile images under
    /// <output>/raw for external editing or out-of-process upscaling
    Extract {
        input: PathBuf,
        output: PathBuf,
        #[arg(long, default_value = "2", value_parser = parse_factor)]
        scale: u32,
        #[arg(long, value_enum, default_value_t = ScaleFilter::Scale2x)]
        filter: ScaleFilter,
        #[arg(short = 'p', long)]
        parallel: bool,
    },
    /// Rebuild sheets from a previously extracted <output>/raw workspace
    Rebuild {
        /// Output root of a prior extract run
        output: PathBuf,
        #[arg(short = 'p', long)]
        parallel: bool,
    },
    /// Print the directive summary of a single sheet
    Info {
        /// A .dmi file
        file: PathBuf,
    },
}

/// Parse arguments and dispatch. Entry point for the binary.
pub fn run() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Commands::Convert { input, output, scale, filter, parallel } => {
            let config = PipelineConfig { input, output, scale, filter, parallel };
            let summary = pipeline::run(&config);
            report(&summary)
        }
        Commands::Extract { input, output, scale, filter, parallel } => {
            let config = PipelineConfig { input, output, scale, filter, parallel };
            let (summary, parked) = pipeline::run_extract(&config);
            println!(
                "extracted {} sheet(s) into {}",
                parked.len(),
                config.output.join("raw").display()
            );
            report(&summary)
        }
        Commands::Rebuild { output, parallel } => {
            let parked = pipeline::find_parked_sheets(&output);
            if parked.is_empty() {
                eprintln!(
                    "no extracted sheets found under {}",
                    output.join("raw").display()
                );
                return ExitCode::from(EXIT_ERROR);
            }
            let summary = pipeline::run_rebuild(&output, &parked, parallel);
            report(&summary)
        }
        Commands::Info { file } => run_info(&file),
    }
}

fn report(summary: &BatchSummary) -> ExitCode {
    println!(
        "{} extracted, {} rebuilt, {} skipped, {} failed",
        summary.extracted, summary.rebuilt, summary.skipped, summary.failed
    );
    if summary.failed > 0 {
        ExitCode::from(EXIT_ERROR)
    } else {
        ExitCode::from(EXIT_SUCCESS)
    }
}

fn run_info(file: &Path) -> ExitCode {
    let name = file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "sheet".to_string());

    let block = match metadata::read_description(file) {
        Ok(Some(block)) => block,
        Ok(None) => {
            eprintln!("{}: no Description text chunk found", file.display());
            return ExitCode::from(EXIT_ERROR);
        }
        Err(e) => {
            eprintln!("{}: {}", file.display(), e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let sheet = match parser::parse_sheet(&name, &block) {
        Ok(sheet) => sheet,
        Err(e) => {
            eprintln!("{}: {}", file.display(), e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    println!(
        "{}: version {}, {}x{} tiles, {} state(s), {} tile(s)",
        sheet.name,
        sheet.version,
        sheet.width,
        sheet.height,
        sheet.states.len(),
        sheet.declared_tiles()
    );
    for state in &sheet.states {
        let delays = if state.delays.is_empty() {
            String::new()
        } else {
            format!(
                ", delay {}",
                state
                    .delays
                    .iter()
                    .map(f32::to_string)
                    .collect::<Vec<_>>()
                    .join(",")
            )
        };
        let rewind = if state.rewind { ", rewind" } else { "" };
        println!(
            "  \"{}\": {} dir(s) x {} frame(s){}{}",
            state.name, state.dirs, state.frames, delays, rewind
        );
    }
    ExitCode::from(EXIT_SUCCESS)
}
