//! dmiscale - command-line batch upscaler for DMI sprite sheets.

use std::process::ExitCode;

use dmiscale::cli;

fn main() -> ExitCode {
    cli::run()
}
