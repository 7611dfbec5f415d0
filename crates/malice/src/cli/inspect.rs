//! The `malice inspect` command.

use std::path::PathBuf;

use clap::Args;

/// Arguments for the `inspect` command.
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Image file to inspect
    pub file: PathBuf,

    /// Single-line JSON instead of pretty-printed
    #[arg(long)]
    pub compact: bool,
}

/// Print the inspection report for one file as JSON on stdout.
pub fn execute(args: InspectArgs) -> anyhow::Result<()> {
    let report = malice_core::metadata::inspect(&args.file)?;
    if let Some(err) = &report.exif_error {
        tracing::warn!("EXIF block of {:?} could not be read: {err}", args.file);
    }
    println!(
        "{}",
        malice_core::output::to_json(&report, !args.compact)?
    );
    Ok(())
}
