//! Regions command - list supported regions.

use anyhow::Result;
use dtek_core::Region;

use crate::output::{JsonFormatter, TextFormatter};
use crate::{Cli, OutputFormat};

/// Runs the regions command. Needs no network access.
pub fn run(cli: &Cli) -> Result<()> {
    let regions = Region::all();
    let output = match cli.format {
        OutputFormat::Text => TextFormatter::new(!cli.no_color).format_regions(regions),
        OutputFormat::Json => JsonFormatter::new(cli.pretty).format_regions(regions)?,
    };
    println!("{output}");
    Ok(())
}
