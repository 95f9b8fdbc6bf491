//! Locations and streets commands.

use anyhow::Result;
use clap::Args;
use tracing::info;

use crate::context::Context;
use crate::output::{JsonFormatter, LocationsOutput, StreetsOutput, TextFormatter};
use crate::{Cli, OutputFormat};

/// Arguments for the streets command.
#[derive(Args)]
pub struct StreetsArgs {
    /// Location name exactly as listed by `dtek locations`.
    pub location: String,
}

/// Runs the locations command.
pub async fn run_locations(ctx: &Context, cli: &Cli) -> Result<()> {
    info!(region = %cli.region, "Listing locations");
    let store = ctx.region(cli).await;
    let locations = ctx.retry.run(|| store.get_locations()).await?;

    let output = match cli.format {
        OutputFormat::Text => TextFormatter::new(!cli.no_color)
            .format_list(&format!("{} locations", cli.region.display_name()), &locations),
        OutputFormat::Json => JsonFormatter::new(cli.pretty).format(&LocationsOutput {
            region: cli.region,
            locations: &locations,
        })?,
    };
    println!("{output}");
    Ok(())
}

/// Runs the streets command.
pub async fn run_streets(args: &StreetsArgs, ctx: &Context, cli: &Cli) -> Result<()> {
    info!(region = %cli.region, location = %args.location, "Listing streets");
    let store = ctx.region(cli).await;
    let streets = ctx
        .retry
        .run(|| store.get_streets(&args.location))
        .await?;

    let output = match cli.format {
        OutputFormat::Text => {
            TextFormatter::new(!cli.no_color).format_list(&args.location, &streets)
        }
        OutputFormat::Json => JsonFormatter::new(cli.pretty).format(&StreetsOutput {
            region: cli.region,
            location: &args.location,
            streets: &streets,
        })?,
    };
    println!("{output}");
    Ok(())
}
