//! Status command - outage status of a street.

use anyhow::Result;
use clap::Args;
use tracing::info;

use crate::context::Context;
use crate::output::{JsonFormatter, StatusOutput, TextFormatter};
use crate::{Cli, OutputFormat};

/// Arguments for the status command.
#[derive(Args)]
pub struct StatusArgs {
    /// Location name exactly as listed by `dtek locations`.
    pub location: String,

    /// Street name exactly as listed by `dtek streets`.
    pub street: String,
}

/// Runs the status command.
pub async fn run(args: &StatusArgs, ctx: &Context, cli: &Cli) -> Result<()> {
    info!(region = %cli.region, location = %args.location, street = %args.street, "Fetching status");
    let store = ctx.region(cli).await;
    let report = ctx
        .retry
        .run(|| store.get_status(&args.location, &args.street))
        .await?;

    let output = match cli.format {
        OutputFormat::Text => TextFormatter::new(!cli.no_color).format_report(&report),
        OutputFormat::Json => JsonFormatter::new(cli.pretty).format(&StatusOutput {
            region: cli.region,
            report: &report,
        })?,
    };
    println!("{output}");
    Ok(())
}
