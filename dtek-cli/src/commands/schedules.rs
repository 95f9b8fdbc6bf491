//! Schedules command - weekly outage schedules of groups.

use anyhow::Result;
use clap::Args;
use tracing::info;

use crate::context::Context;
use crate::output::{JsonFormatter, SchedulesOutput, TextFormatter};
use crate::{Cli, OutputFormat};

/// Arguments for the schedules command.
#[derive(Args)]
pub struct SchedulesArgs {
    /// Group ids such as GPV1.1; shown by `dtek status`.
    #[arg(required = true)]
    pub groups: Vec<String>,
}

/// Runs the schedules command.
pub async fn run(args: &SchedulesArgs, ctx: &Context, cli: &Cli) -> Result<()> {
    info!(region = %cli.region, groups = ?args.groups, "Fetching schedules");
    let store = ctx.region(cli).await;
    let table = ctx
        .retry
        .run(|| store.get_schedules(&args.groups))
        .await?;

    let output = match cli.format {
        OutputFormat::Text => TextFormatter::new(!cli.no_color).format_table(&table),
        OutputFormat::Json => JsonFormatter::new(cli.pretty).format(&SchedulesOutput {
            region: cli.region,
            schedules: &table,
        })?,
    };
    println!("{output}");
    Ok(())
}
