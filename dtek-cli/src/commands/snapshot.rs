//! Snapshot command - capture the parsed directory and its cookies.
//!
//! The printed JSON is the read-through store format, so the output of
//! `dtek snapshot` can be dropped into `store.dir` as `<region>.json`.

use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::Args;
use dtek_parser::parse_directory;
use dtek_store::{JsonDirStore, StoredSession};
use tracing::info;

use crate::context::Context;
use crate::output::JsonFormatter;
use crate::Cli;

/// Arguments for the snapshot command.
#[derive(Args)]
pub struct SnapshotArgs {
    /// Also write the snapshot into the store directory.
    #[arg(long)]
    pub save: bool,

    /// Store directory (defaults to `store.dir` from the configuration).
    #[arg(long)]
    pub dir: Option<PathBuf>,
}

/// Runs the snapshot command. Always reads the live upstream page.
pub async fn run(args: &SnapshotArgs, ctx: &Context, cli: &Cli) -> Result<()> {
    let region = cli.region;
    info!(region = %region, "Capturing snapshot");

    let session = ctx
        .retry
        .run(|| async {
            let page = ctx.upstream.fetch_directory(region).await?;
            let snapshot = parse_directory(&page.body, Some(region))?;
            Ok(StoredSession {
                snapshot,
                cookies: page.cookies,
            })
        })
        .await?;

    if args.save {
        let Some(dir) = args.dir.clone().or_else(|| ctx.config.store.dir.clone()) else {
            bail!("--save needs --dir or store.dir in the configuration");
        };
        let store = JsonDirStore::new(dir);
        store.save(region, &session).await?;
        info!(path = %store.path_for(region).display(), "Snapshot saved");
    }

    // Snapshots are always JSON; --format only affects the other commands.
    println!("{}", JsonFormatter::new(cli.pretty).format(&session)?);
    Ok(())
}
