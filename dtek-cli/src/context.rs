//! Shared wiring for commands: configuration, upstream client, region
//! registry and the boundary retry strategy.

use std::sync::Arc;

use anyhow::{Context as _, Result};
use dtek_fetch::{DtekUpstream, RetryStrategy, Upstream};
use dtek_store::{Config, JsonDirStore, RegionRegistry, RegionStore};
use tracing::{debug, warn};

use crate::Cli;

/// Everything a command needs to reach the upstream.
pub struct Context {
    /// Loaded configuration.
    pub config: Config,
    /// Upstream client shared by every region.
    pub upstream: Arc<dyn Upstream>,
    /// Region facades.
    pub registry: RegionRegistry,
    /// Retry strategy wrapped around every public read.
    pub retry: RetryStrategy,
}

impl Context {
    /// Loads configuration and builds the clients.
    pub fn build(cli: &Cli) -> Result<Self> {
        let config = match &cli.config {
            Some(path) => {
                let mut config = Config::load_from(path)
                    .with_context(|| format!("loading {}", path.display()))?;
                config.apply_overrides(|key| std::env::var(key).ok());
                config.validate()?;
                config
            }
            None => Config::load().context("loading configuration")?,
        };
        debug!(?config, "Configuration ready");

        let upstream: Arc<dyn Upstream> = Arc::new(DtekUpstream::new(config.upstream_config())?);

        let mut registry = RegionRegistry::new(Arc::clone(&upstream), config.facade_config());
        if let Some(dir) = &config.store.dir {
            debug!(dir = %dir.display(), "Reading sessions through snapshot store");
            registry = registry.with_snapshot_store(Arc::new(JsonDirStore::new(dir)));
        }

        let retry = config
            .retry_strategy()
            .with_observer(|attempt, error, delay| {
                warn!(
                    attempt,
                    delay_ms = delay.as_millis(),
                    error = %error,
                    "Request failed, retrying"
                );
            });

        Ok(Self {
            config,
            upstream,
            registry,
            retry,
        })
    }

    /// The facade of the selected region.
    pub async fn region(&self, cli: &Cli) -> Arc<RegionStore> {
        self.registry.get(cli.region).await
    }
}
