//! Region registry.
//!
//! One [`RegionStore`] per region, created on first use and kept for the
//! life of the registry. All facades share one upstream client and one
//! configuration; no session state is shared between regions.

use std::collections::HashMap;
use std::sync::Arc;

use dtek_core::Region;
use dtek_fetch::Upstream;
use tokio::sync::Mutex;
use tracing::debug;

use crate::region_store::{FacadeConfig, RegionStore};
use crate::snapshot_store::SnapshotStore;

/// Lazily populated map of region facades.
pub struct RegionRegistry {
    upstream: Arc<dyn Upstream>,
    snapshots: Option<Arc<dyn SnapshotStore>>,
    config: FacadeConfig,
    stores: Mutex<HashMap<Region, Arc<RegionStore>>>,
}

impl RegionRegistry {
    /// Creates an empty registry.
    pub fn new(upstream: Arc<dyn Upstream>, config: FacadeConfig) -> Self {
        Self {
            upstream,
            snapshots: None,
            config,
            stores: Mutex::new(HashMap::new()),
        }
    }

    /// Makes every facade read sessions through `store`.
    #[must_use]
    pub fn with_snapshot_store(mut self, store: Arc<dyn SnapshotStore>) -> Self {
        self.snapshots = Some(store);
        self
    }

    /// Returns the facade of a region, creating it on first use.
    pub async fn get(&self, region: Region) -> Arc<RegionStore> {
        let mut stores = self.stores.lock().await;
        let store = stores.entry(region).or_insert_with(|| {
            debug!(region = %region, "Creating region facade");
            let mut store = RegionStore::new(region, Arc::clone(&self.upstream), self.config);
            if let Some(snapshots) = &self.snapshots {
                store = store.with_snapshot_store(Arc::clone(snapshots));
            }
            Arc::new(store)
        });
        Arc::clone(store)
    }

    /// Regions whose facade has been created.
    pub async fn active_regions(&self) -> Vec<Region> {
        let mut regions: Vec<Region> = self.stores.lock().await.keys().copied().collect();
        regions.sort();
        regions
    }
}

impl std::fmt::Debug for RegionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegionRegistry")
            .field("config", &self.config)
            .field("read_through", &self.snapshots.is_some())
            .finish_non_exhaustive()
    }
}
