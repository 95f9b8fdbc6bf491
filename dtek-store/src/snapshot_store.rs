//! Read-through snapshot store.
//!
//! When configured, a region's session is built from a precomputed snapshot
//! instead of the upstream page. The store is read-only from the facade's
//! point of view; [`JsonDirStore::save`] exists for the operator tooling that
//! fills it.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use dtek_core::{DirectorySnapshot, DtekError, Region};
use dtek_fetch::CookieJar;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

// ============================================================================
// Stored Session
// ============================================================================

/// What the store holds per region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredSession {
    /// The parsed directory.
    pub snapshot: DirectorySnapshot,
    /// Cookies the directory page set.
    #[serde(default)]
    pub cookies: CookieJar,
}

/// Source of precomputed sessions, keyed by region.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Loads the stored session of a region.
    ///
    /// Absence and read failures are both [`DtekError::Store`].
    async fn load(&self, region: Region) -> Result<StoredSession, DtekError>;
}

// ============================================================================
// JSON Directory Store
// ============================================================================

/// Store backed by `<dir>/<region>.json` files.
#[derive(Debug, Clone)]
pub struct JsonDirStore {
    dir: PathBuf,
}

impl JsonDirStore {
    /// Creates a store over a directory.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// File holding a region's session.
    pub fn path_for(&self, region: Region) -> PathBuf {
        self.dir.join(format!("{}.json", region.code()))
    }

    /// Writes a region's session.
    ///
    /// The file is written to a temporary sibling and renamed into place,
    /// with owner-only permissions on Unix.
    pub async fn save(&self, region: Region, session: &StoredSession) -> Result<(), DtekError> {
        let path = self.path_for(region);
        let key = region.code();
        let json = serde_json::to_string_pretty(session)
            .map_err(|e| DtekError::store(key, e.to_string()))?;

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| DtekError::store(key, e.to_string()))?;
        let temp_path = path.with_extension("json.tmp");
        tokio::fs::write(&temp_path, &json)
            .await
            .map_err(|e| DtekError::store(key, e.to_string()))?;
        tokio::fs::rename(&temp_path, &path)
            .await
            .map_err(|e| DtekError::store(key, e.to_string()))?;
        set_restrictive_permissions(&path)
            .await
            .map_err(|e| DtekError::store(key, e.to_string()))?;

        debug!(path = %path.display(), "Stored session saved");
        Ok(())
    }
}

#[async_trait]
impl SnapshotStore for JsonDirStore {
    #[instrument(skip(self), fields(region = %region))]
    async fn load(&self, region: Region) -> Result<StoredSession, DtekError> {
        let path = self.path_for(region);
        let key = region.code();

        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(DtekError::store(
                    key,
                    format!("no stored snapshot at {}", path.display()),
                ));
            }
            Err(e) => return Err(DtekError::store(key, e.to_string())),
        };

        let stored: StoredSession = serde_json::from_str(&content)
            .map_err(|e| DtekError::store(key, format!("unreadable snapshot: {e}")))?;
        stored.snapshot.validate()?;

        debug!(
            locations = stored.snapshot.locations.len(),
            cookies = stored.cookies.len(),
            "Stored session loaded"
        );
        Ok(stored)
    }
}

#[cfg(unix)]
async fn set_restrictive_permissions(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut perms = tokio::fs::metadata(path).await?.permissions();
    perms.set_mode(0o600);
    tokio::fs::set_permissions(path, perms).await
}

#[cfg(not(unix))]
async fn set_restrictive_permissions(_path: &Path) -> std::io::Result<()> {
    Ok(())
}
