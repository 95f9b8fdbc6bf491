//! Per-region session and cache facade.
//!
//! A [`RegionStore`] owns everything stateful about one upstream region:
//!
//! - the current [`Session`] (directory snapshot, cookie jar, expiry)
//! - at most one in-flight session refresh, shared by every caller that
//!   finds the session missing or stale
//! - a short-lived cache of status reports keyed by (location, street)
//!
//! A failed refresh is not remembered; the next caller starts a new one.
//! A status query rejected for authentication drops the session so the
//! next call rebuilds it.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use dtek_core::{DirectorySnapshot, DtekError, Region, ScheduleTable, StatusReport};
use dtek_fetch::{CookieJar, StatusQuery, Upstream};
use dtek_parser::{build_report, parse_directory};
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

use crate::snapshot_store::SnapshotStore;

/// Default session lifetime.
pub const DEFAULT_SESSION_TTL_SECS: u64 = 60 * 60;

/// Default status cache entry lifetime.
pub const DEFAULT_STATUS_TTL_SECS: u64 = 10 * 60;

// ============================================================================
// Configuration
// ============================================================================

/// Lifetimes used by a [`RegionStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FacadeConfig {
    /// How long a session stays valid after it is installed.
    pub session_ttl: Duration,
    /// How long a status report is served from cache.
    pub status_ttl: Duration,
}

impl Default for FacadeConfig {
    fn default() -> Self {
        Self {
            session_ttl: Duration::from_secs(DEFAULT_SESSION_TTL_SECS),
            status_ttl: Duration::from_secs(DEFAULT_STATUS_TTL_SECS),
        }
    }
}

// ============================================================================
// Session
// ============================================================================

/// A directory snapshot with its cookies and expiry, replaced as a unit.
#[derive(Debug)]
pub struct Session {
    snapshot: DirectorySnapshot,
    cookies: Mutex<CookieJar>,
    expires_at: Instant,
}

impl Session {
    /// Creates a session.
    pub fn new(snapshot: DirectorySnapshot, cookies: CookieJar, expires_at: Instant) -> Self {
        Self {
            snapshot,
            cookies: Mutex::new(cookies),
            expires_at,
        }
    }

    /// The directory snapshot.
    pub fn snapshot(&self) -> &DirectorySnapshot {
        &self.snapshot
    }

    /// The cookie jar, shared by status queries made with this session.
    pub fn cookies(&self) -> &Mutex<CookieJar> {
        &self.cookies
    }

    /// When the session stops being used.
    pub fn expires_at(&self) -> Instant {
        self.expires_at
    }

    /// Returns true while `now` is before the expiry.
    pub fn is_fresh(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

type SessionResult = Result<Arc<Session>, DtekError>;
type SharedRefresh = Shared<BoxFuture<'static, SessionResult>>;

/// Session state guarded by one lock.
#[derive(Default)]
struct SessionSlot {
    session: Option<Arc<Session>>,
    inflight: Option<SharedRefresh>,
}

/// A cached status report.
#[derive(Debug, Clone)]
struct CachedStatus {
    report: StatusReport,
    expires_at: Instant,
}

// ============================================================================
// Region Store
// ============================================================================

/// Session/cache facade for one region.
pub struct RegionStore {
    region: Region,
    upstream: Arc<dyn Upstream>,
    snapshots: Option<Arc<dyn SnapshotStore>>,
    config: FacadeConfig,
    slot: Mutex<SessionSlot>,
    status_cache: RwLock<HashMap<(String, String), CachedStatus>>,
}

impl RegionStore {
    /// Creates a facade that builds sessions from the upstream page.
    pub fn new(region: Region, upstream: Arc<dyn Upstream>, config: FacadeConfig) -> Self {
        Self {
            region,
            upstream,
            snapshots: None,
            config,
            slot: Mutex::new(SessionSlot::default()),
            status_cache: RwLock::new(HashMap::new()),
        }
    }

    /// Builds sessions from a read-through store instead of the upstream page.
    #[must_use]
    pub fn with_snapshot_store(mut self, store: Arc<dyn SnapshotStore>) -> Self {
        self.snapshots = Some(store);
        self
    }

    /// The region this facade serves.
    pub fn region(&self) -> Region {
        self.region
    }

    /// The configured lifetimes.
    pub fn config(&self) -> FacadeConfig {
        self.config
    }

    // ========================================================================
    // Session Lifecycle
    // ========================================================================

    /// Returns a fresh session, refreshing it if needed.
    ///
    /// Concurrent callers that find no fresh session all await the same
    /// refresh.
    pub async fn session(&self) -> Result<Arc<Session>, DtekError> {
        let refresh = {
            let mut slot = self.slot.lock().await;
            if let Some(session) = &slot.session {
                if session.is_fresh(Instant::now()) {
                    return Ok(Arc::clone(session));
                }
                debug!(region = %self.region, "Session expired");
                slot.session = None;
            }
            match &slot.inflight {
                Some(inflight) => {
                    debug!(region = %self.region, "Joining in-flight refresh");
                    inflight.clone()
                }
                None => {
                    let refresh = self.refresh().boxed().shared();
                    slot.inflight = Some(refresh.clone());
                    refresh
                }
            }
        };

        let outcome = refresh.clone().await;

        let mut slot = self.slot.lock().await;
        if slot
            .inflight
            .as_ref()
            .is_some_and(|inflight| inflight.ptr_eq(&refresh))
        {
            slot.inflight = None;
            if let Ok(session) = &outcome {
                slot.session = Some(Arc::clone(session));
            }
        }
        outcome
    }

    /// Builds the refresh future. It owns everything it touches so it can
    /// outlive the caller that created it.
    fn refresh(&self) -> impl Future<Output = SessionResult> + Send + 'static {
        let region = self.region;
        let upstream = Arc::clone(&self.upstream);
        let snapshots = self.snapshots.clone();
        let ttl = self.config.session_ttl;

        async move {
            let result = load_session(region, upstream.as_ref(), snapshots.as_deref()).await;
            match result {
                Ok((snapshot, cookies)) => {
                    info!(
                        region = %region,
                        locations = snapshot.locations.len(),
                        cookies = cookies.len(),
                        updated_at = %snapshot.updated_at,
                        "Session installed"
                    );
                    Ok(Arc::new(Session::new(
                        snapshot,
                        cookies,
                        Instant::now() + ttl,
                    )))
                }
                Err(e) => {
                    warn!(region = %region, error = %e, "Session refresh failed");
                    Err(e)
                }
            }
        }
    }

    /// Drops the current session; the next call refreshes.
    pub async fn invalidate_session(&self) {
        let mut slot = self.slot.lock().await;
        if slot.session.take().is_some() {
            info!(region = %self.region, "Session invalidated");
        }
    }

    /// Drops the session only if it is still `session`.
    async fn invalidate_if_current(&self, session: &Arc<Session>) {
        let mut slot = self.slot.lock().await;
        if slot
            .session
            .as_ref()
            .is_some_and(|current| Arc::ptr_eq(current, session))
        {
            slot.session = None;
            info!(region = %self.region, "Session invalidated after authentication failure");
        }
    }

    // ========================================================================
    // Public Reads
    // ========================================================================

    /// All location names, in upstream order.
    #[instrument(skip(self), fields(region = %self.region))]
    pub async fn get_locations(&self) -> Result<Vec<String>, DtekError> {
        let session = self.session().await?;
        Ok(session.snapshot().locations.clone())
    }

    /// Streets of one location.
    #[instrument(skip(self), fields(region = %self.region))]
    pub async fn get_streets(&self, location: &str) -> Result<Vec<String>, DtekError> {
        let session = self.session().await?;
        session
            .snapshot()
            .streets_of(location)
            .map(<[String]>::to_vec)
            .ok_or_else(|| unknown_location(location))
    }

    /// Weekly schedules of the requested groups.
    ///
    /// Unknown groups are left out of the result.
    #[instrument(skip(self, group_ids), fields(region = %self.region, groups = group_ids.len()))]
    pub async fn get_schedules<S>(&self, group_ids: &[S]) -> Result<ScheduleTable, DtekError>
    where
        S: AsRef<str> + Sync,
    {
        let session = self.session().await?;
        Ok(session.snapshot().schedules_for(group_ids))
    }

    /// Status of every building on a street.
    ///
    /// Reports are served from cache while fresh. A miss queries the
    /// upstream with the current session.
    #[instrument(skip(self), fields(region = %self.region))]
    pub async fn get_status(&self, location: &str, street: &str) -> Result<StatusReport, DtekError> {
        if location.trim().is_empty() {
            return Err(DtekError::validation("location", "must not be empty"));
        }
        if street.trim().is_empty() {
            return Err(DtekError::validation("street", "must not be empty"));
        }

        let key = (location.to_string(), street.to_string());
        if let Some(report) = self.cached_status(&key).await {
            debug!("Status cache hit");
            return Ok(report);
        }

        let session = self.session().await?;
        let snapshot = session.snapshot();
        let streets = snapshot
            .streets_of(location)
            .ok_or_else(|| unknown_location(location))?;
        if !streets.iter().any(|s| s == street) {
            return Err(DtekError::validation(
                "street",
                format!("must be a known street of {location}"),
            ));
        }

        let query = StatusQuery {
            location,
            street,
            updated_at: &snapshot.updated_at,
            csrf_token: &snapshot.csrf_token,
        };
        let response = match self
            .upstream
            .fetch_building_status(self.region, query, session.cookies())
            .await
        {
            Ok(response) => response,
            Err(e) => {
                if e.is_auth_failure() {
                    self.invalidate_if_current(&session).await;
                }
                return Err(e);
            }
        };

        let report = build_report(location, street, snapshot, response)?;
        self.store_status(key, report.clone()).await;
        Ok(report)
    }

    // ========================================================================
    // Status Cache
    // ========================================================================

    async fn cached_status(&self, key: &(String, String)) -> Option<StatusReport> {
        let cache = self.status_cache.read().await;
        cache
            .get(key)
            .filter(|entry| Instant::now() < entry.expires_at)
            .map(|entry| entry.report.clone())
    }

    async fn store_status(&self, key: (String, String), report: StatusReport) {
        let now = Instant::now();
        let mut cache = self.status_cache.write().await;
        let before = cache.len();
        cache.retain(|_, entry| now < entry.expires_at);
        if cache.len() < before {
            debug!(pruned = before - cache.len(), "Pruned expired status entries");
        }
        cache.insert(
            key,
            CachedStatus {
                report,
                expires_at: now + self.config.status_ttl,
            },
        );
    }

    /// Drops every cached status report.
    pub async fn clear_status_cache(&self) {
        self.status_cache.write().await.clear();
    }

    /// Number of cached status reports, fresh or not.
    pub async fn cached_status_count(&self) -> usize {
        self.status_cache.read().await.len()
    }
}

impl std::fmt::Debug for RegionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegionStore")
            .field("region", &self.region)
            .field("config", &self.config)
            .field("read_through", &self.snapshots.is_some())
            .finish_non_exhaustive()
    }
}

/// Reads a session's material from the store when one is configured, else
/// from the upstream page.
async fn load_session(
    region: Region,
    upstream: &dyn Upstream,
    snapshots: Option<&dyn SnapshotStore>,
) -> Result<(DirectorySnapshot, CookieJar), DtekError> {
    if let Some(store) = snapshots {
        let stored = store.load(region).await?;
        return Ok((stored.snapshot, stored.cookies));
    }
    let page = upstream.fetch_directory(region).await?;
    let snapshot = parse_directory(&page.body, Some(region))?;
    Ok((snapshot, page.cookies))
}

fn unknown_location(location: &str) -> DtekError {
    DtekError::validation("location", format!("{location:?} is not a known location"))
}
