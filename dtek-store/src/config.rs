//! Configuration management.
//!
//! Configuration is a JSON file; every section and field is optional and a
//! missing file yields the defaults.
//!
//! ```json
//! {
//!   "upstream": { "timeout_secs": 30, "origins": { "kem": "https://www.dtek-kem.com.ua" } },
//!   "session": { "session_ttl_secs": 3600, "status_ttl_secs": 600 },
//!   "retry": { "delays_ms": [500, 1000, 2000] },
//!   "store": { "dir": "/var/lib/dtek/snapshots" }
//! }
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use dtek_core::Region;
use dtek_fetch::host::http::{DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT};
use dtek_fetch::retry::DEFAULT_DELAYS_MS;
use dtek_fetch::{RetryStrategy, UpstreamConfig};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::ConfigError;
use crate::region_store::{DEFAULT_SESSION_TTL_SECS, DEFAULT_STATUS_TTL_SECS, FacadeConfig};

/// Environment variable naming the configuration file.
pub const CONFIG_ENV: &str = "DTEK_CONFIG";

/// Environment variable overriding `store.dir`.
pub const STORE_DIR_ENV: &str = "DTEK_STORE_DIR";

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Upstream connection settings.
    #[serde(default)]
    pub upstream: UpstreamSection,
    /// Session and status cache lifetimes.
    #[serde(default)]
    pub session: SessionSection,
    /// Boundary retry delays.
    #[serde(default)]
    pub retry: RetrySection,
    /// Read-through snapshot store.
    #[serde(default)]
    pub store: StoreSection,
}

/// Upstream connection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpstreamSection {
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// User agent override.
    #[serde(default)]
    pub user_agent: Option<String>,
    /// Origin override per region.
    #[serde(default)]
    pub origins: BTreeMap<Region, String>,
}

/// Session and status cache lifetimes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSection {
    /// Session lifetime in seconds.
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: u64,
    /// Status cache entry lifetime in seconds.
    #[serde(default = "default_status_ttl_secs")]
    pub status_ttl_secs: u64,
}

/// Boundary retry delays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrySection {
    /// Delays between attempts in milliseconds; empty disables retries.
    #[serde(default = "default_delays_ms")]
    pub delays_ms: Vec<u64>,
}

/// Read-through snapshot store settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreSection {
    /// Directory holding `<region>.json` snapshots. Unset means sessions are
    /// always built from the upstream page.
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_session_ttl_secs() -> u64 {
    DEFAULT_SESSION_TTL_SECS
}

fn default_status_ttl_secs() -> u64 {
    DEFAULT_STATUS_TTL_SECS
}

fn default_delays_ms() -> Vec<u64> {
    DEFAULT_DELAYS_MS.to_vec()
}

impl Default for UpstreamSection {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            user_agent: None,
            origins: BTreeMap::new(),
        }
    }
}

impl Default for SessionSection {
    fn default() -> Self {
        Self {
            session_ttl_secs: default_session_ttl_secs(),
            status_ttl_secs: default_status_ttl_secs(),
        }
    }
}

impl Default for RetrySection {
    fn default() -> Self {
        Self {
            delays_ms: default_delays_ms(),
        }
    }
}

impl Config {
    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("dtek")
            .join("config.json")
    }

    /// Loads configuration from `DTEK_CONFIG` or the default path, then
    /// applies environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var_os(CONFIG_ENV).map_or_else(Self::default_path, PathBuf::from);
        let mut config = Self::load_from(&path)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            debug!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;

        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Saves configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        info!(path = %path.display(), "Saved configuration");
        Ok(())
    }

    /// Applies environment overrides through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup(STORE_DIR_ENV).filter(|d| !d.trim().is_empty()) {
            debug!(dir = %dir, "Store directory overridden from environment");
            self.store.dir = Some(PathBuf::from(dir));
        }
    }

    /// Rejects settings that would make the service unusable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.upstream.timeout_secs == 0 {
            return Err(ConfigError::invalid("upstream.timeout_secs", "must be positive"));
        }
        if self.session.session_ttl_secs == 0 {
            return Err(ConfigError::invalid(
                "session.session_ttl_secs",
                "must be positive",
            ));
        }
        if self.session.status_ttl_secs == 0 {
            return Err(ConfigError::invalid(
                "session.status_ttl_secs",
                "must be positive",
            ));
        }
        Ok(())
    }

    /// Settings for the HTTP upstream.
    pub fn upstream_config(&self) -> UpstreamConfig {
        UpstreamConfig {
            timeout: Duration::from_secs(self.upstream.timeout_secs),
            user_agent: self
                .upstream
                .user_agent
                .clone()
                .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
            origins: self.upstream.origins.clone(),
        }
    }

    /// Settings for each region's facade.
    pub fn facade_config(&self) -> FacadeConfig {
        FacadeConfig {
            session_ttl: Duration::from_secs(self.session.session_ttl_secs),
            status_ttl: Duration::from_secs(self.session.status_ttl_secs),
        }
    }

    /// The boundary retry strategy.
    pub fn retry_strategy(&self) -> RetryStrategy {
        RetryStrategy::from_millis(&self.retry.delays_ms)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.session.session_ttl_secs, 3600);
        assert_eq!(config.session.status_ttl_secs, 600);
        assert_eq!(config.retry.delays_ms, vec![500, 1000, 2000]);
        assert_eq!(config.retry_strategy().max_attempts(), 4);
        assert!(config.store.dir.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = Config::load_from(&temp_dir.path().join("absent.json")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_partial_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"upstream": {"origins": {"oem": "http://127.0.0.1:8080/"}}, "retry": {"delays_ms": []}}"#,
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.upstream.timeout_secs, 30);
        assert_eq!(config.retry_strategy().max_attempts(), 1);

        let upstream = config.upstream_config();
        assert_eq!(upstream.origin(Region::Oem), "http://127.0.0.1:8080");
        assert_eq!(upstream.origin(Region::Kem), "https://www.dtek-kem.com.ua");
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.json");

        let mut config = Config::default();
        config.session.status_ttl_secs = 60;
        config.store.dir = Some(PathBuf::from("/tmp/snapshots"));
        config.save_to(&path).unwrap();

        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_malformed_file_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::Serialization(_))
        ));
    }

    #[test]
    fn test_env_override() {
        let mut config = Config::default();
        config.apply_overrides(|key| (key == STORE_DIR_ENV).then(|| "/srv/dtek".to_string()));
        assert_eq!(config.store.dir, Some(PathBuf::from("/srv/dtek")));

        let mut config = Config::default();
        config.apply_overrides(|_| Some("  ".to_string()));
        assert!(config.store.dir.is_none());
    }

    #[test]
    fn test_validate_rejects_zero() {
        let mut config = Config::default();
        config.session.status_ttl_secs = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("session.status_ttl_secs"));
    }

    #[test]
    fn test_facade_config() {
        let facade = Config::default().facade_config();
        assert_eq!(facade.session_ttl, Duration::from_secs(3600));
        assert_eq!(facade.status_ttl, Duration::from_secs(600));
    }
}
