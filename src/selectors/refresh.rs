//! Scheduled refresh of the dynamic selector snapshot.
//!
//! On startup the refresher publishes the on-disk cache (if any), fetches
//! immediately when that cache is missing or older than the refresh
//! interval, then refetches every interval. A failed refresh is logged and
//! the previous snapshot stays published.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{DynamicSelectorConfig, SelectorClient, SelectorStore};
use crate::error::Result;

/// Default refresh cadence.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// Where to fetch selectors from and how often.
#[derive(Debug, Clone)]
pub struct RefreshSettings {
    /// Backend base URL; `/selectors` is appended.
    pub backend_url: String,
    /// Local cache file. `None` disables caching.
    pub cache_path: Option<PathBuf>,
    pub interval: Duration,
}

impl Default for RefreshSettings {
    fn default() -> Self {
        Self {
            backend_url: "http://localhost:8787".to_string(),
            cache_path: None,
            interval: DEFAULT_REFRESH_INTERVAL,
        }
    }
}

impl RefreshSettings {
    /// Reads `CHATSCRAPE_BACKEND_URL`, `CHATSCRAPE_SELECTOR_CACHE` and
    /// `CHATSCRAPE_REFRESH_HOURS`, keeping defaults for anything unset or
    /// unparseable.
    #[must_use]
    pub fn from_env() -> Self {
        let mut settings = Self::default();

        if let Ok(url) = std::env::var("CHATSCRAPE_BACKEND_URL") {
            if !url.trim().is_empty() {
                settings.backend_url = url.trim().to_string();
            }
        }
        if let Ok(path) = std::env::var("CHATSCRAPE_SELECTOR_CACHE") {
            if !path.trim().is_empty() {
                settings.cache_path = Some(PathBuf::from(path.trim()));
            }
        }
        if let Ok(hours) = std::env::var("CHATSCRAPE_REFRESH_HOURS") {
            match hours.trim().parse::<u64>() {
                Ok(h) if h > 0 => settings.interval = Duration::from_secs(h * 60 * 60),
                _ => warn!(value = hours.as_str(), "ignoring invalid CHATSCRAPE_REFRESH_HOURS"),
            }
        }

        settings
    }
}

/// Selector snapshot as persisted on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectorCache {
    pub fetched_at: DateTime<Utc>,
    pub config: DynamicSelectorConfig,
}

impl SelectorCache {
    #[must_use]
    pub fn new(config: DynamicSelectorConfig) -> Self {
        Self {
            fetched_at: Utc::now(),
            config,
        }
    }

    /// Whether the snapshot is older than `max_age` at `now`.
    #[must_use]
    pub fn is_stale_at(&self, now: DateTime<Utc>, max_age: Duration) -> bool {
        match chrono::Duration::from_std(max_age) {
            Ok(max_age) => now.signed_duration_since(self.fetched_at) >= max_age,
            Err(_) => false,
        }
    }

    #[must_use]
    pub fn is_stale(&self, max_age: Duration) -> bool {
        self.is_stale_at(Utc::now(), max_age)
    }

    /// Reads a cache file. A missing file is `Ok(None)`; a corrupt one is
    /// logged and also treated as absent.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        match serde_json::from_str(&raw) {
            Ok(cache) => Ok(Some(cache)),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "corrupt selector cache ignored");
                Ok(None)
            }
        }
    }

    /// Writes the cache file, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

/// Keeps a [`SelectorStore`] fed from the backend.
pub struct Refresher {
    client: SelectorClient,
    store: Arc<SelectorStore>,
    settings: RefreshSettings,
}

impl Refresher {
    pub fn new(settings: RefreshSettings, store: Arc<SelectorStore>) -> Result<Self> {
        let client = SelectorClient::new(&settings.backend_url)?;
        Ok(Self::with_client(client, settings, store))
    }

    #[must_use]
    pub fn with_client(
        client: SelectorClient,
        settings: RefreshSettings,
        store: Arc<SelectorStore>,
    ) -> Self {
        Self {
            client,
            store,
            settings,
        }
    }

    /// Publishes the on-disk cache, if present. Returns whether it is stale.
    pub fn load_cache(&self) -> bool {
        let Some(path) = self.settings.cache_path.as_deref() else {
            return true;
        };
        match SelectorCache::load(path) {
            Ok(Some(cache)) => {
                let stale = cache.is_stale(self.settings.interval);
                info!(hosts = cache.config.entries.len(), stale, "loaded selector cache");
                self.store.publish(cache.config);
                stale
            }
            Ok(None) => true,
            Err(err) => {
                warn!(error = %err, "could not read selector cache");
                true
            }
        }
    }

    /// Fetches once, publishing and caching the result.
    pub async fn refresh_once(&self) -> Result<()> {
        let config = self.client.fetch().await?;
        let hosts = config.entries.len();

        if let Some(path) = self.settings.cache_path.as_deref() {
            if let Err(err) = SelectorCache::new(config.clone()).save(path) {
                warn!(error = %err, "could not write selector cache");
            }
        }
        self.store.publish(config);
        info!(hosts, "selector snapshot refreshed");
        Ok(())
    }

    /// Runs until `cancel` fires.
    pub async fn run(self, cancel: CancellationToken) {
        let stale = self.load_cache();
        let mut ticker = tokio::time::interval(self.settings.interval);
        // The first tick completes immediately; skip it when the cache is fresh.
        if !stale {
            ticker.tick().await;
        }

        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    debug!("selector refresher stopped");
                    return;
                }
                _ = ticker.tick() => {
                    if let Err(err) = self.refresh_once().await {
                        warn!(error = %err, "selector refresh failed; keeping current snapshot");
                    }
                }
            }
        }
    }
}
