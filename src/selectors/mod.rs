//! Dynamic selector config.
//!
//! The backend publishes per-host selector overrides so extraction can adapt
//! to markup changes without a new release. The payload is untrusted: any
//! entry that doesn't parse is dropped and the built-in selectors stay in
//! charge. The scraper only ever sees immutable snapshots handed out by
//! [`SelectorStore`]; a refresh publishes a new snapshot instead of editing
//! the current one.

pub mod client;
pub mod refresh;

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::extractor::structured::{RoleRule, DEFAULT_ROLE_ATTRIBUTE};
use crate::url_utils;

pub use client::SelectorClient;
pub use refresh::{RefreshSettings, Refresher, SelectorCache};

/// Selector override for one host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DynamicSelectorEntry {
    pub platform: String,
    /// Priority-ordered candidates; the first that yields a message wins.
    pub selectors: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role_attribute: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_role_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assistant_role_value: Option<String>,
}

impl DynamicSelectorEntry {
    /// Role rule for matches of this entry's selectors.
    #[must_use]
    pub fn role_rule(&self) -> RoleRule {
        let non_empty = |v: &Option<String>, default: &str| {
            v.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .unwrap_or(default)
                .to_string()
        };
        RoleRule::Attribute {
            name: non_empty(&self.role_attribute, DEFAULT_ROLE_ATTRIBUTE),
            user_value: non_empty(&self.user_role_value, "user"),
            assistant_value: non_empty(&self.assistant_role_value, "assistant"),
        }
    }
}

/// Host-keyed selector overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DynamicSelectorConfig {
    pub entries: HashMap<String, DynamicSelectorEntry>,
}

impl DynamicSelectorConfig {
    /// An empty config: built-in selectors only.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parses a backend payload, keeping whatever is well-formed.
    ///
    /// A payload that is not a JSON object yields an empty config. Entries
    /// that fail to deserialize, or have no usable selector, are dropped.
    ///
    /// ```rust
    /// use rs_chatscrape::selectors::DynamicSelectorConfig;
    ///
    /// let config = DynamicSelectorConfig::from_json_lenient(r#"{
    ///     "chatgpt.com": {"platform": "chatgpt", "selectors": ["article [data-message-author-role]"]},
    ///     "broken.example": {"platform": 7}
    /// }"#);
    /// assert_eq!(config.entries.len(), 1);
    /// assert!(DynamicSelectorConfig::from_json_lenient("[1, 2]").is_empty());
    /// ```
    #[must_use]
    pub fn from_json_lenient(payload: &str) -> Self {
        let value: Value = match serde_json::from_str(payload) {
            Ok(v) => v,
            Err(err) => {
                warn!(error = %err, "selector payload is not JSON; using built-in selectors");
                return Self::empty();
            }
        };
        Self::from_value_lenient(value)
    }

    /// [`Self::from_json_lenient`] over an already-parsed value.
    #[must_use]
    pub fn from_value_lenient(value: Value) -> Self {
        let Value::Object(map) = value else {
            warn!("selector payload is not an object; using built-in selectors");
            return Self::empty();
        };

        let mut entries = HashMap::new();
        for (host, raw) in map {
            match serde_json::from_value::<DynamicSelectorEntry>(raw) {
                Ok(mut entry) => {
                    entry.selectors = entry
                        .selectors
                        .into_iter()
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect();
                    if entry.selectors.is_empty() {
                        warn!(host = host.as_str(), "selector entry has no selectors; dropped");
                        continue;
                    }
                    entries.insert(host.trim().to_ascii_lowercase(), entry);
                }
                Err(err) => {
                    warn!(host = host.as_str(), error = %err, "malformed selector entry; dropped");
                }
            }
        }

        debug!(hosts = entries.len(), "parsed dynamic selector config");
        Self { entries }
    }

    /// Entry for the host of `url`: exact host first, then without `www.`.
    #[must_use]
    pub fn entry_for_url(&self, url: &str) -> Option<&DynamicSelectorEntry> {
        let host = url_utils::extract_hostname(url)?.to_ascii_lowercase();
        self.entries.get(&host).or_else(|| {
            host.strip_prefix("www.")
                .and_then(|bare| self.entries.get(bare))
        })
    }
}

/// Publishes immutable selector snapshots.
///
/// Readers take an `Arc` snapshot and keep it for the whole extraction;
/// a concurrent [`SelectorStore::publish`] never changes what they see.
#[derive(Debug, Default)]
pub struct SelectorStore {
    current: RwLock<Arc<DynamicSelectorConfig>>,
}

impl SelectorStore {
    #[must_use]
    pub fn new(initial: DynamicSelectorConfig) -> Self {
        Self {
            current: RwLock::new(Arc::new(initial)),
        }
    }

    /// The current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Arc<DynamicSelectorConfig> {
        match self.current.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    /// Replaces the current snapshot.
    pub fn publish(&self, config: DynamicSelectorConfig) {
        let next = Arc::new(config);
        match self.current.write() {
            Ok(mut guard) => *guard = next,
            Err(poisoned) => *poisoned.into_inner() = next,
        }
    }
}
