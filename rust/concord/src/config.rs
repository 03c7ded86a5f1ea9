//! Service-level configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration of a [`SearchService`](crate::SearchService).
///
/// Durations are stored as integer seconds so the structure deserializes
/// from plain configuration files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Seconds a cached job may go untouched before it becomes evictable.
    pub cache_max_age_secs: u64,
    /// Result limit applied to root searches that do not set one.
    pub default_max_results: Option<usize>,
    /// Prefix for driver thread names.
    pub worker_name_prefix: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            cache_max_age_secs: 3600,
            default_max_results: None,
            worker_name_prefix: "concord-search".to_string(),
        }
    }
}

impl SearchConfig {
    pub fn cache_max_age(&self) -> Duration {
        Duration::from_secs(self.cache_max_age_secs)
    }
}
