//! Cache configuration, entry and statistics models.

// Author: kelexine (https://github.com/kelexine)

use crate::models::ModelClass;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Configuration for the implicit context-cache ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Whether the orchestrator consults the ledger at all.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// TTL applied when a caller does not supply one.
    #[serde(default = "default_ttl_hours")]
    pub default_ttl_hours: f64,

    /// Maximum number of live entries tracked. `0` means unbounded.
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,

    /// Minimum cacheable payload, in estimated tokens, for pro-class models.
    #[serde(default = "default_min_tokens_pro")]
    pub min_tokens_pro: u64,

    /// Minimum cacheable payload, in estimated tokens, for all other models.
    #[serde(default = "default_min_tokens_standard")]
    pub min_tokens_standard: u64,
}

impl Default for CacheConfig {
    /// Provides default values for cache configuration.
    ///
    /// - `enabled`: true
    /// - `default_ttl_hours`: 1.0
    /// - `max_entries`: 1000
    /// - `min_tokens_pro`: 2048
    /// - `min_tokens_standard`: 1024
    fn default() -> Self {
        Self {
            enabled: true,
            default_ttl_hours: default_ttl_hours(),
            max_entries: default_max_entries(),
            min_tokens_pro: default_min_tokens_pro(),
            min_tokens_standard: default_min_tokens_standard(),
        }
    }
}

impl CacheConfig {
    pub fn min_tokens_for(&self, class: ModelClass) -> u64 {
        match class {
            ModelClass::Pro => self.min_tokens_pro,
            ModelClass::Standard => self.min_tokens_standard,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_ttl_hours() -> f64 {
    1.0
}

fn default_max_entries() -> usize {
    1000
}

fn default_min_tokens_pro() -> u64 {
    2048
}

fn default_min_tokens_standard() -> u64 {
    1024
}

/// One tracked cacheable payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Deterministic identity derived from model, system prompt and content.
    pub id: String,
    /// Canonical model identifier the entry was sized for.
    pub model: String,
    /// Heuristic token count of system prompt plus content.
    pub input_token_estimate: u64,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    /// TTL most recently applied, in hours.
    pub ttl_hours: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl CacheEntry {
    /// An entry is logically absent once `now >= expires_at`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Running savings statistics for the ledger.
///
/// `net_savings` is a derived view: it is recomputed by every mutation of
/// `gross_cost_saved` or `storage_cost` and never updated on its own.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Number of recorded cache hits.
    pub cache_hit_count: u64,
    /// Sum of token estimates across all hits.
    pub tokens_saved: u64,
    /// Input-token cost avoided by hits, USD.
    pub gross_cost_saved: f64,
    /// Storage cost accrued at creation time for the full TTL of every entry, USD.
    pub storage_cost: f64,
    /// `gross_cost_saved - storage_cost`.
    pub net_savings: f64,
    /// Entries created (identity not live at the time).
    pub entries_created: u64,
    /// Create calls that refreshed an existing live entry.
    pub entries_refreshed: u64,
    /// Entries removed by the lazy expiry sweep.
    pub entries_expired: u64,
    /// Live entries at snapshot time.
    pub active_entries: usize,
}

impl CacheStats {
    pub(crate) fn add_hit(&mut self, input_tokens: u64, price_per_million: f64) {
        self.cache_hit_count += 1;
        self.tokens_saved += input_tokens;
        self.gross_cost_saved += (input_tokens as f64 / 1_000_000.0) * price_per_million;
        self.recompute_net();
    }

    pub(crate) fn add_storage(&mut self, cost: f64) {
        self.storage_cost += cost;
        self.recompute_net();
    }

    pub(crate) fn recompute_net(&mut self) {
        self.net_savings = self.gross_cost_saved - self.storage_cost;
    }
}

/// Outcome of the minimum-size policy for a cacheable payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheAdvice {
    pub model_class: ModelClass,
    pub estimated_tokens: u64,
    pub min_tokens: u64,
}

impl CacheAdvice {
    /// Whether the payload is large enough for the provider to cache it.
    pub fn worthwhile(&self) -> bool {
        self.estimated_tokens >= self.min_tokens
    }
}
