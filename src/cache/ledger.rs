// Cache ledger - tracks implicit context-cache entries and savings
// Author: kelexine (https://github.com/kelexine)

use crate::cache::clock::{Clock, SystemClock};
use crate::cache::estimator::{estimate_fragments, CharHeuristic, TokenEstimator};
use crate::cache::identity::resolve_identity;
use crate::cache::models::{CacheAdvice, CacheConfig, CacheEntry, CacheStats};
use crate::error::{ExtractError, Result};
use crate::metrics;
use crate::models::{canonical_model, ModelClass};
use crate::pricing::{PricingTable, PricingUpdate};
use chrono::{DateTime, Duration, Utc};
use lru::LruCache;
use parking_lot::{RwLock, RwLockUpgradableReadGuard};
use std::num::NonZeroUsize;
use std::sync::Arc;
use tracing::{debug, info};

const MILLIS_PER_HOUR: f64 = 3_600_000.0;

/// Everything the ledger mutates, guarded by a single lock so every
/// operation is one critical section.
struct LedgerState {
    entries: LruCache<String, CacheEntry>,
    stats: CacheStats,
    pricing: PricingTable,
}

impl LedgerState {
    fn has_expired(&self, now: DateTime<Utc>) -> bool {
        self.entries.iter().any(|(_, entry)| entry.is_expired(now))
    }

    /// Remove every expired entry, returning how many were dropped
    fn sweep(&mut self, now: DateTime<Utc>) -> usize {
        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(now))
            .map(|(id, _)| id.clone())
            .collect();

        for id in &expired {
            self.entries.pop(id);
        }

        if !expired.is_empty() {
            self.stats.entries_expired += expired.len() as u64;
            metrics::record_cache_operations("expire", expired.len());
            debug!("Swept {} expired cache entries", expired.len());
        }
        expired.len()
    }

    fn snapshot(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.active_entries = self.entries.len();
        stats
    }
}

/// Process-local ledger of implicit context-cache entries.
///
/// The provider caches repeated prefixes on its own; this ledger mirrors that
/// behaviour for bookkeeping. It derives deterministic identities, tracks TTLs
/// and keeps savings statistics netted against estimated storage cost. Nothing
/// here talks to the provider.
pub struct CacheLedger {
    config: CacheConfig,
    state: RwLock<LedgerState>,
    estimator: Arc<dyn TokenEstimator>,
    clock: Arc<dyn Clock>,
}

impl CacheLedger {
    /// Create a ledger using the character heuristic and the system clock
    pub fn new(config: CacheConfig, pricing: PricingTable) -> Self {
        let entries = match NonZeroUsize::new(config.max_entries) {
            Some(capacity) => LruCache::new(capacity),
            None => LruCache::unbounded(),
        };

        Self {
            config,
            state: RwLock::new(LedgerState {
                entries,
                stats: CacheStats::default(),
                pricing,
            }),
            estimator: Arc::new(CharHeuristic),
            clock: Arc::new(SystemClock),
        }
    }

    /// Swap in a different token estimator (e.g. a real tokenizer)
    pub fn with_estimator(mut self, estimator: Arc<dyn TokenEstimator>) -> Self {
        self.estimator = estimator;
        self
    }

    /// Swap in a different time source
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Deterministic identity for a payload; see [`resolve_identity`]
    pub fn resolve_identity(
        &self,
        model: &str,
        system_prompt: Option<&str>,
        content: &str,
    ) -> String {
        resolve_identity(model, system_prompt, content)
    }

    /// Estimate tokens over several fragments with the configured estimator
    pub fn estimate_tokens(&self, fragments: &[&[u8]]) -> u64 {
        estimate_fragments(self.estimator.as_ref(), fragments)
    }

    /// Apply the minimum-size policy. Advisory only: it never blocks creation.
    pub fn advise(&self, model: &str, estimated_tokens: u64) -> CacheAdvice {
        let model_class = ModelClass::of(model);
        let advice = CacheAdvice {
            model_class,
            estimated_tokens,
            min_tokens: self.config.min_tokens_for(model_class),
        };

        if !advice.worthwhile() {
            info!(
                "Cacheable payload for {} is ~{} tokens, below the {} token minimum for implicit caching; tracking anyway",
                model, estimated_tokens, advice.min_tokens
            );
        }
        advice
    }

    /// Create an entry, or refresh the TTL of the live entry with the same identity.
    ///
    /// Storage cost for the full TTL window is accrued once, when the entry is
    /// first created. Refreshing does not charge again.
    pub fn create(
        &self,
        model: &str,
        content: &str,
        system_prompt: Option<&str>,
        ttl_hours: Option<f64>,
    ) -> Result<CacheEntry> {
        let ttl_hours = ttl_hours.unwrap_or(self.config.default_ttl_hours);
        let ttl = ttl_duration(ttl_hours)?;
        let model = canonical_model(model);
        let id = resolve_identity(&model, system_prompt, content);

        let now = self.clock.now();
        let expires_at = expiry(now, ttl)?;

        let mut guard = self.state.write();
        let state = &mut *guard;
        state.sweep(now);

        if let Some(entry) = state.entries.get_mut(&id) {
            entry.expires_at = expires_at;
            entry.ttl_hours = ttl_hours;
            state.stats.entries_refreshed += 1;
            metrics::record_cache_operation("refresh");
            debug!("Cache entry {} already live, TTL refreshed to {}h", id, ttl_hours);
            return Ok(entry.clone());
        }

        let mut fragments: Vec<&[u8]> = vec![content.as_bytes()];
        if let Some(prompt) = system_prompt {
            fragments.push(prompt.as_bytes());
        }
        let input_token_estimate = self.estimate_tokens(&fragments);

        let storage_cost = (input_token_estimate as f64 / 1_000_000.0)
            * state.pricing.storage_price(&model)
            * ttl_hours;

        let entry = CacheEntry {
            id: id.clone(),
            model,
            input_token_estimate,
            created_at: now,
            expires_at,
            ttl_hours,
            system_prompt: system_prompt.map(str::to_string),
            content: Some(content.to_string()),
        };

        if let Some((evicted, _)) = state.entries.push(id.clone(), entry.clone()) {
            debug!("Ledger at capacity, evicted least recently touched entry {}", evicted);
            metrics::record_cache_operation("evict");
        }

        state.stats.entries_created += 1;
        state.stats.add_storage(storage_cost);
        metrics::record_cache_operation("create");
        metrics::update_cache_stats(&state.snapshot());

        debug!(
            "Cache entry {} created: model={}, ~{} tokens, ttl={}h, storage=${:.6}",
            id, entry.model, input_token_estimate, ttl_hours, storage_cost
        );
        Ok(entry)
    }

    /// Look up a live entry. An expired entry is removed and reported absent.
    ///
    /// A successful lookup counts as a touch, so entries that keep getting
    /// reused are the last to be evicted at capacity.
    pub fn get(&self, id: &str) -> Option<CacheEntry> {
        let now = self.clock.now();
        let mut state = self.state.write();

        match state.entries.get(id) {
            None => return None,
            Some(entry) if !entry.is_expired(now) => return Some(entry.clone()),
            Some(_) => {}
        }

        state.entries.pop(id);
        state.stats.entries_expired += 1;
        metrics::record_cache_operation("expire");
        debug!("Cache entry {} expired on lookup", id);
        None
    }

    /// Reset an entry's expiry to `now + ttl_hours`. Absent entries are not recreated.
    pub fn refresh_ttl(&self, id: &str, ttl_hours: f64) -> Result<Option<CacheEntry>> {
        let ttl = ttl_duration(ttl_hours)?;
        let now = self.clock.now();
        let expires_at = expiry(now, ttl)?;

        let mut guard = self.state.write();
        let state = &mut *guard;

        match state.entries.get_mut(id) {
            None => return Ok(None),
            Some(entry) if !entry.is_expired(now) => {
                entry.expires_at = expires_at;
                entry.ttl_hours = ttl_hours;
                metrics::record_cache_operation("refresh");
                debug!("Cache entry {} TTL refreshed to {}h", id, ttl_hours);
                return Ok(Some(entry.clone()));
            }
            Some(_) => {}
        }

        // Found but already expired: drop it rather than resurrect it
        state.entries.pop(id);
        state.stats.entries_expired += 1;
        metrics::record_cache_operation("expire");
        Ok(None)
    }

    /// All live entries, oldest first. Expired entries are swept as a side effect.
    pub fn list(&self) -> Vec<CacheEntry> {
        let now = self.clock.now();
        let state = self.state.upgradable_read();

        let mut entries: Vec<CacheEntry> = if state.has_expired(now) {
            let mut state = RwLockUpgradableReadGuard::upgrade(state);
            state.sweep(now);
            state.entries.iter().map(|(_, entry)| entry.clone()).collect()
        } else {
            state.entries.iter().map(|(_, entry)| entry.clone()).collect()
        };

        entries.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        entries
    }

    /// Remove an entry. Returns whether a live entry existed.
    pub fn delete(&self, id: &str) -> bool {
        let now = self.clock.now();
        let mut state = self.state.write();

        match state.entries.pop(id) {
            Some(entry) if !entry.is_expired(now) => {
                metrics::record_cache_operation("delete");
                metrics::update_cache_stats(&state.snapshot());
                debug!("Cache entry {} deleted", id);
                true
            }
            Some(_) => {
                state.stats.entries_expired += 1;
                metrics::record_cache_operation("expire");
                false
            }
            None => false,
        }
    }

    /// Record a cache hit worth `input_tokens`.
    ///
    /// Uses `price_per_million` when given, else the input price for `model`.
    /// No live entry is required, so a remembered estimate can still be booked
    /// after the entry was deleted.
    pub fn record_hit(
        &self,
        input_tokens: u64,
        price_per_million: Option<f64>,
        model: &str,
    ) -> Result<CacheStats> {
        if let Some(price) = price_per_million {
            if !price.is_finite() || price < 0.0 {
                return Err(ExtractError::InvalidRequest(format!(
                    "price override must be a finite non-negative number, got {}",
                    price
                )));
            }
        }

        let mut state = self.state.write();
        let price = price_per_million.unwrap_or_else(|| state.pricing.input_price(model));
        state.stats.add_hit(input_tokens, price);

        let snapshot = state.snapshot();
        metrics::record_cache_operation("hit");
        metrics::record_tokens(&canonical_model(model), "saved", input_tokens);
        metrics::update_cache_stats(&snapshot);

        debug!(
            "Cache hit recorded: {} tokens at ${}/M, net savings ${:.6}",
            input_tokens, price, snapshot.net_savings
        );
        Ok(snapshot)
    }

    /// Snapshot of the savings statistics, taken after an expiry sweep
    pub fn stats(&self) -> CacheStats {
        let now = self.clock.now();
        let state = self.state.upgradable_read();

        let snapshot = if state.has_expired(now) {
            let mut state = RwLockUpgradableReadGuard::upgrade(state);
            state.sweep(now);
            state.snapshot()
        } else {
            state.snapshot()
        };

        metrics::update_cache_stats(&snapshot);
        snapshot
    }

    /// Current pricing table
    pub fn pricing(&self) -> PricingTable {
        self.state.read().pricing.clone()
    }

    /// Merge a pricing update. Invalid updates are rejected without touching the
    /// active table; accrued storage cost is never recomputed.
    pub fn update_pricing(&self, update: &PricingUpdate) -> Result<PricingTable> {
        let mut state = self.state.write();
        let merged = update.apply_to(&state.pricing)?;
        state.pricing = merged.clone();
        state.stats.recompute_net();

        info!("Pricing updated");
        Ok(merged)
    }

    /// One-time creation cost of caching `tokens` for `model`
    pub fn creation_cost(&self, model: &str, tokens: u64) -> f64 {
        (tokens as f64 / 1_000_000.0) * self.state.read().pricing.creation_price(model)
    }
}

fn ttl_duration(ttl_hours: f64) -> Result<Duration> {
    if !ttl_hours.is_finite() || ttl_hours < 0.0 {
        return Err(ExtractError::InvalidRequest(format!(
            "ttl_hours must be a finite non-negative number, got {}",
            ttl_hours
        )));
    }

    Duration::try_milliseconds((ttl_hours * MILLIS_PER_HOUR).round() as i64).ok_or_else(|| {
        ExtractError::InvalidRequest(format!("ttl_hours {} is out of range", ttl_hours))
    })
}

fn expiry(now: DateTime<Utc>, ttl: Duration) -> Result<DateTime<Utc>> {
    now.checked_add_signed(ttl)
        .ok_or_else(|| ExtractError::InvalidRequest("ttl_hours is out of range".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::clock::ManualClock;

    fn ledger_with_clock() -> (CacheLedger, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::default());
        let ledger = CacheLedger::new(CacheConfig::default(), PricingTable::default())
            .with_clock(clock.clone());
        (ledger, clock)
    }

    #[test]
    fn test_create_is_idempotent() {
        let (ledger, _) = ledger_with_clock();

        let first = ledger.create("gemini-2.5-flash", "schema", Some("prompt"), None).unwrap();
        let second = ledger.create("gemini-2.5-flash", "schema", Some("prompt"), None).unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(first.input_token_estimate, second.input_token_estimate);
        assert_eq!(ledger.list().len(), 1);

        let stats = ledger.stats();
        assert_eq!(stats.entries_created, 1);
        assert_eq!(stats.entries_refreshed, 1);
    }

    #[test]
    fn test_create_refresh_extends_ttl_without_new_charge() {
        let (ledger, clock) = ledger_with_clock();
        let content = "x".repeat(4_000);

        let first = ledger.create("gemini-2.5-flash", &content, None, Some(1.0)).unwrap();
        let storage = ledger.stats().storage_cost;

        clock.advance(Duration::minutes(30));
        let second = ledger.create("gemini-2.5-flash", &content, None, Some(1.0)).unwrap();

        assert_eq!(second.expires_at, first.expires_at + Duration::minutes(30));
        assert_eq!(ledger.stats().storage_cost, storage);
    }

    #[test]
    fn test_storage_cost_accrued_at_creation() {
        let (ledger, _) = ledger_with_clock();
        // 4000 chars -> 1000 tokens; flash storage default is $1/M/h
        ledger.create("gemini-2.5-flash", &"x".repeat(4_000), None, Some(2.0)).unwrap();

        let stats = ledger.stats();
        assert!((stats.storage_cost - 0.002).abs() < 1e-12);
        assert!((stats.net_savings + 0.002).abs() < 1e-12);
    }

    #[test]
    fn test_get_removes_expired_entry() {
        let (ledger, clock) = ledger_with_clock();
        let entry = ledger.create("gemini-2.5-flash", "schema", None, Some(1.0)).unwrap();

        clock.advance(Duration::hours(1));
        assert!(ledger.get(&entry.id).is_none());
        assert_eq!(ledger.stats().entries_expired, 1);
    }

    #[test]
    fn test_refresh_ttl_absent_is_none() {
        let (ledger, _) = ledger_with_clock();
        assert_eq!(ledger.refresh_ttl("cache_missing", 1.0).unwrap(), None);
        assert!(ledger.list().is_empty());
    }

    #[test]
    fn test_refresh_ttl_keeps_id() {
        let (ledger, clock) = ledger_with_clock();
        let entry = ledger.create("gemini-2.5-flash", "schema", None, Some(1.0)).unwrap();

        clock.advance(Duration::minutes(50));
        let refreshed = ledger.refresh_ttl(&entry.id, 2.0).unwrap().unwrap();
        assert_eq!(refreshed.id, entry.id);
        assert_eq!(refreshed.expires_at, clock.now() + Duration::hours(2));
    }

    #[test]
    fn test_negative_ttl_is_rejected() {
        let (ledger, _) = ledger_with_clock();
        assert!(matches!(
            ledger.create("m", "c", None, Some(-1.0)),
            Err(ExtractError::InvalidRequest(_))
        ));
        assert!(ledger.create("m", "c", None, Some(f64::INFINITY)).is_err());
        assert!(ledger.list().is_empty());
    }

    #[test]
    fn test_delete_reports_existence() {
        let (ledger, _) = ledger_with_clock();
        let entry = ledger.create("m", "c", None, None).unwrap();

        assert!(ledger.delete(&entry.id));
        assert!(!ledger.delete(&entry.id));
        assert!(ledger.get(&entry.id).is_none());
    }

    #[test]
    fn test_capacity_evicts_least_recently_touched() {
        let config = CacheConfig {
            max_entries: 2,
            ..CacheConfig::default()
        };
        let ledger = CacheLedger::new(config, PricingTable::default());

        let a = ledger.create("m", "a", None, None).unwrap();
        let b = ledger.create("m", "b", None, None).unwrap();
        // touching `a` again makes `b` the eviction candidate
        ledger.create("m", "a", None, None).unwrap();
        let c = ledger.create("m", "c", None, None).unwrap();

        assert!(ledger.get(&a.id).is_some());
        assert!(ledger.get(&b.id).is_none());
        assert!(ledger.get(&c.id).is_some());
    }

    #[test]
    fn test_get_counts_as_touch_for_eviction() {
        let config = CacheConfig {
            max_entries: 2,
            ..CacheConfig::default()
        };
        let ledger = CacheLedger::new(config, PricingTable::default());

        let hot = ledger.create("m", "hot", None, None).unwrap();
        let cold = ledger.create("m", "cold", None, None).unwrap();
        assert!(ledger.get(&hot.id).is_some());
        ledger.create("m", "new", None, None).unwrap();

        assert!(ledger.get(&hot.id).is_some());
        assert!(ledger.get(&cold.id).is_none());
    }

    #[test]
    fn test_record_hit_rejects_bad_override() {
        let (ledger, _) = ledger_with_clock();
        assert!(ledger.record_hit(100, Some(-0.1), "m").is_err());
        assert!(ledger.record_hit(100, Some(f64::NAN), "m").is_err());
        assert_eq!(ledger.stats().cache_hit_count, 0);
    }

    #[test]
    fn test_record_hit_uses_table_price() {
        let (ledger, _) = ledger_with_clock();
        // gemini-2.5-pro input default is $1.25/M
        let stats = ledger.record_hit(1_000_000, None, "gemini-2.5-pro").unwrap();
        assert!((stats.gross_cost_saved - 1.25).abs() < 1e-12);
    }

    #[test]
    fn test_creation_cost() {
        let (ledger, _) = ledger_with_clock();
        assert!((ledger.creation_cost("gemini-2.5-flash", 2_000_000) - 0.15).abs() < 1e-12);
    }

    #[test]
    fn test_advise_by_model_class() {
        let (ledger, _) = ledger_with_clock();
        assert!(!ledger.advise("gemini-2.5-pro", 1500).worthwhile());
        assert!(ledger.advise("gemini-2.5-flash", 1500).worthwhile());
    }
}
