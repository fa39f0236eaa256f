//! Size-bounded LRU store
//!
//! Entries are charged by their encoded byte size against a single budget.
//! When a write would exceed the budget, entries past their TTL are dropped
//! first, then least-recently-used entries are evicted one at a time until
//! the new entry fits. A single entry larger than the whole budget is still
//! stored, after everything else has been evicted.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use cadence_common::compression::{codec_for, Codec};
use cadence_common::{Clock, SystemClock};
use lru::LruCache;
use parking_lot::Mutex;
use serde_json::Value;
use tracing::{debug, warn};

use super::config::CacheConfig;
use super::entry::{encoded_len, CacheEntry, Payload};
use super::stats::{MetricsCollector, StoreStats};
use crate::config::StoreConfig;
use crate::error::PerfResult;

/// Outcome of a revalidation-aware read
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    /// Entry is within its TTL
    Fresh { value: Value, size: usize },
    /// Entry is past its TTL but inside its stale-while-revalidate window
    Stale { value: Value, size: usize },
    /// No usable entry
    Miss,
}

impl Lookup {
    pub fn is_miss(&self) -> bool {
        matches!(self, Self::Miss)
    }
}

#[derive(Debug)]
struct StoreInner {
    entries: LruCache<String, CacheEntry>,
    current_size: usize,
}

impl StoreInner {
    fn remove(&mut self, key: &str) -> Option<CacheEntry> {
        let entry = self.entries.pop(key)?;
        self.current_size = self.current_size.saturating_sub(entry.size);
        Some(entry)
    }

    /// Remove every entry matching `predicate`, returning how many went
    fn remove_where<F>(&mut self, predicate: F) -> usize
    where
        F: Fn(&CacheEntry) -> bool,
    {
        let doomed: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| predicate(entry))
            .map(|(key, _)| key.clone())
            .collect();
        for key in &doomed {
            self.remove(key);
        }
        doomed.len()
    }
}

/// Thread-safe, byte-bounded LRU store
///
/// Every operation takes the single internal lock for the duration of the map
/// mutation only; nothing is awaited while it is held.
///
/// # Example
/// ```
/// use std::time::Duration;
///
/// use cadence_core::cache::{CacheConfig, LruStore};
/// use cadence_core::config::StoreConfig;
/// use serde_json::json;
///
/// let store = LruStore::new(&StoreConfig::with_max_size(1024));
/// store.set("post:1", json!({"caption": "hello"}), &CacheConfig::new(Duration::from_secs(60))).unwrap();
/// assert_eq!(store.get("post:1"), Some(json!({"caption": "hello"})));
/// ```
pub struct LruStore<C: Clock = SystemClock> {
    inner: Mutex<StoreInner>,
    max_size: usize,
    codec: Arc<dyn Codec>,
    compression_threshold: usize,
    metrics: MetricsCollector,
    clock: C,
}

impl LruStore<SystemClock> {
    /// Create a store using the system clock
    pub fn new(config: &StoreConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }
}

impl<C: Clock> LruStore<C> {
    /// Create a store with a custom clock (useful for testing)
    pub fn with_clock(config: &StoreConfig, clock: C) -> Self {
        Self {
            inner: Mutex::new(StoreInner { entries: LruCache::unbounded(), current_size: 0 }),
            max_size: config.max_size_bytes,
            codec: codec_for(config.compression, config.compression_level),
            compression_threshold: config.compression_threshold_bytes,
            metrics: MetricsCollector::default(),
            clock,
        }
    }

    /// Replace the configured codec
    pub fn with_codec(mut self, codec: Arc<dyn Codec>) -> Self {
        self.codec = codec;
        self
    }

    /// Read a fresh value
    ///
    /// Expired entries are removed and reported as a miss, whether or not
    /// they carry a revalidation window.
    pub fn get(&self, key: &str) -> Option<Value> {
        match self.read(key, false) {
            Lookup::Fresh { value, .. } | Lookup::Stale { value, .. } => Some(value),
            Lookup::Miss => None,
        }
    }

    /// Read a value, serving it stale while inside its revalidation window
    pub fn lookup(&self, key: &str) -> Lookup {
        self.read(key, true)
    }

    fn read(&self, key: &str, allow_stale: bool) -> Lookup {
        let now = self.clock.now();
        let mut inner = self.inner.lock();

        let Some((expired, dead)) =
            inner.entries.peek(key).map(|entry| (entry.is_expired(now), entry.is_dead(now)))
        else {
            self.metrics.record_miss();
            debug!(key, "cache miss");
            return Lookup::Miss;
        };

        if dead || (expired && !allow_stale) {
            inner.remove(key);
            self.metrics.record_expirations(1);
            self.metrics.record_miss();
            debug!(key, "cache entry expired");
            return Lookup::Miss;
        }

        let decoded =
            inner.entries.get(key).map(|entry| (entry.decode(self.codec.as_ref()), entry.size));
        match decoded {
            Some((Ok(value), size)) => {
                self.metrics.record_hit();
                if expired {
                    debug!(key, "cache hit (stale)");
                    Lookup::Stale { value, size }
                } else {
                    debug!(key, "cache hit");
                    Lookup::Fresh { value, size }
                }
            }
            Some((Err(err), _)) => {
                warn!(key, error = %err, "dropping undecodable cache entry");
                inner.remove(key);
                self.metrics.record_miss();
                Lookup::Miss
            }
            None => {
                self.metrics.record_miss();
                Lookup::Miss
            }
        }
    }

    /// Store a value, evicting as needed, and return the bytes charged
    ///
    /// # Errors
    /// Returns an error only when the value cannot be encoded or compressed;
    /// capacity pressure never fails a write.
    pub fn set(&self, key: &str, value: Value, config: &CacheConfig) -> PerfResult<usize> {
        let (payload, compressed, size) = self.encode(value, config)?;
        let now = self.clock.now();
        let entry = CacheEntry {
            payload,
            expires_at: CacheEntry::expiry_for(now, config.ttl),
            grace: config.grace(),
            size,
            tags: config.tags.iter().cloned().collect::<HashSet<_>>(),
            compressed,
        };

        let mut inner = self.inner.lock();
        inner.remove(key);
        self.make_room(&mut inner, size, now);
        inner.entries.put(key.to_string(), entry);
        inner.current_size += size;
        self.metrics.record_insert();

        debug!(key, size, compressed, "cache set");
        Ok(size)
    }

    fn encode(&self, value: Value, config: &CacheConfig) -> PerfResult<(Payload, bool, usize)> {
        if !config.compress && !config.serialize {
            let size = encoded_len(&value)?;
            return Ok((Payload::Value(value), false, size));
        }

        let bytes = serde_json::to_vec(&value)?;
        if config.compress && bytes.len() > self.compression_threshold {
            let packed = self.codec.compress(&bytes)?;
            if packed.len() < bytes.len() {
                let size = packed.len();
                return Ok((Payload::Bytes(packed), true, size));
            }
        }
        let size = bytes.len();
        Ok((Payload::Bytes(bytes), false, size))
    }

    fn make_room(&self, inner: &mut StoreInner, incoming: usize, now: Instant) {
        if inner.current_size + incoming <= self.max_size {
            return;
        }

        let expired = inner.remove_where(|entry| entry.is_expired(now));
        self.metrics.record_expirations(expired as u64);

        let mut evicted = 0u64;
        while inner.current_size + incoming > self.max_size {
            let Some((key, entry)) = inner.entries.pop_lru() else { break };
            inner.current_size = inner.current_size.saturating_sub(entry.size);
            evicted += 1;
            debug!(key = %key, size = entry.size, "evicted least recently used entry");
        }
        self.metrics.record_evictions(evicted);

        if incoming > self.max_size {
            warn!(size = incoming, max_size = self.max_size, "entry exceeds cache capacity");
        }
    }

    /// Remove a single key, returning whether it was present
    pub fn delete(&self, key: &str) -> bool {
        self.inner.lock().remove(key).is_some()
    }

    /// Remove every entry whose tag set contains any of `tags`
    pub fn invalidate_by_tags(&self, tags: &[String]) -> usize {
        if tags.is_empty() {
            return 0;
        }
        let removed = self.inner.lock().remove_where(|entry| entry.has_any_tag(tags));
        if removed > 0 {
            debug!(?tags, removed, "invalidated cache entries by tag");
        }
        removed
    }

    /// Drop entries past their TTL and revalidation window
    pub fn cleanup_expired(&self) -> usize {
        let now = self.clock.now();
        let removed = self.inner.lock().remove_where(|entry| entry.is_dead(now));
        self.metrics.record_expirations(removed as u64);
        removed
    }

    /// Whether a fresh entry exists, without touching recency
    pub fn contains(&self, key: &str) -> bool {
        let now = self.clock.now();
        self.inner.lock().entries.peek(key).is_some_and(|entry| !entry.is_expired(now))
    }

    /// Drop every entry; counters are kept
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.entries.clear();
        inner.current_size = 0;
    }

    /// Reset hit/miss/eviction counters
    pub fn reset_stats(&self) {
        self.metrics.reset();
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bytes currently charged against the budget
    pub fn size_bytes(&self) -> usize {
        self.inner.lock().current_size
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Fraction of the byte budget in use, `0.0..` (may exceed 1 for an
    /// oversized entry)
    pub fn memory_usage(&self) -> f64 {
        if self.max_size == 0 {
            0.0
        } else {
            self.size_bytes() as f64 / self.max_size as f64
        }
    }

    /// Snapshot of counters and usage
    pub fn stats(&self) -> StoreStats {
        let (entries, size) = {
            let inner = self.inner.lock();
            (inner.entries.len(), inner.current_size)
        };
        self.metrics.snapshot(entries, size, self.max_size)
    }

    /// Name of the active codec
    pub fn codec_name(&self) -> &'static str {
        self.codec.name()
    }
}

impl<C: Clock> std::fmt::Debug for LruStore<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LruStore")
            .field("max_size", &self.max_size)
            .field("codec", &self.codec.name())
            .field("compression_threshold", &self.compression_threshold)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for cache::store.
    use std::time::Duration;

    use cadence_common::compression::NoopCodec;
    use cadence_common::MockClock;
    use serde_json::json;

    use super::*;

    /// JSON string of exactly 10 encoded bytes (8 chars plus quotes)
    fn ten_bytes(i: usize) -> Value {
        json!(format!("{i:08}"))
    }

    fn store(max: usize) -> (LruStore<MockClock>, MockClock) {
        let clock = MockClock::new();
        (LruStore::with_clock(&StoreConfig::with_max_size(max), clock.clone()), clock)
    }

    fn ttl(ms: u64) -> CacheConfig {
        CacheConfig::new(Duration::from_millis(ms))
    }

    /// Validates basic set/get and byte accounting.
    ///
    /// Assertions:
    /// - Confirms the stored value round-trips.
    /// - Confirms the charged size equals the JSON length.
    #[test]
    fn test_set_and_get() {
        let (store, _) = store(1024);
        let size = store.set("a", ten_bytes(1), &ttl(1000)).unwrap();

        assert_eq!(size, 10);
        assert_eq!(store.size_bytes(), 10);
        assert_eq!(store.get("a"), Some(ten_bytes(1)));
        assert_eq!(store.get("missing"), None);
    }

    /// Validates that overwriting a key releases the old charge.
    #[test]
    fn test_overwrite_replaces_size() {
        let (store, _) = store(1024);
        store.set("a", ten_bytes(1), &ttl(1000)).unwrap();
        store.set("a", json!("x"), &ttl(1000)).unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.size_bytes(), 3);
    }

    /// Validates that the least recently used entry is evicted first.
    ///
    /// Assertions:
    /// - Ensures a key read after insertion survives eviction.
    /// - Ensures the untouched oldest key is the one evicted.
    #[test]
    fn test_lru_eviction_order() {
        let (store, _) = store(30);
        store.set("a", ten_bytes(1), &ttl(1000)).unwrap();
        store.set("b", ten_bytes(2), &ttl(1000)).unwrap();
        store.set("c", ten_bytes(3), &ttl(1000)).unwrap();
        assert!(store.get("a").is_some());

        store.set("d", ten_bytes(4), &ttl(1000)).unwrap();

        assert!(store.contains("a"));
        assert!(!store.contains("b"));
        assert!(store.contains("c"));
        assert!(store.contains("d"));
        assert_eq!(store.stats().evictions, 1);
    }

    /// Validates expired entries are dropped before anything is evicted.
    #[test]
    fn test_expired_entries_dropped_before_eviction() {
        let (store, clock) = store(30);
        store.set("short", ten_bytes(1), &ttl(10)).unwrap();
        store.set("b", ten_bytes(2), &ttl(1000)).unwrap();
        store.set("c", ten_bytes(3), &ttl(1000)).unwrap();
        clock.advance_millis(20);

        store.set("d", ten_bytes(4), &ttl(1000)).unwrap();

        assert!(store.contains("b"));
        assert!(store.contains("c"));
        assert!(store.contains("d"));
        let stats = store.stats();
        assert_eq!(stats.evictions, 0);
        assert_eq!(stats.expirations, 1);
    }

    /// Validates one write can evict several entries.
    #[test]
    fn test_large_write_evicts_multiple() {
        let (store, _) = store(30);
        for i in 0..3 {
            store.set(&format!("k{i}"), ten_bytes(i), &ttl(1000)).unwrap();
        }
        let big = json!("x".repeat(18)); // 20 bytes
        store.set("big", big.clone(), &ttl(1000)).unwrap();

        assert_eq!(store.len(), 2);
        assert!(store.contains("k2"));
        assert_eq!(store.get("big"), Some(big));
        assert!(store.size_bytes() <= 30);
    }

    /// Validates an oversized entry is still stored after evicting everything.
    #[test]
    fn test_oversized_entry_is_inserted() {
        let (store, _) = store(15);
        store.set("a", ten_bytes(1), &ttl(1000)).unwrap();
        let huge = json!("y".repeat(40));

        store.set("huge", huge.clone(), &ttl(1000)).unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.get("huge"), Some(huge));
        assert!(store.memory_usage() > 1.0);
    }

    /// Validates that reads past the TTL miss and delete the entry.
    #[test]
    fn test_ttl_expiry() {
        let (store, clock) = store(1024);
        store.set("a", ten_bytes(1), &ttl(100)).unwrap();

        clock.advance_millis(100);
        assert!(store.get("a").is_some());

        clock.advance_millis(1);
        assert_eq!(store.get("a"), None);
        assert_eq!(store.len(), 0);
        assert_eq!(store.size_bytes(), 0);
    }

    /// Validates the stale-while-revalidate window on `lookup`.
    ///
    /// Assertions:
    /// - Confirms `lookup` reports `Stale` inside the grace window.
    /// - Confirms `lookup` misses and removes the entry past the window.
    #[test]
    fn test_lookup_stale_window() {
        let (store, clock) = store(1024);
        let config = CacheConfig::builder(Duration::from_millis(100))
            .stale_while_revalidate(Duration::from_millis(50))
            .build();
        store.set("a", ten_bytes(1), &config).unwrap();

        assert!(matches!(store.lookup("a"), Lookup::Fresh { .. }));
        clock.advance_millis(120);
        assert!(matches!(store.lookup("a"), Lookup::Stale { .. }));
        clock.advance_millis(40);
        assert!(store.lookup("a").is_miss());
        assert!(store.is_empty());
    }

    /// Validates that plain `get` never serves stale values.
    ///
    /// Assertions:
    /// - Confirms `get` misses inside the grace window.
    /// - Confirms the removal counts as an expiration even though the grace
    ///   window had not passed.
    #[test]
    fn test_get_ignores_grace_window() {
        let (store, clock) = store(1024);
        let config = CacheConfig::builder(Duration::from_millis(10))
            .stale_while_revalidate(Duration::from_secs(60))
            .build();
        store.set("a", ten_bytes(1), &config).unwrap();
        clock.advance_millis(11);

        assert_eq!(store.get("a"), None);
        assert_eq!(store.stats().expirations, 1);
        assert!(store.is_empty());
    }

    /// Validates tag invalidation uses exact membership.
    ///
    /// Assertions:
    /// - Ensures every entry carrying the tag is removed.
    /// - Ensures entries with other tags, or whose key merely contains the
    ///   tag text, remain.
    #[test]
    fn test_invalidate_by_tags() {
        let (store, _) = store(1024);
        let posts = CacheConfig::builder(Duration::from_secs(1)).tag("t1").build();
        let both = CacheConfig::builder(Duration::from_secs(1)).tags(["t1", "t2"]).build();
        let other = CacheConfig::builder(Duration::from_secs(1)).tag("t2").build();
        store.set("a", json!(1), &posts).unwrap();
        store.set("b", json!(2), &both).unwrap();
        store.set("t1-key", json!(3), &other).unwrap();
        store.set("untagged", json!(4), &ttl(1000)).unwrap();

        assert_eq!(store.invalidate_by_tags(&["t1".to_string()]), 2);
        assert!(!store.contains("a"));
        assert!(!store.contains("b"));
        assert!(store.contains("t1-key"));
        assert!(store.contains("untagged"));

        assert_eq!(store.invalidate_by_tags(&["t1".to_string()]), 0);
        assert_eq!(store.invalidate_by_tags(&[]), 0);
    }

    /// Validates compression above the threshold.
    ///
    /// Assertions:
    /// - Confirms a large compressible payload is charged fewer bytes than
    ///   its JSON form.
    /// - Confirms small payloads are stored uncompressed.
    /// - Confirms both decode back to the original value.
    #[test]
    fn test_compression_threshold() {
        let (store, _) = store(1 << 20);
        let compress = CacheConfig::builder(Duration::from_secs(60)).compress(true).build();
        let large = json!({"body": "scheduled post ".repeat(200)});
        let raw_len = serde_json::to_vec(&large).unwrap().len();

        let charged = store.set("large", large.clone(), &compress).unwrap();
        assert!(charged < raw_len);
        assert_eq!(store.get("large"), Some(large));

        let small = json!({"id": 1});
        let charged = store.set("small", small.clone(), &compress).unwrap();
        assert_eq!(charged, serde_json::to_vec(&small).unwrap().len());
        assert_eq!(store.get("small"), Some(small));
    }

    /// Validates that a corrupt compressed payload is treated as a miss.
    #[test]
    fn test_decode_failure_is_a_miss() {
        #[derive(Debug)]
        struct BrokenCodec;
        impl Codec for BrokenCodec {
            fn name(&self) -> &'static str {
                "broken"
            }
            fn compress(&self, _input: &[u8]) -> cadence_common::CommonResult<Vec<u8>> {
                Ok(vec![1])
            }
            fn decompress(&self, _input: &[u8]) -> cadence_common::CommonResult<Vec<u8>> {
                Err(cadence_common::CommonError::internal("corrupt"))
            }
        }

        let store = LruStore::with_clock(&StoreConfig::with_max_size(1 << 20), MockClock::new())
            .with_codec(Arc::new(BrokenCodec));
        let compress = CacheConfig::builder(Duration::from_secs(60)).compress(true).build();
        store.set("a", json!("z".repeat(4096)), &compress).unwrap();

        assert_eq!(store.get("a"), None);
        assert!(store.is_empty());
        assert_eq!(store.stats().misses, 1);
    }

    /// Validates `serialize` stores encoded bytes without compression.
    #[test]
    fn test_serialize_without_compress() {
        let store = LruStore::with_clock(&StoreConfig::with_max_size(1024), MockClock::new())
            .with_codec(Arc::new(NoopCodec));
        let config = CacheConfig::builder(Duration::from_secs(1)).serialize(true).build();
        let value = json!([1, 2, 3]);

        assert_eq!(store.set("a", value.clone(), &config).unwrap(), 7);
        assert_eq!(store.get("a"), Some(value));
        assert_eq!(store.codec_name(), "none");
    }

    /// Validates the sweep removes only dead entries.
    #[test]
    fn test_cleanup_expired() {
        let (store, clock) = store(1024);
        let graced = CacheConfig::builder(Duration::from_millis(10))
            .stale_while_revalidate(Duration::from_millis(100))
            .build();
        store.set("short", json!(1), &ttl(10)).unwrap();
        store.set("graced", json!(2), &graced).unwrap();
        store.set("long", json!(3), &ttl(10_000)).unwrap();
        clock.advance_millis(50);

        assert_eq!(store.cleanup_expired(), 1);
        assert_eq!(store.len(), 2);
        assert_eq!(store.stats().expirations, 1);
    }

    /// Validates that `Duration::MAX` TTL and grace are treated as "never".
    ///
    /// Assertions:
    /// - Confirms `set` accepts a `Duration::MAX` TTL and the value stays
    ///   readable after a long time.
    /// - Confirms a `Duration::MAX` grace keeps the entry for `lookup` and the
    ///   sweep, while `get` still reports it expired.
    #[test]
    fn test_max_durations_do_not_overflow() {
        let (store, clock) = store(1024);
        let lingering = CacheConfig::builder(Duration::from_millis(10))
            .stale_while_revalidate(Duration::MAX)
            .build();
        store.set("forever", json!(1), &CacheConfig::new(Duration::MAX)).unwrap();
        store.set("lingering", json!(2), &lingering).unwrap();
        clock.advance(Duration::from_secs(86_400 * 365));

        assert_eq!(store.cleanup_expired(), 0);
        assert_eq!(store.get("forever"), Some(json!(1)));
        assert!(matches!(store.lookup("lingering"), Lookup::Stale { .. }));
        assert_eq!(store.get("lingering"), None);
        assert_eq!(store.len(), 1);
    }

    /// Validates hit-rate after one miss and one hit.
    #[test]
    fn test_stats_hit_rate() {
        let (store, _) = store(1024);
        assert_eq!(store.get("a"), None);
        store.set("a", json!(1), &ttl(1000)).unwrap();
        assert!(store.get("a").is_some());

        let stats = store.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert!((stats.hit_rate() - 0.5).abs() < f64::EPSILON);

        store.reset_stats();
        assert_eq!(store.stats().total_accesses(), 0);
    }

    /// Validates delete and clear.
    #[test]
    fn test_delete_and_clear() {
        let (store, _) = store(1024);
        store.set("a", json!(1), &ttl(1000)).unwrap();
        store.set("b", json!(2), &ttl(1000)).unwrap();

        assert!(store.delete("a"));
        assert!(!store.delete("a"));
        store.clear();
        assert!(store.is_empty());
        assert_eq!(store.size_bytes(), 0);
    }
}
