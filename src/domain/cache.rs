//! Expiring Record Cache
//!
//! Process-wide key -> value store with a per-entry TTL.
//! - Reads after the TTL has elapsed are misses, never errors
//! - Expired entries are dropped lazily when a read finds them
//! - No single-flight: two concurrent misses on one key may both fetch upstream
//!
//! Time is read from an injected [`Clock`] so tests can move it by hand.

use dashmap::DashMap;
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Source of "now" for expiry checks
pub trait Clock: Send + Sync + fmt::Debug {
    fn now(&self) -> Instant;
}

/// Wall clock backed by [`Instant::now`]
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Hand-driven clock for deterministic expiry tests
#[derive(Debug)]
pub struct ManualClock {
    origin: Instant,
    offset: Mutex<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }

    /// Move the clock forward
    pub fn advance(&self, by: Duration) {
        let mut offset = self.offset.lock().unwrap_or_else(|e| e.into_inner());
        *offset += by;
    }

    /// Time elapsed since the clock was created
    pub fn elapsed(&self) -> Duration {
        *self.offset.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + self.elapsed()
    }
}

/// Cache entry with TTL tracking
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub value: V,
    pub stored_at: Instant,
    pub ttl: Duration,
}

impl<V> CacheEntry<V> {
    pub fn new(value: V, stored_at: Instant, ttl: Duration) -> Self {
        Self { value, stored_at, ttl }
    }

    /// Fresh while strictly less than `ttl` has elapsed
    pub fn is_fresh_at(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.stored_at) < self.ttl
    }

    /// Time remaining before expiry
    pub fn time_remaining_at(&self, now: Instant) -> Option<Duration> {
        let elapsed = now.saturating_duration_since(self.stored_at);
        self.ttl.checked_sub(elapsed).filter(|d| !d.is_zero())
    }
}

/// Concurrent TTL cache
///
/// Each key is read and written atomically; there are no multi-key
/// transactions. Lifecycle is that of the owning engine: created empty,
/// dropped with it.
pub struct TtlCache<V> {
    entries: DashMap<String, CacheEntry<V>>,
    clock: Arc<dyn Clock>,
}

impl<V: Clone> TtlCache<V> {
    /// Create an empty cache on the system clock
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Create an empty cache reading time from `clock`
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            clock,
        }
    }

    /// Get a value if it has not expired
    pub fn get(&self, key: &str) -> Option<V> {
        let now = self.clock.now();

        match self.entries.get(key) {
            Some(entry) if entry.is_fresh_at(now) => return Some(entry.value.clone()),
            Some(_) => {}
            None => return None,
        }

        // Shard guard from the lookup is released before removal.
        self.entries.remove_if(key, |_, entry| !entry.is_fresh_at(now));
        None
    }

    /// Store a value, replacing whatever was under `key`
    pub fn set(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let entry = CacheEntry::new(value, self.clock.now(), ttl);
        self.entries.insert(key.into(), entry);
    }

    /// Time left on a fresh entry
    pub fn time_remaining(&self, key: &str) -> Option<Duration> {
        let now = self.clock.now();
        self.entries
            .get(key)
            .and_then(|entry| entry.time_remaining_at(now))
    }

    /// Drop every expired entry, returning how many were removed
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_fresh_at(now));
        before.saturating_sub(self.entries.len())
    }

    /// Number of stored entries, expired ones included
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn stats(&self) -> CacheStats {
        let now = self.clock.now();
        let total = self.entries.len();
        let fresh = self
            .entries
            .iter()
            .filter(|entry| entry.is_fresh_at(now))
            .count();

        CacheStats {
            total_entries: total,
            fresh_entries: fresh,
            expired_entries: total.saturating_sub(fresh),
        }
    }
}

impl<V: Clone> Default for TtlCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> fmt::Debug for TtlCache<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TtlCache")
            .field("entries", &self.entries.len())
            .field("clock", &self.clock)
            .finish()
    }
}

/// Cache statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct CacheStats {
    pub total_entries: usize,
    pub fresh_entries: usize,
    pub expired_entries: usize,
}
