//! Single-slot cache backend.

use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwapOption;
use serde::Serialize;
use serde_json::Value;

/// Upstream status and body as returned to the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CachedPayload {
    pub status: u16,
    pub data: Value,
}

/// A stored payload with its expiry instant.
///
/// Entries are immutable once stored; a write replaces the whole entry.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub expires_at: Instant,
    pub payload: CachedPayload,
}

/// Stand-in expiry when `now + ttl` does not fit in an `Instant`.
const FAR_FUTURE: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

impl CacheEntry {
    pub fn new(payload: CachedPayload, ttl: Duration) -> Self {
        Self::written_at(Instant::now(), payload, ttl)
    }

    /// Saturates to a far-future expiry instead of overflowing.
    pub fn written_at(now: Instant, payload: CachedPayload, ttl: Duration) -> Self {
        let expires_at = now
            .checked_add(ttl)
            .or_else(|| now.checked_add(FAR_FUTURE))
            .unwrap_or(now);
        Self {
            expires_at,
            payload,
        }
    }

    /// Fresh only while `now` is strictly before the expiry.
    pub fn is_fresh_at(&self, now: Instant) -> bool {
        now < self.expires_at
    }

    pub fn is_fresh(&self) -> bool {
        self.is_fresh_at(Instant::now())
    }
}

/// Store used by the accounts proxy.
///
/// `get` returns whatever is stored, fresh or not; freshness is the caller's
/// decision.
pub trait ResponseCache: Send + Sync {
    fn get(&self) -> Option<Arc<CacheEntry>>;

    fn set(&self, payload: CachedPayload, ttl: Duration);
}

/// One-entry store behind an atomic pointer swap.
///
/// Reads never block. Concurrent writers race and the last write wins.
#[derive(Default)]
pub struct SingleSlotCache {
    slot: ArcSwapOption<CacheEntry>,
}

impl SingleSlotCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ResponseCache for SingleSlotCache {
    fn get(&self) -> Option<Arc<CacheEntry>> {
        self.slot.load_full()
    }

    fn set(&self, payload: CachedPayload, ttl: Duration) {
        self.slot.store(Some(Arc::new(CacheEntry::new(payload, ttl))));
        tracing::debug!(ttl_secs = ttl.as_secs(), "accounts cache updated");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(n: i64) -> CachedPayload {
        CachedPayload {
            status: 200,
            data: json!({ "n": n }),
        }
    }

    #[test]
    fn starts_empty() {
        let cache = SingleSlotCache::new();
        assert!(cache.get().is_none());
    }

    #[test]
    fn set_overwrites_previous_entry() {
        let cache = SingleSlotCache::new();
        cache.set(payload(1), Duration::from_secs(20));
        cache.set(payload(2), Duration::from_secs(20));

        let entry = cache.get().expect("entry stored");
        assert_eq!(entry.payload, payload(2));
        assert!(entry.is_fresh());
    }

    #[test]
    fn get_returns_stale_entries_too() {
        let cache = SingleSlotCache::new();
        cache.set(payload(1), Duration::ZERO);

        let entry = cache.get().expect("entry stored");
        assert!(!entry.is_fresh());
    }

    #[test]
    fn huge_ttl_saturates_instead_of_overflowing() {
        let cache = SingleSlotCache::new();
        cache.set(payload(1), Duration::from_secs(u64::MAX));

        let entry = cache.get().expect("entry stored");
        assert!(entry.is_fresh());
        assert!(entry.is_fresh_at(Instant::now() + Duration::from_secs(365 * 24 * 60 * 60)));
    }

    #[test]
    fn entry_expires_after_ttl() {
        let ttl = Duration::from_secs(20);
        let written_at = Instant::now();
        let entry = CacheEntry {
            expires_at: written_at + ttl,
            payload: payload(1),
        };

        assert!(entry.is_fresh_at(written_at));
        assert!(entry.is_fresh_at(written_at + ttl - Duration::from_millis(1)));
        assert!(!entry.is_fresh_at(written_at + ttl));
        assert!(!entry.is_fresh_at(written_at + ttl + Duration::from_secs(1)));
    }
}
