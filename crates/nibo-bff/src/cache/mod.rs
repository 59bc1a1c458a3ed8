//! Response cache for parameterless account listings.
//!
//! The proxy only caches the bare `GET /accounts` call, so the default store
//! holds a single entry. Stores are injected into the proxy behind the
//! [`ResponseCache`] trait so a keyed implementation can replace it.

pub mod backend;

pub use backend::{CacheEntry, CachedPayload, ResponseCache, SingleSlotCache};
