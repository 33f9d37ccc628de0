//! Price caching
//!
//! Created: 2026-10-19

pub mod key;
pub mod price_cache;

pub use key::PairKey;
pub use price_cache::{CacheSource, CacheStats, CachedValue, PriceCache, PriceCacheEntry, DEFAULT_TTL};
