pub mod cache;
pub mod traits;

pub use cache::{ResultCache, CacheConfig, CacheStats, CacheEntry, MAX_TTL};
pub use traits::CacheStore;
