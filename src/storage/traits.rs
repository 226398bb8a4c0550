use std::time::Duration;
use async_trait::async_trait;

use crate::feed::Article;
use crate::error::Result;

/// Key/value store for search results with per-entry expiry.
///
/// Implementations must make individual `get`/`set` calls atomic; callers do no
/// locking of their own and tolerate two concurrent misses both writing.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// `Ok(None)` means absent or expired. `Ok(Some(vec![]))` is a cached empty result.
    async fn get(&self, key: &str) -> Result<Option<Vec<Article>>>;

    async fn set(&self, key: &str, value: Vec<Article>, ttl: Duration) -> Result<()>;
}
