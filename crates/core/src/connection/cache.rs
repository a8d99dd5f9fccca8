use moka::future::Cache;
use moka::Expiry;
use std::time::{Duration, Instant};
use tablebridge_common::config::CacheSettings;
use tracing::debug;

use super::ConnectionScope;

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    ttl: Duration,
}

/// Expires every entry after the TTL it was written with.
struct PerEntryTtl;

impl<V> Expiry<String, CacheEntry<V>> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &CacheEntry<V>,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &CacheEntry<V>,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// Process-wide TTL cache whose keys are namespaced by [`ConnectionScope`].
///
/// Safe to share between concurrent executions. Writes are best-effort: an
/// entry may be rejected or evicted by the capacity bound, so a `set`
/// followed by a `get` is not guaranteed to hit.
pub struct ConnectionCache<V> {
    cache: Cache<String, CacheEntry<V>>,
    default_ttl: Duration,
    settle: Duration,
}

impl<V> ConnectionCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub fn new(settings: &CacheSettings) -> Self {
        let cache = Cache::builder()
            .max_capacity(settings.max_capacity)
            .expire_after(PerEntryTtl)
            .build();

        Self {
            cache,
            default_ttl: Duration::from_secs(settings.ttl_seconds),
            settle: Duration::from_millis(settings.settle_millis),
        }
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    pub async fn get(&self, scope: &ConnectionScope, key: &str) -> Option<V> {
        let key = scope.scoped_key(key);
        let entry = self.cache.get(&key).await;
        debug!(target: "cache", key = %key, hit = entry.is_some(), "Cache lookup");
        entry.map(|e| e.value)
    }

    /// Stores `value` with the default TTL. Returns whether it was admitted.
    pub async fn set(&self, scope: &ConnectionScope, key: &str, value: V) -> bool {
        self.set_with_ttl(scope, key, value, self.default_ttl).await
    }

    pub async fn set_with_ttl(
        &self,
        scope: &ConnectionScope,
        key: &str,
        value: V,
        ttl: Duration,
    ) -> bool {
        if ttl.is_zero() {
            return false;
        }

        let key = scope.scoped_key(key);
        self.cache
            .insert(key.clone(), CacheEntry { value, ttl })
            .await;

        if !self.settle.is_zero() {
            tokio::time::sleep(self.settle).await;
        }
        self.cache.run_pending_tasks().await;

        let admitted = self.cache.contains_key(&key);
        debug!(target: "cache", key = %key, ttl_secs = ttl.as_secs(), admitted, "Cache write");
        admitted
    }

    /// Removes the entry stored under the literal `key`.
    pub async fn delete(&self, key: &str) {
        self.cache.invalidate(key).await;
    }

    pub async fn delete_scoped(&self, scope: &ConnectionScope, key: &str) {
        self.cache.invalidate(&scope.scoped_key(key)).await;
    }

    pub async fn entry_count(&self) -> u64 {
        self.cache.run_pending_tasks().await;
        self.cache.entry_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tablebridge_common::action::{ConnectionInstance, ConnectionSet};

    fn settings() -> CacheSettings {
        CacheSettings {
            settle_millis: 0,
            ..Default::default()
        }
    }

    fn scope(token: &str) -> ConnectionScope {
        ConnectionScope::from_connections(&ConnectionSet::from([(
            "aws".to_string(),
            ConnectionInstance::new("1", "aws").with_value("secret_key", token),
        )]))
    }

    #[tokio::test]
    async fn test_set_then_get_same_scope() {
        let cache = ConnectionCache::new(&settings());
        let a = scope("a");

        assert!(cache.set(&a, "regions", vec!["us-east-1"]).await);
        assert_eq!(cache.get(&a, "regions").await, Some(vec!["us-east-1"]));
    }

    #[tokio::test]
    async fn test_scopes_are_isolated() {
        let cache = ConnectionCache::new(&settings());
        let (a, b) = (scope("a"), scope("b"));

        assert!(cache.set(&a, "regions", 1u32).await);
        assert_eq!(cache.get(&b, "regions").await, None);
        assert_eq!(cache.get(&ConnectionScope::unscoped(), "regions").await, None);

        assert!(cache.set(&b, "regions", 2u32).await);
        assert_eq!(cache.get(&a, "regions").await, Some(1));
        assert_eq!(cache.get(&b, "regions").await, Some(2));
    }

    #[tokio::test]
    async fn test_ttl_expiry() {
        let cache = ConnectionCache::new(&settings());
        let a = scope("a");

        assert!(
            cache
                .set_with_ttl(&a, "short", "v".to_string(), Duration::from_millis(50))
                .await
        );
        assert!(cache.get(&a, "short").await.is_some());

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(cache.get(&a, "short").await.is_none());
    }

    #[tokio::test]
    async fn test_zero_ttl_rejected() {
        let cache = ConnectionCache::new(&settings());
        let a = scope("a");
        assert!(!cache.set_with_ttl(&a, "k", 1u8, Duration::ZERO).await);
        assert!(cache.get(&a, "k").await.is_none());
    }

    #[tokio::test]
    async fn test_delete() {
        let cache = ConnectionCache::new(&settings());
        let a = scope("a");
        let unscoped = ConnectionScope::unscoped();

        cache.set(&unscoped, "plain", 1u8).await;
        cache.set(&a, "scoped", 2u8).await;

        cache.delete("plain").await;
        assert!(cache.get(&unscoped, "plain").await.is_none());

        cache.delete("scoped").await;
        assert_eq!(cache.get(&a, "scoped").await, Some(2));

        cache.delete_scoped(&a, "scoped").await;
        assert!(cache.get(&a, "scoped").await.is_none());
        assert_eq!(cache.entry_count().await, 0);
    }

    #[tokio::test]
    async fn test_default_ttl_from_settings() {
        let cache: ConnectionCache<u8> = ConnectionCache::new(&CacheSettings::default());
        assert_eq!(cache.default_ttl(), Duration::from_secs(3600));
    }
}
