//! Connection-scoped cache behaviour as seen through an execution context.

use std::sync::Arc;
use std::time::Duration;
use tablebridge_common::action::{ActionContext, ConnectionInstance, ConnectionSet};
use tablebridge_common::config::CacheSettings;
use tablebridge_core::{ConnectionCache, ConnectionScope, ExecutionContext};

fn settings() -> CacheSettings {
    CacheSettings {
        settle_millis: 0,
        ..Default::default()
    }
}

fn context(cache: &Arc<ConnectionCache<serde_json::Value>>, token: &str) -> ExecutionContext {
    let connections = ConnectionSet::from([(
        "github".to_string(),
        ConnectionInstance::new("conn-1", "github").with_value("token", token),
    )]);
    ExecutionContext::new(
        Arc::new(ActionContext::new(Some("alice".to_string()), connections)),
        Duration::from_secs(30),
        Arc::clone(cache),
    )
}

#[tokio::test]
async fn entries_do_not_leak_between_connection_sets() {
    let cache = Arc::new(ConnectionCache::new(&settings()));
    let first = context(&cache, "token-a");
    let second = context(&cache, "token-b");

    assert!(first.cache_set("org", serde_json::json!({"login": "acme"})).await);
    assert_eq!(
        first.cache_get("org").await,
        Some(serde_json::json!({"login": "acme"}))
    );
    assert_eq!(second.cache_get("org").await, None);
}

#[tokio::test]
async fn identical_connection_sets_share_entries() {
    let cache = Arc::new(ConnectionCache::new(&settings()));
    let first = context(&cache, "token-a");
    let again = context(&cache, "token-a");

    assert_eq!(first.scope(), again.scope());
    assert!(first.cache_set("org", serde_json::json!("acme")).await);
    assert_eq!(again.cache_get("org").await, Some(serde_json::json!("acme")));
}

#[tokio::test]
async fn scoped_key_embeds_connection_hash() {
    let cache = Arc::new(ConnectionCache::<serde_json::Value>::new(&settings()));
    let ctx = context(&cache, "token-a");

    let hash = ctx.scope().hash().expect("connections present");
    assert_eq!(hash.len(), 32);
    assert!(hash.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    assert_eq!(ctx.scope().scoped_key("org"), format!("org-{}", hash));
}

#[tokio::test]
async fn empty_connection_set_misses_unscoped_entries() {
    let cache = Arc::new(ConnectionCache::new(&settings()));
    assert!(
        cache
            .set(&ConnectionScope::unscoped(), "regions", serde_json::json!("global"))
            .await
    );

    let ctx = ExecutionContext::new(
        Arc::new(ActionContext::new(None, ConnectionSet::new())),
        Duration::from_secs(1),
        Arc::clone(&cache),
    );
    assert!(ctx.scope().hash().is_some());
    assert_eq!(ctx.cache_get("regions").await, None);

    assert!(ctx.cache_set("regions", serde_json::json!("scoped")).await);
    assert_eq!(
        cache.get(&ConnectionScope::unscoped(), "regions").await,
        Some(serde_json::json!("global"))
    );
    assert_eq!(ctx.cache_get("regions").await, Some(serde_json::json!("scoped")));
}
