//! Connection-scoped caching.
//!
//! Cached artifacts are keyed by the identity of the caller's connection set,
//! so values fetched with one set of credentials are never served to another.

mod cache;

pub use cache::ConnectionCache;

use tablebridge_common::action::ConnectionSet;

/// Identity of the caller's active connection set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ConnectionScope {
    hash: Option<String>,
}

impl ConnectionScope {
    /// A scope that leaves cache keys unsuffixed, for callers outside any
    /// execution.
    pub fn unscoped() -> Self {
        Self::default()
    }

    /// Hex MD5 digest of the canonical JSON form of `connections`.
    ///
    /// Map keys serialize in sorted order and secret values are part of the
    /// digest, so any credential change yields a different scope. An empty
    /// set hashes `{}` and stays apart from unscoped keys.
    pub fn from_connections(connections: &ConnectionSet) -> Self {
        let canonical: serde_json::Map<String, serde_json::Value> = connections
            .iter()
            .map(|(name, instance)| (name.clone(), instance.canonical_value()))
            .collect();

        match serde_json::to_vec(&canonical) {
            Ok(bytes) => Self {
                hash: Some(format!("{:x}", md5::compute(bytes))),
            },
            Err(e) => {
                tracing::warn!(target: "cache", error = %e, "Failed to serialize connections, cache is unscoped");
                Self::unscoped()
            }
        }
    }

    pub fn hash(&self) -> Option<&str> {
        self.hash.as_deref()
    }

    /// `key` or `key-<hash>` when the scope carries a hash.
    pub fn scoped_key(&self, key: &str) -> String {
        match &self.hash {
            Some(hash) => format!("{}-{}", key, hash),
            None => key.to_string(),
        }
    }
}
