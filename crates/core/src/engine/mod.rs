//! The query engine seam.
//!
//! The bridge drives any table-query engine implementing [`QueryEngine`]: it
//! hands over an [`ExecuteRequest`] with the full projection and translated
//! qualifiers, plus a [`RowSink`] that receives the rows as they stream.
//!
//! Engines signal truncation with [`EngineError::RowLimitReached`]; the
//! bridge turns that into a partial result instead of a failure.

pub mod memory;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tablebridge_common::action::ActionContext;
use tablebridge_error::{BridgeError, ErrorCode};

use crate::connection::{ConnectionCache, ConnectionScope};
use crate::qualifier::EngineQueryContext;
use crate::schema::TableRegistry;
use crate::sink::RowSink;

pub use memory::MemoryEngine;

/// Message engines have historically used to report truncation.
pub const ROW_LIMIT_MESSAGE: &str = "limit of rows reached";

/// Cache shared by every execution of a plugin.
pub type SharedCache = Arc<ConnectionCache<serde_json::Value>>;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("limit of rows reached ({limit})")]
    RowLimitReached { limit: usize },

    #[error(transparent)]
    Failed(#[from] anyhow::Error),
}

impl EngineError {
    /// True for the typed signal and for engines that only report it in text.
    pub fn is_row_limit(&self) -> bool {
        match self {
            EngineError::RowLimitReached { .. } => true,
            EngineError::Failed(e) => format!("{:#}", e).contains(ROW_LIMIT_MESSAGE),
        }
    }
}

impl From<EngineError> for BridgeError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::RowLimitReached { limit } => BridgeError::new(
                ErrorCode::RowLimitReached,
                format!("{} ({})", ROW_LIMIT_MESSAGE, limit),
            ),
            EngineError::Failed(e) => BridgeError::engine_fault(format!("{:#}", e)),
        }
    }
}

/// One table query as the engine sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecuteRequest {
    pub table: String,
    pub query_context: EngineQueryContext,
    pub max_rows: usize,
    /// Equality qualifiers identify a single row through the table's key columns
    pub key_lookup: bool,
}

/// Per-call environment handed to the engine.
#[derive(Clone)]
pub struct ExecutionContext {
    action: Arc<ActionContext>,
    timeout: Duration,
    scope: ConnectionScope,
    cache: SharedCache,
}

impl ExecutionContext {
    pub fn new(action: Arc<ActionContext>, timeout: Duration, cache: SharedCache) -> Self {
        let scope = ConnectionScope::from_connections(action.connections());
        Self {
            action,
            timeout,
            scope,
            cache,
        }
    }

    pub fn action_context(&self) -> &ActionContext {
        &self.action
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn scope(&self) -> &ConnectionScope {
        &self.scope
    }

    pub fn cache(&self) -> &SharedCache {
        &self.cache
    }

    pub async fn cache_get(&self, key: &str) -> Option<serde_json::Value> {
        self.cache.get(&self.scope, key).await
    }

    pub async fn cache_set(&self, key: &str, value: serde_json::Value) -> bool {
        self.cache.set(&self.scope, key, value).await
    }
}

impl std::fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("caller", &self.action.caller())
            .field("timeout", &self.timeout)
            .field("scope", &self.scope.hash())
            .finish_non_exhaustive()
    }
}

#[async_trait]
pub trait QueryEngine: Send + Sync {
    /// Tables this engine can serve
    fn schema(&self) -> &TableRegistry;

    /// Streams the rows of `request.table` into `sink`.
    ///
    /// Rows already sent stay valid when an error is returned.
    async fn execute(
        &self,
        ctx: &ExecutionContext,
        request: ExecuteRequest,
        sink: &mut dyn RowSink,
    ) -> Result<(), EngineError>;
}
