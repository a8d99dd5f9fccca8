//! tablebridge core: the pieces the execution bridge is assembled from.
//!
//! # Architecture
//!
//! ```text
//! parameters ──► qualifier ──► EngineQueryContext ─┐
//!                                                  ▼
//!                 schema ──► descriptor      QueryEngine ──► RowSink (ResultStream)
//!                                                  ▲                 │
//!                       connection (scoped cache) ─┘          normalize ──► rows
//! ```
//!
//! Type mapping and value normalization are total; every other fallible step
//! reports a [`tablebridge_error::BridgeError`].

pub mod connection;
pub mod descriptor;
pub mod engine;
pub mod normalize;
pub mod qualifier;
pub mod schema;
pub mod sink;
pub mod types;

pub use connection::{ConnectionCache, ConnectionScope};
pub use engine::{EngineError, ExecuteRequest, ExecutionContext, MemoryEngine, QueryEngine};
pub use schema::{ColumnDefinition, KeyColumnSet, TableDefinition, TableRegistry};
pub use sink::{ResultStream, RowSink};
pub use types::{ColumnType, ColumnValue};
