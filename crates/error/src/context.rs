//! # Error Contexts
//!
//! Structured metadata attached to errors so hosts can react programmatically.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ErrorContext {
    /// Context for BRIDGE-1001 (MissingParameter)
    MissingParameter {
        parameter: String,
        provided: Vec<String>,
    },

    /// Context for BRIDGE-1002 (MalformedPayload)
    MalformedPayload {
        parameter: String,
        line: usize,
        column: usize,
    },

    /// Context for BRIDGE-2001 (TableNotFound)
    TableNotFound {
        table: String,
        available_tables: Vec<String>,
    },

    /// Context for BRIDGE-2002 (RowLimitReached)
    RowLimit {
        table: String,
        max_rows: usize,
        rows_collected: usize,
    },

    /// Context for BRIDGE-2003 (ExecutionTimeout)
    Timeout { table: String, timeout_secs: u64 },

    /// Context for BRIDGE-3002 (SchemaViolation)
    Schema {
        table: String,
        column: Option<String>,
    },

    /// Context for BRIDGE-3001 (InvalidConfig)
    Config {
        file_path: Option<String>,
        field: Option<String>,
    },

    /// Context for BRIDGE-5001 (engine failures, including caught panics)
    Engine { table: String },

    /// Generic key-value context for extensibility
    Generic {
        #[serde(flatten)]
        data: std::collections::HashMap<String, serde_json::Value>,
    },
}
