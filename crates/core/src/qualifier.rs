//! Query-context parsing and qualifier translation.
//!
//! The caller embeds a serialized [`QueryContext`] (column constraints as
//! produced by a SQLite virtual-table planner) in the action parameters. This
//! module parses it and converts every constraint into an engine
//! [`Qualifier`], one per constraint, preserving constraint order per column.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tablebridge_error::{BridgeError, ErrorCode, ErrorContext, Result};
use tracing::debug;

/// Comparison operator codes of the wire protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum Operator {
    Unique,
    Equals,
    GreaterThan,
    LessThanOrEquals,
    LessThan,
    GreaterThanOrEquals,
    Match,
    Like,
    Glob,
    Regexp,
    /// Code outside the known set, carried through as data
    Unrecognized(i64),
}

impl From<i64> for Operator {
    fn from(code: i64) -> Self {
        match code {
            1 => Operator::Unique,
            2 => Operator::Equals,
            4 => Operator::GreaterThan,
            8 => Operator::LessThanOrEquals,
            16 => Operator::LessThan,
            32 => Operator::GreaterThanOrEquals,
            64 => Operator::Match,
            65 => Operator::Like,
            66 => Operator::Glob,
            67 => Operator::Regexp,
            other => Operator::Unrecognized(other),
        }
    }
}

impl From<Operator> for i64 {
    fn from(op: Operator) -> i64 {
        match op {
            Operator::Unique => 1,
            Operator::Equals => 2,
            Operator::GreaterThan => 4,
            Operator::LessThanOrEquals => 8,
            Operator::LessThan => 16,
            Operator::GreaterThanOrEquals => 32,
            Operator::Match => 64,
            Operator::Like => 65,
            Operator::Glob => 66,
            Operator::Regexp => 67,
            Operator::Unrecognized(code) => code,
        }
    }
}

/// Maps an operator code to the engine's operator token.
///
/// All four textual-match operators collapse into `"like"`; the engine
/// cannot tell them apart. Unknown codes become `"unsupported"` and are left
/// for the engine to accept or ignore.
pub fn translate_operator(operator: Operator) -> &'static str {
    match operator {
        Operator::Equals => "=",
        Operator::GreaterThan => ">",
        Operator::LessThanOrEquals => "<=",
        Operator::LessThan => "<",
        Operator::GreaterThanOrEquals => ">=",
        Operator::Like | Operator::Match | Operator::Glob | Operator::Regexp => "like",
        Operator::Unique => "unique",
        Operator::Unrecognized(_) => "unsupported",
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constraint {
    pub operator: Operator,
    pub expression: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintList {
    #[serde(default)]
    pub affinity: String,
    #[serde(default)]
    pub constraints: Vec<Constraint>,
}

/// Wire form of the caller's query context.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryContext {
    #[serde(default)]
    pub constraints: BTreeMap<String, ConstraintList>,
    #[serde(default, alias = "maxRows", skip_serializing_if = "Option::is_none")]
    pub max_rows: Option<usize>,
}

/// Engine form of a single column constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Qualifier {
    pub field_name: String,
    pub operator: String,
    /// Always the raw constraint expression
    pub value: String,
}

impl Qualifier {
    fn from_constraint(column: &str, constraint: &Constraint) -> Self {
        Self {
            field_name: column.to_string(),
            operator: translate_operator(constraint.operator).to_string(),
            value: constraint.expression.clone(),
        }
    }
}

/// Engine form of the query context: projection plus per-column qualifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineQueryContext {
    pub columns: Vec<String>,
    pub quals: BTreeMap<String, Vec<Qualifier>>,
}

impl EngineQueryContext {
    pub fn qualifiers(&self) -> impl Iterator<Item = &Qualifier> {
        self.quals.values().flatten()
    }
}

impl From<&QueryContext> for EngineQueryContext {
    fn from(wire: &QueryContext) -> Self {
        let quals = wire
            .constraints
            .iter()
            .map(|(column, list)| {
                let translated = list
                    .constraints
                    .iter()
                    .map(|c| Qualifier::from_constraint(column, c))
                    .collect();
                (column.clone(), translated)
            })
            .collect();

        Self {
            columns: Vec::new(),
            quals,
        }
    }
}

/// Extracts and translates the query context stored under `key`.
///
/// Returns the engine context (without projection) and the parsed wire form,
/// which also carries the requested max-rows.
pub fn build_query_context(
    parameters: &HashMap<String, String>,
    key: &str,
) -> Result<(EngineQueryContext, QueryContext)> {
    let Some(payload) = parameters.get(key) else {
        let mut provided: Vec<String> = parameters.keys().cloned().collect();
        provided.sort();
        return Err(BridgeError::missing_parameter(key, provided));
    };

    debug!(target: "bridge", key, payload = %payload, "Parsing query context");

    let wire: QueryContext = serde_json::from_str(payload).map_err(|e| {
        BridgeError::new(
            ErrorCode::MalformedPayload,
            format!("invalid query context under '{}': {}", key, e),
        )
        .with_context(ErrorContext::MalformedPayload {
            parameter: key.to_string(),
            line: e.line(),
            column: e.column(),
        })
    })?;

    Ok((EngineQueryContext::from(&wire), wire))
}
