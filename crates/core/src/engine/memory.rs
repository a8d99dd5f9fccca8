//! Fixture-backed engine used by the binary and the integration tests.
//!
//! A fixture document lists tables with their columns, optional key columns
//! and literal rows:
//!
//! ```yaml
//! tables:
//!   - name: users
//!     description: Registered users
//!     columns:
//!       - { name: id, type: int }
//!       - { name: email, type: string }
//!     key_columns: { single: id }
//!     rows:
//!       - { id: 1, email: a@example.com }
//! ```
//!
//! JSON documents parse as well.

use anyhow::anyhow;
use async_trait::async_trait;
use serde::Deserialize;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::Path;
use tablebridge_error::{BridgeError, ErrorCode, ErrorContext, Result};
use tracing::debug;

use super::{EngineError, ExecuteRequest, ExecutionContext, QueryEngine};
use crate::normalize::normalize;
use crate::qualifier::Qualifier;
use crate::schema::{ColumnDefinition, KeyColumnSet, TableDefinition, TableRegistry};
use crate::sink::{EngineRow, RowSink};
use crate::types::{ColumnType, ColumnValue};

#[derive(Debug, Deserialize)]
struct FixtureDocument {
    #[serde(default)]
    tables: Vec<TableFixture>,
}

#[derive(Debug, Deserialize)]
struct TableFixture {
    name: String,
    #[serde(default)]
    description: String,
    columns: Vec<ColumnFixture>,
    #[serde(default)]
    key_columns: Option<KeyColumnSet>,
    #[serde(default)]
    rows: Vec<serde_json::Map<String, serde_json::Value>>,
}

#[derive(Debug, Deserialize)]
struct ColumnFixture {
    name: String,
    #[serde(rename = "type")]
    column_type: ColumnType,
}

#[derive(Debug, Default)]
pub struct MemoryEngine {
    registry: TableRegistry,
    rows: HashMap<String, Vec<EngineRow>>,
}

impl MemoryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_yaml(document: &str) -> Result<Self> {
        let document: FixtureDocument = serde_yaml::from_str(document)?;

        let mut engine = Self::new();
        for fixture in document.tables {
            let columns = fixture
                .columns
                .iter()
                .map(|c| ColumnDefinition::new(&c.name, c.column_type))
                .collect();
            let mut table = TableDefinition::new(&fixture.name, fixture.description, columns)?;
            if let Some(keys) = fixture.key_columns {
                table = table.with_key_columns(keys)?;
            }

            let rows = fixture
                .rows
                .iter()
                .map(|raw| typed_row(&table, raw))
                .collect::<Result<Vec<_>>>()?;
            engine = engine.with_table(table, rows)?;
        }
        Ok(engine)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let document = std::fs::read_to_string(path).map_err(|e| {
            BridgeError::from(e).with_context(ErrorContext::Config {
                file_path: Some(path.display().to_string()),
                field: None,
            })
        })?;
        Self::from_yaml(&document)
    }

    pub fn with_table(mut self, table: TableDefinition, rows: Vec<EngineRow>) -> Result<Self> {
        let name = table.name().to_string();
        self.registry.register(table)?;
        self.rows.insert(name, rows);
        Ok(self)
    }
}

fn typed_row(
    table: &TableDefinition,
    raw: &serde_json::Map<String, serde_json::Value>,
) -> Result<EngineRow> {
    raw.iter()
        .map(|(name, value)| match table.column(name) {
            Some(column) => Ok((name.clone(), ColumnValue::from_json(value, column.column_type))),
            None => Err(BridgeError::new(
                ErrorCode::SchemaViolation,
                format!("fixture row has undeclared column '{}'", name),
            )
            .with_context(ErrorContext::Schema {
                table: table.name().to_string(),
                column: Some(name.clone()),
            })),
        })
        .collect()
}

/// Numeric comparison when both sides parse as numbers, text otherwise.
fn compare(cell: &str, expression: &str) -> Ordering {
    match (cell.parse::<f64>(), expression.parse::<f64>()) {
        (Ok(a), Ok(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
        _ => cell.cmp(expression),
    }
}

/// SQL `LIKE`: `%` matches any run, `_` a single character.
///
/// Greedy scan that backtracks only to the most recent `%`, so the cost is
/// bounded by `text.len() * pattern.len()` whatever the wildcard count.
fn like(text: &[char], pattern: &[char]) -> bool {
    let (mut t, mut p) = (0, 0);
    // (position after the last `%`, text position it currently absorbs up to)
    let mut star: Option<(usize, usize)> = None;

    while t < text.len() {
        match pattern.get(p) {
            Some('%') => {
                p += 1;
                star = Some((p, t));
            }
            Some(&c) if c == '_' || c == text[t] => {
                t += 1;
                p += 1;
            }
            _ => match star {
                Some((resume, absorbed)) => {
                    p = resume;
                    t = absorbed + 1;
                    star = Some((resume, t));
                }
                None => return false,
            },
        }
    }

    pattern[p..].iter().all(|&c| c == '%')
}

fn qualifier_matches(row: &EngineRow, qual: &Qualifier) -> bool {
    let cell = row.get(&qual.field_name).map(normalize).unwrap_or_default();
    let expression = qual.value.as_str();

    match qual.operator.as_str() {
        "=" => compare(&cell, expression) == Ordering::Equal,
        ">" => compare(&cell, expression) == Ordering::Greater,
        ">=" => compare(&cell, expression) != Ordering::Less,
        "<" => compare(&cell, expression) == Ordering::Less,
        "<=" => compare(&cell, expression) != Ordering::Greater,
        "like" => {
            let text: Vec<char> = cell.chars().collect();
            let pattern: Vec<char> = expression.chars().collect();
            like(&text, &pattern)
        }
        // unique / unsupported: left to the caller to re-check
        _ => true,
    }
}

#[async_trait]
impl QueryEngine for MemoryEngine {
    fn schema(&self) -> &TableRegistry {
        &self.registry
    }

    async fn execute(
        &self,
        ctx: &ExecutionContext,
        request: ExecuteRequest,
        sink: &mut dyn RowSink,
    ) -> std::result::Result<(), EngineError> {
        let rows = self
            .rows
            .get(&request.table)
            .ok_or_else(|| anyhow!("no rows loaded for table '{}'", request.table))?;

        debug!(
            table = %request.table,
            scope = ?ctx.scope().hash(),
            key_lookup = request.key_lookup,
            "Scanning memory table"
        );

        let mut sent = 0usize;
        for row in rows
            .iter()
            .filter(|row| request.query_context.qualifiers().all(|q| qualifier_matches(row, q)))
        {
            if sent == request.max_rows {
                return Err(EngineError::RowLimitReached {
                    limit: request.max_rows,
                });
            }

            let projected: EngineRow = request
                .query_context
                .columns
                .iter()
                .filter_map(|c| row.get(c).map(|v| (c.clone(), v.clone())))
                .collect();
            sink.send(projected);
            sent += 1;

            if request.key_lookup {
                break;
            }
        }
        Ok(())
    }
}
