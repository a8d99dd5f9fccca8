//! Table schemas exposed by the query engine.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use tablebridge_error::{BridgeError, ErrorCode, ErrorContext, Result};

use crate::types::ColumnType;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDefinition {
    pub name: String,
    pub column_type: ColumnType,
}

impl ColumnDefinition {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
        }
    }
}

/// Columns which identify a single row of a table.
///
/// - `Single`: one column is the key
/// - `All`: the listed columns together form the key
/// - `Any`: any one of the listed columns is a key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyColumnSet {
    Single(String),
    All(Vec<String>),
    Any(Vec<String>),
}

impl KeyColumnSet {
    pub fn single(column: impl Into<String>) -> Self {
        KeyColumnSet::Single(column.into())
    }

    pub fn all<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        KeyColumnSet::All(columns.into_iter().map(Into::into).collect())
    }

    pub fn any<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        KeyColumnSet::Any(columns.into_iter().map(Into::into).collect())
    }

    /// True when equality constraints on `columns` pin down a single row.
    pub fn is_satisfied_by(&self, columns: &HashSet<&str>) -> bool {
        match self {
            KeyColumnSet::Single(column) => columns.contains(column.as_str()),
            KeyColumnSet::All(keys) => {
                !keys.is_empty() && keys.iter().all(|k| columns.contains(k.as_str()))
            }
            KeyColumnSet::Any(keys) => keys.iter().any(|k| columns.contains(k.as_str())),
        }
    }

    fn columns(&self) -> Vec<&str> {
        match self {
            KeyColumnSet::Single(column) => vec![column.as_str()],
            KeyColumnSet::All(keys) | KeyColumnSet::Any(keys) => {
                keys.iter().map(String::as_str).collect()
            }
        }
    }
}

impl fmt::Display for KeyColumnSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyColumnSet::Single(column) => write!(f, "column: {}", column),
            KeyColumnSet::All(keys) => write!(f, "all columns: {}", keys.join(",")),
            KeyColumnSet::Any(keys) => write!(f, "one of columns: {}", keys.join(",")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableDefinition {
    name: String,
    description: String,
    columns: Vec<ColumnDefinition>,
    key_columns: Option<KeyColumnSet>,
}

impl TableDefinition {
    /// Column names must be unique within a table.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        columns: Vec<ColumnDefinition>,
    ) -> Result<Self> {
        let name = name.into();
        let mut seen = HashSet::new();
        for column in &columns {
            if !seen.insert(column.name.as_str()) {
                return Err(BridgeError::new(
                    ErrorCode::SchemaViolation,
                    format!("duplicate column '{}' in table '{}'", column.name, name),
                )
                .with_context(ErrorContext::Schema {
                    table: name.clone(),
                    column: Some(column.name.clone()),
                }));
            }
        }

        Ok(Self {
            name,
            description: description.into(),
            columns,
            key_columns: None,
        })
    }

    /// Key columns must be declared columns of the table.
    pub fn with_key_columns(mut self, keys: KeyColumnSet) -> Result<Self> {
        if let Some(missing) = keys.columns().into_iter().find(|k| self.column(k).is_none()) {
            return Err(BridgeError::new(
                ErrorCode::SchemaViolation,
                format!(
                    "key column '{}' is not declared in table '{}'",
                    missing, self.name
                ),
            )
            .with_context(ErrorContext::Schema {
                table: self.name.clone(),
                column: Some(missing.to_string()),
            }));
        }
        self.key_columns = Some(keys);
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn columns(&self) -> &[ColumnDefinition] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&ColumnDefinition> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn key_columns(&self) -> Option<&KeyColumnSet> {
        self.key_columns.as_ref()
    }
}

/// Name-ordered set of the tables an engine can query.
#[derive(Debug, Clone, Default)]
pub struct TableRegistry {
    tables: BTreeMap<String, TableDefinition>,
}

impl TableRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, table: TableDefinition) -> Result<()> {
        if self.tables.contains_key(table.name()) {
            return Err(BridgeError::new(
                ErrorCode::SchemaViolation,
                format!("table '{}' registered twice", table.name()),
            )
            .with_context(ErrorContext::Schema {
                table: table.name().to_string(),
                column: None,
            }));
        }
        self.tables.insert(table.name().to_string(), table);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&TableDefinition> {
        self.tables.get(name)
    }

    pub fn tables(&self) -> impl Iterator<Item = &TableDefinition> {
        self.tables.values()
    }

    pub fn names(&self) -> Vec<String> {
        self.tables.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}
