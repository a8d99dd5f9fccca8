//! Typed column kinds and values produced by the table-query engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Column kind as declared by the engine's table schema.
///
/// The numeric codes match the engine's wire enumeration; codes outside the
/// known set decode to [`ColumnType::Unknown`] instead of failing. Known kinds
/// serialize as their name and unknown ones as their code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "ColumnTypeRepr", into = "ColumnTypeRepr")]
pub enum ColumnType {
    Bool,
    Int,
    Double,
    String,
    Json,
    /// Deprecated: use [`ColumnType::Timestamp`]
    Datetime,
    IpAddr,
    Cidr,
    Timestamp,
    Unknown(i32),
}

impl ColumnType {
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => ColumnType::Bool,
            1 => ColumnType::Int,
            2 => ColumnType::Double,
            3 => ColumnType::String,
            4 => ColumnType::Json,
            5 => ColumnType::Datetime,
            6 => ColumnType::IpAddr,
            7 => ColumnType::Cidr,
            8 => ColumnType::Timestamp,
            other => ColumnType::Unknown(other),
        }
    }
}

impl FromStr for ColumnType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "bool" | "boolean" => ColumnType::Bool,
            "int" | "integer" => ColumnType::Int,
            "double" => ColumnType::Double,
            "string" => ColumnType::String,
            "json" => ColumnType::Json,
            "datetime" => ColumnType::Datetime,
            "ipaddr" | "ipaddress" => ColumnType::IpAddr,
            "cidr" => ColumnType::Cidr,
            "timestamp" => ColumnType::Timestamp,
            _ => ColumnType::Unknown(-1),
        })
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(crate::descriptor::map_column_type(*self))
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum ColumnTypeRepr {
    Code(i32),
    Name(String),
}

impl From<ColumnTypeRepr> for ColumnType {
    fn from(repr: ColumnTypeRepr) -> Self {
        match repr {
            ColumnTypeRepr::Code(code) => ColumnType::from_code(code),
            ColumnTypeRepr::Name(name) => name.parse().unwrap_or(ColumnType::Unknown(-1)),
        }
    }
}

impl From<ColumnType> for ColumnTypeRepr {
    fn from(kind: ColumnType) -> Self {
        match kind {
            ColumnType::Unknown(code) => ColumnTypeRepr::Code(code),
            known => ColumnTypeRepr::Name(known.to_string()),
        }
    }
}

/// A single typed cell as delivered by the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValue {
    Null,
    String(String),
    Bool(bool),
    Int(i64),
    Double(f64),
    /// Raw JSON text
    Json(String),
    Timestamp(DateTime<Utc>),
    IpAddr(String),
    Cidr(String),
    /// Engine sent a cell without a value kind
    Unset,
}

impl ColumnValue {
    /// Converts a loosely typed JSON value into the cell kind a column declares.
    ///
    /// Values that do not fit the declared kind become [`ColumnValue::Unset`].
    pub fn from_json(value: &serde_json::Value, kind: ColumnType) -> Self {
        use serde_json::Value;

        if value.is_null() {
            return ColumnValue::Null;
        }
        match (kind, value) {
            (ColumnType::String, Value::String(s)) => ColumnValue::String(s.clone()),
            (ColumnType::String, other) => ColumnValue::String(other.to_string()),
            (ColumnType::Bool, Value::Bool(b)) => ColumnValue::Bool(*b),
            (ColumnType::Int, Value::Number(n)) => {
                n.as_i64().map(ColumnValue::Int).unwrap_or(ColumnValue::Unset)
            }
            (ColumnType::Double, Value::Number(n)) => {
                n.as_f64().map(ColumnValue::Double).unwrap_or(ColumnValue::Unset)
            }
            (ColumnType::Json, Value::String(s)) => ColumnValue::Json(s.clone()),
            (ColumnType::Json, other) => ColumnValue::Json(other.to_string()),
            (ColumnType::Timestamp | ColumnType::Datetime, Value::String(s)) => {
                DateTime::parse_from_rfc3339(s)
                    .map(|ts| ColumnValue::Timestamp(ts.with_timezone(&Utc)))
                    .unwrap_or(ColumnValue::Unset)
            }
            (ColumnType::IpAddr, Value::String(s)) => ColumnValue::IpAddr(s.clone()),
            (ColumnType::Cidr, Value::String(s)) => ColumnValue::Cidr(s.clone()),
            _ => ColumnValue::Unset,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_code_known_and_unknown() {
        assert_eq!(ColumnType::from_code(3), ColumnType::String);
        assert_eq!(ColumnType::from_code(8), ColumnType::Timestamp);
        assert_eq!(ColumnType::from_code(42), ColumnType::Unknown(42));
    }

    #[test]
    fn test_deserialize_from_code_or_name() {
        let kinds: Vec<ColumnType> = serde_json::from_str(r#"[1, "double", "ltree", 99]"#).unwrap();
        assert_eq!(
            kinds,
            vec![
                ColumnType::Int,
                ColumnType::Double,
                ColumnType::Unknown(-1),
                ColumnType::Unknown(99)
            ]
        );
    }

    #[test]
    fn test_serialize_keeps_unknown_codes() {
        let kinds = vec![ColumnType::Int, ColumnType::Unknown(42), ColumnType::Datetime];
        let text = serde_json::to_string(&kinds).unwrap();
        assert_eq!(text, r#"["int",42,"datetime"]"#);

        let back: Vec<ColumnType> = serde_json::from_str(&text).unwrap();
        assert_eq!(back, kinds);
    }

    #[test]
    fn test_value_from_json() {
        assert_eq!(
            ColumnValue::from_json(&json!(30), ColumnType::Int),
            ColumnValue::Int(30)
        );
        assert_eq!(
            ColumnValue::from_json(&json!(null), ColumnType::Int),
            ColumnValue::Null
        );
        assert_eq!(
            ColumnValue::from_json(&json!({"a": 1}), ColumnType::Json),
            ColumnValue::Json(r#"{"a":1}"#.to_string())
        );
        assert_eq!(
            ColumnValue::from_json(&json!("nope"), ColumnType::Int),
            ColumnValue::Unset
        );
        assert!(matches!(
            ColumnValue::from_json(&json!("2024-01-02T03:04:05Z"), ColumnType::Timestamp),
            ColumnValue::Timestamp(_)
        ));
    }
}
