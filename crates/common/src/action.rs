//! Shapes of the action-execution host protocol.
//!
//! The host invokes one action per table: it sends an [`ExecuteActionRequest`]
//! together with an [`ActionContext`] describing the caller's connections, and
//! expects an [`ExecuteActionResponse`] holding string-valued rows.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

fn serialize_secrets<S>(
    data: &BTreeMap<String, SecretString>,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    use serde::ser::SerializeMap;
    let mut map = serializer.serialize_map(Some(data.len()))?;
    for key in data.keys() {
        map.serialize_entry(key, "[REDACTED]")?;
    }
    map.end()
}

fn deserialize_secrets<'de, D>(deserializer: D) -> Result<BTreeMap<String, SecretString>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw: BTreeMap<String, String> = BTreeMap::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .map(|(k, v)| (k, SecretString::from(v)))
        .collect())
}

/// One configured connection (credential bundle) available to the caller.
///
/// Serializing redacts the secret values; use [`ConnectionInstance::canonical_value`]
/// when the actual content matters.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ConnectionInstance {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(
        default,
        serialize_with = "serialize_secrets",
        deserialize_with = "deserialize_secrets"
    )]
    pub data: BTreeMap<String, SecretString>,
}

impl ConnectionInstance {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            data: BTreeMap::new(),
        }
    }

    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.data
            .insert(key.into(), SecretString::from(value.into()));
        self
    }

    pub fn value(&self, key: &str) -> Option<&str> {
        self.data.get(key).map(|s| s.expose_secret())
    }

    /// JSON form including secret values, with keys in sorted order.
    pub fn canonical_value(&self) -> serde_json::Value {
        let data: serde_json::Map<String, serde_json::Value> = self
            .data
            .iter()
            .map(|(k, v)| (k.clone(), serde_json::Value::from(v.expose_secret())))
            .collect();
        serde_json::json!({
            "data": data,
            "id": self.id,
            "name": self.name,
        })
    }
}

/// Connections keyed by connection type (e.g. "aws", "github").
pub type ConnectionSet = BTreeMap<String, ConnectionInstance>;

/// Caller context supplied by the host with every invocation.
#[derive(Debug, Clone, Default)]
pub struct ActionContext {
    caller: Option<String>,
    connections: ConnectionSet,
}

impl ActionContext {
    pub fn new(caller: Option<String>, connections: ConnectionSet) -> Self {
        Self {
            caller,
            connections,
        }
    }

    pub fn caller(&self) -> Option<&str> {
        self.caller.as_deref()
    }

    pub fn connections(&self) -> &ConnectionSet {
        &self.connections
    }

    pub fn connection(&self, name: &str) -> Option<&ConnectionInstance> {
        self.connections.get(name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ExecuteActionRequest {
    /// Action (table) name
    pub name: String,
    #[serde(default)]
    pub parameters: HashMap<String, String>,
    /// Seconds; zero means "use the configured default"
    #[serde(default)]
    pub timeout: u64,
}

/// One output row, column name to normalized string value.
pub type ResultRow = HashMap<String, String>;

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ExecuteActionResponse {
    pub rows: Vec<ResultRow>,
    /// Set when the rows are a partial result (e.g. the row limit was reached)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OutputSchema {
    pub name: String,
    pub fields: Vec<Field>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActionDescriptor {
    pub name: String,
    pub description: String,
    pub enabled: bool,
    pub output: OutputSchema,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct PluginDescription {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CredentialsValidationResponse {
    pub are_credentials_valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_validation_response: Option<String>,
}
