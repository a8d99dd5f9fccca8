//! Credential validation contract.
//!
//! Whether a connection set is usable is decided by plugin-specific logic; the
//! bridge only forwards the call and its verdict.

use async_trait::async_trait;
use std::collections::BTreeMap;
use tablebridge_common::action::{ConnectionSet, CredentialsValidationResponse};
use tablebridge_error::{BridgeError, ErrorCode, Result};

#[async_trait]
pub trait CredentialValidator: Send + Sync {
    async fn validate(&self, connections: &ConnectionSet)
        -> Result<CredentialsValidationResponse>;
}

/// Accepts a connection set when every listed connection carries the listed
/// data keys with a non-empty value.
#[derive(Debug, Clone, Default)]
pub struct RequiredFieldsValidator {
    required: BTreeMap<String, Vec<String>>,
}

impl RequiredFieldsValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn require(mut self, connection: impl Into<String>, field: impl Into<String>) -> Self {
        self.required
            .entry(connection.into())
            .or_default()
            .push(field.into());
        self
    }

    /// Parses `connection.field` specs, e.g. `aws.access_key`.
    pub fn from_specs<S: AsRef<str>>(specs: impl IntoIterator<Item = S>) -> Result<Self> {
        specs.into_iter().try_fold(Self::new(), |validator, spec| {
            let spec = spec.as_ref();
            match spec.split_once('.') {
                Some((connection, field)) if !connection.is_empty() && !field.is_empty() => {
                    Ok(validator.require(connection, field))
                }
                _ => Err(BridgeError::new(
                    ErrorCode::InvalidConfig,
                    format!("invalid credential requirement '{}'", spec),
                )
                .with_hint("Use the form <connection>.<field>, e.g. aws.access_key")),
            }
        })
    }
}

#[async_trait]
impl CredentialValidator for RequiredFieldsValidator {
    async fn validate(
        &self,
        connections: &ConnectionSet,
    ) -> Result<CredentialsValidationResponse> {
        if connections.is_empty() {
            return Err(BridgeError::new(
                ErrorCode::CredentialsInvalid,
                "no connections supplied",
            ));
        }

        let missing: Vec<String> = self
            .required
            .iter()
            .flat_map(|(connection, fields)| {
                let instance = connections.get(connection);
                fields
                    .iter()
                    .filter(move |field| {
                        instance
                            .and_then(|c| c.value(field))
                            .map_or(true, str::is_empty)
                    })
                    .map(move |field| format!("{}.{}", connection, field))
            })
            .collect();

        Ok(CredentialsValidationResponse {
            are_credentials_valid: missing.is_empty(),
            raw_validation_response: (!missing.is_empty())
                .then(|| format!("missing credentials: {}", missing.join(", "))),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tablebridge_common::action::ConnectionInstance;

    fn aws(key: &str) -> ConnectionSet {
        ConnectionSet::from([(
            "aws".to_string(),
            ConnectionInstance::new("1", "aws").with_value("access_key", key),
        )])
    }

    #[tokio::test]
    async fn test_all_fields_present() {
        let validator = RequiredFieldsValidator::from_specs(["aws.access_key"]).unwrap();
        let response = validator.validate(&aws("AKIA")).await.unwrap();
        assert!(response.are_credentials_valid);
        assert_eq!(response.raw_validation_response, None);
    }

    #[tokio::test]
    async fn test_missing_and_empty_fields() {
        let validator = RequiredFieldsValidator::new()
            .require("aws", "access_key")
            .require("aws", "secret_key")
            .require("github", "token");

        let response = validator.validate(&aws("")).await.unwrap();
        assert!(!response.are_credentials_valid);
        assert_eq!(
            response.raw_validation_response.as_deref(),
            Some("missing credentials: aws.access_key, aws.secret_key, github.token")
        );
    }

    #[tokio::test]
    async fn test_empty_connection_set() {
        let err = RequiredFieldsValidator::new()
            .validate(&ConnectionSet::new())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::CredentialsInvalid);
    }

    #[test]
    fn test_invalid_spec() {
        let err = RequiredFieldsValidator::from_specs(["aws"]).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidConfig);
        assert!(RequiredFieldsValidator::from_specs([".key"]).is_err());
    }
}
