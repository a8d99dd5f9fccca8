//! # tablebridge-error
//!
//! Unified error type for the tablebridge query execution bridge.
//!
//! Every error carries:
//! - A numeric error code (BRIDGE-XXXX)
//! - Optional structured JSON context
//! - An optional actionable hint

mod code;
mod context;
mod convert;

pub use code::{ErrorCategory, ErrorCode};
pub use context::ErrorContext;

use serde::{Deserialize, Serialize};
use std::fmt;

/// The unified error type for all bridge operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeError {
    /// Numeric error code (e.g., "BRIDGE-1001")
    pub code: ErrorCode,

    /// Human-readable error message
    pub message: String,

    /// Structured context for programmatic handling
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<ErrorContext>,

    /// Suggestion for the caller
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl BridgeError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: None,
            hint: None,
        }
    }

    pub fn with_context(mut self, context: ErrorContext) -> Self {
        self.context = Some(context);
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn missing_parameter(parameter: &str, provided: Vec<String>) -> Self {
        BridgeError::new(
            ErrorCode::MissingParameter,
            format!(
                "query context not found in parameters with key {}",
                parameter
            ),
        )
        .with_context(ErrorContext::MissingParameter {
            parameter: parameter.to_string(),
            provided,
        })
    }

    pub fn engine_fault(message: impl Into<String>) -> Self {
        BridgeError::new(ErrorCode::EngineFault, message)
    }

    /// True for failures the caller may treat as a partial success
    pub fn is_row_limit(&self) -> bool {
        self.code == ErrorCode::RowLimitReached
    }

    pub fn category(&self) -> ErrorCategory {
        self.code.category()
    }

    /// Serialize to JSON for host responses
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            tracing::warn!("Failed to serialize BridgeError: {}", e);
            format!(
                r#"{{"code":"{}","message":"Serialization failed"}}"#,
                self.code
            )
        })
    }
}

impl fmt::Display for BridgeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(hint) = &self.hint {
            write!(f, " (Hint: {})", hint)?;
        }
        Ok(())
    }
}

impl std::error::Error for BridgeError {}

/// Result type alias for bridge operations
pub type Result<T> = std::result::Result<T, BridgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bridge_error_builder() {
        let err = BridgeError::new(ErrorCode::EngineFault, "upstream closed")
            .with_hint("Retry the request");

        assert_eq!(err.code, ErrorCode::EngineFault);
        assert_eq!(err.message, "upstream closed");
        assert_eq!(err.hint, Some("Retry the request".to_string()));
        assert!(err.context.is_none());
    }

    #[test]
    fn test_display_implementation() {
        let err = BridgeError::new(ErrorCode::MalformedPayload, "expected value")
            .with_hint("Send valid JSON");
        assert_eq!(
            err.to_string(),
            "[BRIDGE-1002] expected value (Hint: Send valid JSON)"
        );

        let err_no_hint = BridgeError::new(ErrorCode::EngineFault, "boom");
        assert_eq!(err_no_hint.to_string(), "[BRIDGE-5001] boom");
    }

    #[test]
    fn test_missing_parameter() {
        let err = BridgeError::missing_parameter("query.ctx", vec!["other".to_string()]);
        assert_eq!(err.code, ErrorCode::MissingParameter);
        assert!(err.message.contains("query.ctx"));
        assert!(matches!(
            err.context,
            Some(ErrorContext::MissingParameter { ref parameter, .. }) if parameter == "query.ctx"
        ));
    }

    #[test]
    fn test_row_limit_detection() {
        assert!(BridgeError::new(ErrorCode::RowLimitReached, "limit").is_row_limit());
        assert!(!BridgeError::engine_fault("limit").is_row_limit());
    }
}
