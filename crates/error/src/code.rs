use serde::{Deserialize, Serialize};
use std::fmt;

/// Numeric error codes following the BRIDGE-XXXX format.
///
/// ## Code Ranges
/// - **1000-1999**: Request errors (malformed or incomplete action requests)
/// - **2000-2999**: Query errors
/// - **3000-3999**: Configuration and schema errors
/// - **4000-4999**: Credential validation errors
/// - **5000-5999**: Internal/engine errors
///
/// Codes are stable across versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
#[non_exhaustive]
pub enum ErrorCode {
    // === Request Errors (1000-1999) ===
    /// BRIDGE-1001: Required request parameter is absent
    MissingParameter = 1001,
    /// BRIDGE-1002: Parameter present but not parseable
    MalformedPayload = 1002,

    // === Query Errors (2000-2999) ===
    /// BRIDGE-2001: Table not registered with the engine
    TableNotFound = 2001,
    /// BRIDGE-2002: Engine stopped producing rows at the row limit
    RowLimitReached = 2002,
    /// BRIDGE-2003: Engine call exceeded the execution timeout
    ExecutionTimeout = 2003,

    // === Configuration Errors (3000-3999) ===
    /// BRIDGE-3001: Configuration could not be loaded or validated
    InvalidConfig = 3001,
    /// BRIDGE-3002: Table schema violates a registry invariant
    SchemaViolation = 3002,

    // === Credential Errors (4000-4999) ===
    /// BRIDGE-4001: No credential validator configured
    NoValidatorConfigured = 4001,
    /// BRIDGE-4002: Validator rejected the connection set
    CredentialsInvalid = 4002,

    // === Internal Errors (5000-5999) ===
    /// BRIDGE-5001: Failure surfaced by the underlying query engine
    EngineFault = 5001,
    /// BRIDGE-5002: Serialization/deserialization failed
    SerializationFailed = 5002,

    /// BRIDGE-9999: Unknown/unclassified error
    Unknown = 9999,
}

impl ErrorCode {
    /// Get the numeric code value
    pub fn as_u16(&self) -> u16 {
        *self as u16
    }

    /// Get the formatted code string (e.g., "BRIDGE-2001")
    pub fn as_str(&self) -> String {
        format!("BRIDGE-{:04}", self.as_u16())
    }

    pub fn category(&self) -> ErrorCategory {
        match self.as_u16() {
            1000..=1999 => ErrorCategory::Request,
            2000..=2999 => ErrorCategory::Query,
            3000..=3999 => ErrorCategory::Config,
            4000..=4999 => ErrorCategory::Credentials,
            _ => ErrorCategory::Internal,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<ErrorCode> for String {
    fn from(code: ErrorCode) -> String {
        code.as_str()
    }
}

impl TryFrom<String> for ErrorCode {
    type Error = String;

    fn try_from(s: String) -> std::result::Result<Self, Self::Error> {
        let num: u16 = s
            .strip_prefix("BRIDGE-")
            .and_then(|n| n.parse().ok())
            .ok_or_else(|| "Invalid format".to_string())?;
        Self::try_from(num).map_err(|_| "Unknown code".to_string())
    }
}

impl TryFrom<u16> for ErrorCode {
    type Error = String;

    fn try_from(n: u16) -> std::result::Result<Self, Self::Error> {
        match n {
            1001 => Ok(Self::MissingParameter),
            1002 => Ok(Self::MalformedPayload),
            2001 => Ok(Self::TableNotFound),
            2002 => Ok(Self::RowLimitReached),
            2003 => Ok(Self::ExecutionTimeout),
            3001 => Ok(Self::InvalidConfig),
            3002 => Ok(Self::SchemaViolation),
            4001 => Ok(Self::NoValidatorConfigured),
            4002 => Ok(Self::CredentialsInvalid),
            5001 => Ok(Self::EngineFault),
            5002 => Ok(Self::SerializationFailed),
            9999 => Ok(Self::Unknown),
            _ => Err(format!("Unknown error code: {}", n)),
        }
    }
}

/// High-level error category, used by hosts to pick a response class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum ErrorCategory {
    Request,
    Query,
    Config,
    Credentials,
    Internal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_formatting() {
        assert_eq!(ErrorCode::MissingParameter.as_str(), "BRIDGE-1001");
        assert_eq!(ErrorCode::TableNotFound.as_str(), "BRIDGE-2001");
        assert_eq!(ErrorCode::Unknown.as_str(), "BRIDGE-9999");
    }

    #[test]
    fn test_error_code_parsing() {
        assert_eq!(
            ErrorCode::try_from("BRIDGE-2002".to_string()).unwrap(),
            ErrorCode::RowLimitReached
        );
        assert_eq!(
            ErrorCode::try_from("BRIDGE-4001".to_string()).unwrap(),
            ErrorCode::NoValidatorConfigured
        );
    }

    #[test]
    fn test_error_code_parsing_errors() {
        assert!(ErrorCode::try_from("INVALID".to_string()).is_err());
        assert!(ErrorCode::try_from("BRIDGE-0000".to_string()).is_err());
        assert!(ErrorCode::try_from("BRIDGE-XYZ".to_string()).is_err());
        assert!(ErrorCode::try_from("STRAY-1001".to_string()).is_err());
    }

    #[test]
    fn test_error_categories() {
        assert_eq!(
            ErrorCode::MalformedPayload.category(),
            ErrorCategory::Request
        );
        assert_eq!(ErrorCode::ExecutionTimeout.category(), ErrorCategory::Query);
        assert_eq!(ErrorCode::SchemaViolation.category(), ErrorCategory::Config);
        assert_eq!(
            ErrorCode::NoValidatorConfigured.category(),
            ErrorCategory::Credentials
        );
        assert_eq!(ErrorCode::EngineFault.category(), ErrorCategory::Internal);
        assert_eq!(ErrorCode::Unknown.category(), ErrorCategory::Internal);
    }
}
