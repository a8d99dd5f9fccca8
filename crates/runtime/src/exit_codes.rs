//! Process exit codes of the `tablebridge` binary.

/// Unclassified failure
pub const GENERAL_ERROR: i32 = 1;

/// Configuration or fixture could not be loaded
pub const CONFIG_ERROR: i32 = 3;

/// Request was rejected (missing or malformed query context)
pub const REQUEST_ERROR: i32 = 4;

/// Table lookup, engine failure or timeout
pub const QUERY_ERROR: i32 = 5;

/// Credential validation could not run or rejected the connections
pub const CREDENTIALS_ERROR: i32 = 7;

/// Rows were returned but the result is truncated
pub const PARTIAL_FAILURE: i32 = 8;
