//! tablebridge runtime: drives a table-query engine through the
//! action-execution protocol.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tablebridge_core::MemoryEngine;
//! use tablebridge_runtime::plugin::{QueryPlugin, QueryPluginOptions};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = MemoryEngine::from_path("fixtures.yaml")?;
//! let plugin = QueryPlugin::new(QueryPluginOptions::new(Arc::new(engine)));
//! for action in plugin.list_actions() {
//!     println!("{}", action.name);
//! }
//! # Ok(())
//! # }
//! ```

pub mod credentials;
pub mod plugin;

pub use credentials::{CredentialValidator, RequiredFieldsValidator};
pub use plugin::{QueryPlugin, QueryPluginOptions};
