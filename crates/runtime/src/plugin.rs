//! The execution orchestrator.
//!
//! [`QueryPlugin`] exposes a table-query engine through the action-execution
//! protocol: one action per table, string parameters in, string rows out.
//!
//! An execution runs these steps:
//! 1. Resolve the table named by the action.
//! 2. Parse the query context carried in the parameters.
//! 3. Project every declared column and drop qualifiers on undeclared ones.
//! 4. Stream the engine's rows into a fresh [`ResultStream`].
//! 5. Package the rows, downgrading a row-limit stop to a partial result.
//!
//! Timeouts, engine failures and panics are fatal and reported as
//! [`BridgeError`]s.

use futures::FutureExt;
use once_cell::sync::OnceCell;
use std::any::Any;
use std::collections::HashSet;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tablebridge_common::action::{
    ActionContext, ActionDescriptor, ConnectionSet, CredentialsValidationResponse,
    ExecuteActionRequest, ExecuteActionResponse, PluginDescription,
};
use tablebridge_common::config::AppConfig;
use tablebridge_core::descriptor::build_descriptors;
use tablebridge_core::engine::SharedCache;
use tablebridge_core::qualifier::{build_query_context, EngineQueryContext};
use tablebridge_core::{
    ConnectionCache, ExecuteRequest, ExecutionContext, QueryEngine, ResultStream, TableDefinition,
};
use tablebridge_error::{BridgeError, ErrorCode, ErrorContext, Result};
use tracing::{debug, error, info, warn};

use crate::credentials::CredentialValidator;

pub struct QueryPluginOptions {
    pub engine: Arc<dyn QueryEngine>,
    pub config: AppConfig,
    pub validator: Option<Arc<dyn CredentialValidator>>,
    /// Shared with other plugins when set, otherwise built from `config.cache`
    pub cache: Option<SharedCache>,
}

impl QueryPluginOptions {
    pub fn new(engine: Arc<dyn QueryEngine>) -> Self {
        Self {
            engine,
            config: AppConfig::default(),
            validator: None,
            cache: None,
        }
    }
}

pub struct QueryPlugin {
    engine: Arc<dyn QueryEngine>,
    config: AppConfig,
    validator: Option<Arc<dyn CredentialValidator>>,
    descriptors: OnceCell<Vec<ActionDescriptor>>,
    cache: SharedCache,
}

impl QueryPlugin {
    pub fn new(options: QueryPluginOptions) -> Self {
        let cache = options
            .cache
            .unwrap_or_else(|| Arc::new(ConnectionCache::new(&options.config.cache)));

        Self {
            engine: options.engine,
            config: options.config,
            validator: options.validator,
            descriptors: OnceCell::new(),
            cache,
        }
    }

    pub fn describe(&self) -> PluginDescription {
        PluginDescription {
            name: self.config.plugin.name.clone(),
            description: self.config.plugin.description.clone(),
        }
    }

    /// Descriptors of every table, in table-name order. Built on first call.
    pub fn list_actions(&self) -> &[ActionDescriptor] {
        self.descriptors.get_or_init(|| {
            let descriptors = build_descriptors(self.engine.schema());
            debug!(count = descriptors.len(), "Built action descriptors");
            descriptors
        })
    }

    pub fn cache(&self) -> &SharedCache {
        &self.cache
    }

    pub async fn test_credentials(
        &self,
        connections: &ConnectionSet,
    ) -> Result<CredentialsValidationResponse> {
        let Some(validator) = &self.validator else {
            return Err(BridgeError::new(
                ErrorCode::NoValidatorConfigured,
                "no TestCredentials function found",
            )
            .with_hint("Register a CredentialValidator in QueryPluginOptions"));
        };

        let response = validator.validate(connections).await?;
        info!(
            connections = connections.len(),
            valid = response.are_credentials_valid,
            "Credentials tested"
        );
        Ok(response)
    }

    pub async fn execute(
        &self,
        action_context: &ActionContext,
        request: ExecuteActionRequest,
    ) -> Result<ExecuteActionResponse> {
        let table = request.name.clone();
        let start = Instant::now();

        let outcome = AssertUnwindSafe(self.execute_table(action_context, request))
            .catch_unwind()
            .await;

        let result = match outcome {
            Ok(result) => result,
            Err(payload) => {
                let detail = panic_message(payload.as_ref());
                error!(target: "bridge", table = %table, panic = %detail, "Execution panicked");
                Err(
                    BridgeError::engine_fault(format!("execution of '{}' panicked: {}", table, detail))
                        .with_context(ErrorContext::Engine {
                            table: table.clone(),
                        }),
                )
            }
        };

        let duration_ms = start.elapsed().as_millis() as u64;
        match &result {
            Ok(response) => info!(
                target: "bridge",
                table = %table,
                caller = action_context.caller().unwrap_or("anonymous"),
                duration_ms,
                rows_returned = response.rows.len(),
                truncated = response.error_message.is_some(),
                success = true
            ),
            Err(e) => info!(
                target: "bridge",
                table = %table,
                caller = action_context.caller().unwrap_or("anonymous"),
                duration_ms,
                code = %e.code,
                success = false
            ),
        }
        result
    }

    async fn execute_table(
        &self,
        action_context: &ActionContext,
        request: ExecuteActionRequest,
    ) -> Result<ExecuteActionResponse> {
        let schema = self.engine.schema();
        let table = schema
            .get(&request.name)
            .ok_or_else(|| BridgeError::table_not_found(&request.name, schema.names()))?;

        let (mut query_context, wire) =
            build_query_context(&request.parameters, &self.config.plugin.query_context_key)?;
        query_context.columns = table.column_names().map(String::from).collect();
        drop_undeclared_qualifiers(table, &mut query_context);

        let max_rows = wire
            .max_rows
            .unwrap_or(self.config.query_limits.default_max_rows);
        let timeout_secs = match request.timeout {
            0 => self.config.query_limits.default_timeout_secs,
            secs => secs,
        };
        let key_lookup = is_key_lookup(table, &query_context);

        let ctx = ExecutionContext::new(
            Arc::new(action_context.clone()),
            Duration::from_secs(timeout_secs),
            Arc::clone(&self.cache),
        );
        let mut sink = ResultStream::new(max_rows);

        debug!(
            target: "bridge",
            table = table.name(),
            max_rows,
            timeout_secs,
            key_lookup,
            qualifiers = query_context.qualifiers().count(),
            "Executing table query"
        );

        let engine_request = ExecuteRequest {
            table: table.name().to_string(),
            query_context,
            max_rows,
            key_lookup,
        };
        let outcome = tokio::time::timeout(
            ctx.timeout(),
            self.engine.execute(&ctx, engine_request, &mut sink),
        )
        .await;

        match outcome {
            Ok(Ok(())) => Ok(ExecuteActionResponse {
                rows: sink.into_rows(),
                error_message: None,
            }),
            Ok(Err(e)) if e.is_row_limit() => {
                warn!(
                    target: "bridge",
                    table = table.name(),
                    max_rows,
                    rows_collected = sink.len(),
                    "Row limit reached, returning partial result"
                );
                Ok(ExecuteActionResponse {
                    rows: sink.into_rows(),
                    error_message: Some(format!("{:#}", e)),
                })
            }
            Ok(Err(e)) => {
                error!(
                    target: "bridge",
                    table = table.name(),
                    rows_discarded = sink.len(),
                    "Table query failed: {:#}",
                    e
                );
                Err(BridgeError::from(e).with_context(ErrorContext::Engine {
                    table: table.name().to_string(),
                }))
            }
            Err(_) => {
                error!(
                    target: "bridge",
                    table = table.name(),
                    timeout_secs,
                    rows_discarded = sink.len(),
                    "Table query timed out"
                );
                Err(BridgeError::new(
                    ErrorCode::ExecutionTimeout,
                    format!(
                        "query on '{}' timed out after {} seconds",
                        table.name(),
                        timeout_secs
                    ),
                )
                .with_context(ErrorContext::Timeout {
                    table: table.name().to_string(),
                    timeout_secs,
                })
                .with_hint("Narrow the constraints or raise the request timeout"))
            }
        }
    }
}

/// Removes qualifiers on columns `table` does not declare.
fn drop_undeclared_qualifiers(table: &TableDefinition, query_context: &mut EngineQueryContext) {
    query_context.quals.retain(|column, qualifiers| {
        let declared = table.column(column).is_some();
        if !declared {
            warn!(
                target: "bridge",
                table = table.name(),
                column = %column,
                dropped = qualifiers.len(),
                "Dropping qualifiers on undeclared column"
            );
        }
        declared
    });
}

/// True when the equality qualifiers pin down a single row of `table`.
fn is_key_lookup(table: &TableDefinition, query_context: &EngineQueryContext) -> bool {
    let Some(keys) = table.key_columns() else {
        return false;
    };

    let equality: HashSet<&str> = query_context
        .qualifiers()
        .filter(|q| q.operator == "=")
        .map(|q| q.field_name.as_str())
        .collect();
    let satisfied = keys.is_satisfied_by(&equality);

    debug!(
        target: "bridge",
        table = table.name(),
        key_columns = %keys,
        satisfied,
        "Checked key column qualifiers"
    );
    satisfied
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
