//! tablebridge command-line runner.
//!
//! Loads a fixture document into the in-memory engine and drives it through
//! the bridge, printing protocol responses as JSON on stdout:
//!
//! - `describe`: list the action descriptors
//! - `execute`: run one table query
//! - `test-credentials`: check a connection set for required fields

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tablebridge_common::action::{ActionContext, ConnectionSet, ExecuteActionRequest};
use tablebridge_common::config::AppConfig;
use tablebridge_common::telemetry::{init_tracing, shutdown_telemetry};
use tablebridge_core::MemoryEngine;
use tablebridge_error::{BridgeError, ErrorCategory};
use tablebridge_runtime::{QueryPlugin, QueryPluginOptions, RequiredFieldsValidator};

mod exit_codes;

#[derive(Parser)]
#[command(name = "tablebridge")]
#[command(about = "Run table queries through the action-execution bridge", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (YAML or TOML); missing files fall back to defaults
    #[arg(
        long,
        global = true,
        env = "TABLEBRIDGE_CONFIG",
        default_value = "config/tablebridge.yaml"
    )]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the plugin description and its action descriptors
    Describe {
        /// Fixture document with the tables to expose
        #[arg(long)]
        fixtures: PathBuf,
    },
    /// Execute one table query
    Execute {
        /// Fixture document with the tables to expose
        #[arg(long)]
        fixtures: PathBuf,
        /// Table (action) name
        #[arg(long)]
        table: String,
        /// Serialized query context
        #[arg(long, default_value = "{}")]
        query_ctx: String,
        /// Timeout in seconds; 0 uses the configured default
        #[arg(long, default_value_t = 0)]
        timeout: u64,
        /// Connection set as JSON, keyed by connection type
        #[arg(long)]
        connections: Option<String>,
        /// Caller identity recorded in logs
        #[arg(long)]
        caller: Option<String>,
    },
    /// Validate a connection set
    TestCredentials {
        /// Connection set as JSON, keyed by connection type
        #[arg(long)]
        connections: String,
        /// Required fields as <connection>.<field>, comma separated
        #[arg(long, value_delimiter = ',')]
        require: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::from_file(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config))?;
    init_tracing(&config.logging, &config.telemetry)?;

    let result = run(cli.command, config).await;
    shutdown_telemetry();

    match result {
        Ok(code) if code != 0 => std::process::exit(code),
        Ok(_) => Ok(()),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(map_error_to_exit_code(&e));
        }
    }
}

fn map_error_to_exit_code(e: &anyhow::Error) -> i32 {
    match e.downcast_ref::<BridgeError>() {
        Some(err) => match err.category() {
            ErrorCategory::Config => exit_codes::CONFIG_ERROR,
            ErrorCategory::Request => exit_codes::REQUEST_ERROR,
            ErrorCategory::Query => exit_codes::QUERY_ERROR,
            ErrorCategory::Credentials => exit_codes::CREDENTIALS_ERROR,
            _ => exit_codes::GENERAL_ERROR,
        },
        None => exit_codes::GENERAL_ERROR,
    }
}

fn load_plugin(fixtures: &Path, config: AppConfig) -> anyhow::Result<QueryPlugin> {
    let engine = MemoryEngine::from_path(fixtures)?;
    let mut options = QueryPluginOptions::new(Arc::new(engine));
    options.config = config;
    Ok(QueryPlugin::new(options))
}

fn parse_connections(raw: Option<&str>) -> anyhow::Result<ConnectionSet> {
    match raw {
        Some(raw) => Ok(serde_json::from_str(raw).map_err(BridgeError::from)?),
        None => Ok(ConnectionSet::new()),
    }
}

/// Returns the process exit code for a completed command.
async fn run(command: Commands, config: AppConfig) -> anyhow::Result<i32> {
    match command {
        Commands::Describe { fixtures } => {
            let plugin = load_plugin(&fixtures, config)?;
            let output = serde_json::json!({
                "plugin": plugin.describe(),
                "actions": plugin.list_actions(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(0)
        }
        Commands::Execute {
            fixtures,
            table,
            query_ctx,
            timeout,
            connections,
            caller,
        } => {
            let key = config.plugin.query_context_key.clone();
            let plugin = load_plugin(&fixtures, config)?;
            let action_context =
                ActionContext::new(caller, parse_connections(connections.as_deref())?);
            let request = ExecuteActionRequest {
                name: table,
                parameters: HashMap::from([(key, query_ctx)]),
                timeout,
            };

            let response = plugin.execute(&action_context, request).await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
            Ok(match response.error_message {
                Some(_) => exit_codes::PARTIAL_FAILURE,
                None => 0,
            })
        }
        Commands::TestCredentials {
            connections,
            require,
        } => {
            let mut options = QueryPluginOptions::new(Arc::new(MemoryEngine::new()));
            options.config = config;
            options.validator = Some(Arc::new(RequiredFieldsValidator::from_specs(&require)?));
            let plugin = QueryPlugin::new(options);

            let response = plugin
                .test_credentials(&parse_connections(Some(&connections))?)
                .await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
            Ok(if response.are_credentials_valid {
                0
            } else {
                exit_codes::CREDENTIALS_ERROR
            })
        }
    }
}
