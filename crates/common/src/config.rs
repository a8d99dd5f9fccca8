use anyhow::{Context, Result};
use serde::Deserialize;
use validator::Validate;

// Default constants
pub const DEFAULT_PLUGIN_NAME: &str = "tablebridge";
pub const DEFAULT_QUERY_CONTEXT_KEY: &str = "query.ctx";
pub const DEFAULT_MAX_ROWS: usize = 1000;
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

pub const DEFAULT_CACHE_TTL_SECS: u64 = 3600;
pub const DEFAULT_CACHE_CAPACITY: u64 = 10_000_000;
pub const DEFAULT_CACHE_SETTLE_MILLIS: u64 = 10;

pub const DEFAULT_LOG_FILTER: &str = "info";
pub const DEFAULT_TELEMETRY_ENABLED: bool = false;
pub const DEFAULT_OTLP_ENDPOINT: &str = "http://localhost:4317";

pub const ENV_PREFIX: &str = "TABLEBRIDGE";

#[derive(Debug, Deserialize, Default, Clone, Validate)]
pub struct AppConfig {
    #[serde(default)]
    #[validate(nested)]
    pub plugin: PluginSettings,
    #[serde(default)]
    #[validate(nested)]
    pub query_limits: QueryLimits,
    #[serde(default)]
    #[validate(nested)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    #[validate(nested)]
    pub telemetry: TelemetryConfig,
}

#[derive(Debug, Deserialize, Clone, Validate)]
pub struct PluginSettings {
    #[serde(default = "default_plugin_name")]
    #[validate(length(min = 1))]
    pub name: String,

    #[serde(default)]
    pub description: String,

    /// Parameter key holding the serialized query context
    #[serde(default = "default_query_context_key")]
    #[validate(length(min = 1))]
    pub query_context_key: String,
}

impl Default for PluginSettings {
    fn default() -> Self {
        Self {
            name: default_plugin_name(),
            description: String::new(),
            query_context_key: default_query_context_key(),
        }
    }
}

fn default_plugin_name() -> String {
    DEFAULT_PLUGIN_NAME.to_string()
}

fn default_query_context_key() -> String {
    DEFAULT_QUERY_CONTEXT_KEY.to_string()
}

#[derive(Debug, Deserialize, Clone, Validate)]
pub struct QueryLimits {
    /// Used when the query context carries no max-rows value
    #[serde(default = "default_max_rows")]
    #[validate(range(min = 1))]
    pub default_max_rows: usize,

    /// Used when the request carries a zero timeout
    #[serde(default = "default_timeout_secs")]
    #[validate(range(min = 1))]
    pub default_timeout_secs: u64,
}

impl Default for QueryLimits {
    fn default() -> Self {
        Self {
            default_max_rows: default_max_rows(),
            default_timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_max_rows() -> usize {
    DEFAULT_MAX_ROWS
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

#[derive(Debug, Deserialize, Clone, Validate)]
pub struct CacheSettings {
    #[serde(default = "default_cache_ttl")]
    #[validate(range(min = 1))]
    pub ttl_seconds: u64,

    #[serde(default = "default_cache_capacity")]
    #[validate(range(min = 1))]
    pub max_capacity: u64,

    /// Pause after a write so pending cache maintenance settles
    #[serde(default = "default_settle_millis")]
    pub settle_millis: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            ttl_seconds: default_cache_ttl(),
            max_capacity: default_cache_capacity(),
            settle_millis: default_settle_millis(),
        }
    }
}

fn default_cache_ttl() -> u64 {
    DEFAULT_CACHE_TTL_SECS
}

fn default_cache_capacity() -> u64 {
    DEFAULT_CACHE_CAPACITY
}

fn default_settle_millis() -> u64 {
    DEFAULT_CACHE_SETTLE_MILLIS
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, overridden by `RUST_LOG` when set
    #[serde(default = "default_log_filter")]
    pub filter: String,

    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            json: false,
        }
    }
}

fn default_log_filter() -> String {
    DEFAULT_LOG_FILTER.to_string()
}

#[derive(Debug, Deserialize, Clone, Validate)]
pub struct TelemetryConfig {
    #[serde(default = "default_telemetry_enabled")]
    pub enabled: bool,

    #[serde(default = "default_otlp_endpoint")]
    #[validate(url)]
    pub endpoint: String,

    #[serde(default = "default_plugin_name")]
    pub service_name: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: default_telemetry_enabled(),
            endpoint: default_otlp_endpoint(),
            service_name: default_plugin_name(),
        }
    }
}

fn default_telemetry_enabled() -> bool {
    DEFAULT_TELEMETRY_ENABLED
}

fn default_otlp_endpoint() -> String {
    DEFAULT_OTLP_ENDPOINT.to_string()
}

impl AppConfig {
    /// Loads the optional config file, then applies environment overrides.
    ///
    /// `TABLEBRIDGE__CACHE__TTL_SECONDS=60` maps to `cache.ttl_seconds`.
    pub fn from_file(path: &str) -> Result<Self> {
        let builder = config::Config::builder();

        let builder = if std::path::Path::new(path).exists() {
            builder.add_source(config::File::with_name(path))
        } else {
            builder
        };

        let builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        );

        let cfg = builder.build().context("Failed to build configuration")?;

        let app_config: AppConfig = cfg
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        app_config
            .validate()
            .map_err(|e| anyhow::anyhow!("Configuration validation failed: {:?}", e))?;

        Ok(app_config)
    }
}
