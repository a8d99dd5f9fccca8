//! Logging and tracing initialization.
//!
//! `init_tracing` installs the global subscriber: an `EnvFilter` (`RUST_LOG`
//! wins over the configured filter), a plain or JSON `fmt` layer on stderr
//! and, with the `telemetry` feature, an OTLP exporter layer.

use anyhow::Result;
use tracing_subscriber::layer::{Layer, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[cfg(feature = "telemetry")]
use {
    opentelemetry::trace::TracerProvider, opentelemetry::KeyValue,
    opentelemetry_otlp::WithExportConfig,
    opentelemetry_sdk::trace::TracerProvider as SdkTracerProvider, opentelemetry_sdk::Resource,
    tracing_opentelemetry::OpenTelemetryLayer,
};

use crate::config::{LoggingConfig, TelemetryConfig};

pub fn init_tracing(logging: &LoggingConfig, telemetry: &TelemetryConfig) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.filter));

    let otel_layer = if telemetry.enabled {
        init_telemetry(&telemetry.service_name, &telemetry.endpoint)?
    } else {
        Box::new(tracing_subscriber::layer::Identity::new())
    };

    // stdout is reserved for command output
    let plain = (!logging.json)
        .then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));
    let json = logging.json.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(true)
            .with_writer(std::io::stderr)
    });

    tracing_subscriber::registry()
        .with(otel_layer)
        .with(filter)
        .with(plain)
        .with(json)
        .try_init()?;

    tracing::debug!(json = logging.json, otlp = telemetry.enabled, "Tracing initialized");
    Ok(())
}

pub fn init_telemetry<S>(
    service_name: &str,
    endpoint: &str,
) -> Result<Box<dyn Layer<S> + Send + Sync>>
where
    S: tracing::Subscriber + for<'span> LookupSpan<'span> + Send + Sync,
{
    #[cfg(feature = "telemetry")]
    {
        let exporter = opentelemetry_otlp::SpanExporter::builder()
            .with_tonic()
            .with_endpoint(endpoint)
            .build()?;

        let provider = SdkTracerProvider::builder()
            .with_batch_exporter(exporter, opentelemetry_sdk::runtime::Tokio)
            .with_resource(Resource::new(vec![KeyValue::new(
                "service.name",
                service_name.to_string(),
            )]))
            .build();

        let tracer = provider.tracer(service_name.to_string());
        opentelemetry::global::set_tracer_provider(provider);

        Ok(Box::new(OpenTelemetryLayer::new(tracer)))
    }
    #[cfg(not(feature = "telemetry"))]
    {
        tracing::warn!(
            service_name,
            endpoint,
            "OTLP export requested but the `telemetry` feature is disabled"
        );
        Ok(Box::new(tracing_subscriber::layer::Identity::new()))
    }
}

pub fn shutdown_telemetry() {
    #[cfg(feature = "telemetry")]
    opentelemetry::global::shutdown_tracer_provider();
}
