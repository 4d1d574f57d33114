use std::sync::OnceLock;

use anyhow::Context;
use opentelemetry::{KeyValue, global, trace::TraceError};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{
    Resource,
    propagation::TraceContextPropagator,
    runtime,
    trace::{RandomIdGenerator, Sampler, Tracer},
};
use opentelemetry_semantic_conventions::resource::{SERVICE_NAME, SERVICE_VERSION};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

use crate::basic_logging::init_basic_console_logging;

static OBSERVABILITY_ENABLED: OnceLock<bool> = OnceLock::new();

/// Check if observability is enabled via OBSERVABILITY_ENABLED env var
pub fn is_observability_enabled() -> bool {
    *OBSERVABILITY_ENABLED.get_or_init(|| {
        std::env::var("OBSERVABILITY_ENABLED")
            .map(|v| v.to_lowercase() != "false" && v != "0")
            .unwrap_or(true) // Enabled by default
    })
}

fn init_tracer() -> Result<Tracer, TraceError> {
    let otlp_endpoint = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
        .unwrap_or_else(|_| "http://localhost:4317".to_string());

    global::set_text_map_propagator(TraceContextPropagator::new());

    let resource = Resource::new(vec![
        KeyValue::new(SERVICE_NAME, "carenet"),
        KeyValue::new(SERVICE_VERSION, env!("CARGO_PKG_VERSION")),
        KeyValue::new(
            "environment",
            std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
        ),
    ]);

    let otlp_exporter = opentelemetry_otlp::new_exporter()
        .tonic()
        .with_endpoint(otlp_endpoint);

    opentelemetry_otlp::new_pipeline()
        .tracing()
        .with_exporter(otlp_exporter)
        .with_trace_config(
            opentelemetry_sdk::trace::Config::default()
                .with_sampler(Sampler::AlwaysOn)
                .with_id_generator(RandomIdGenerator::default())
                .with_resource(resource),
        )
        .install_batch(runtime::Tokio)
}

/// Installs the global subscriber: console, daily error log, daily JSON log,
/// and OpenTelemetry export when a collector is reachable.
///
/// With `OBSERVABILITY_ENABLED=false` only console logging is installed.
pub fn init_tracing() -> anyhow::Result<()> {
    use tracing_appender::rolling::{RollingFileAppender, Rotation};
    use tracing_subscriber::fmt;

    if !is_observability_enabled() {
        init_basic_console_logging();
        return Ok(());
    }

    let log_dir = std::env::var("LOG_DIR").unwrap_or_else(|_| "storage/logs".to_string());
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create logs directory {log_dir}"))?;

    let console_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("carenet=info,carenet_auth=info,tower_http=warn,hyper=info,tonic=info")
    });

    let console_layer = fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_file(true)
        .with_line_number(true)
        .compact()
        .with_filter(console_filter);

    let file_appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, "carenet.log");

    let file_layer = fmt::layer()
        .with_writer(file_appender)
        .with_target(false)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false)
        .with_filter(EnvFilter::new("error"));

    // Structured logs for ingestion
    let json_appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, "carenet.json");

    let json_layer = fmt::layer()
        .json()
        .with_writer(json_appender)
        .with_current_span(true)
        .with_span_list(true)
        .with_filter(EnvFilter::new("info"));

    match init_tracer() {
        Ok(tracer) => {
            let otel_layer = tracing_opentelemetry::layer().with_tracer(tracer);

            tracing_subscriber::registry()
                .with(console_layer)
                .with(file_layer)
                .with(json_layer)
                .with(otel_layer)
                .try_init()
                .context("Failed to install tracing subscriber")?;

            info!("Tracing initialized with OpenTelemetry and file logging");
        }
        Err(e) => {
            tracing_subscriber::registry()
                .with(console_layer)
                .with(file_layer)
                .with(json_layer)
                .try_init()
                .context("Failed to install tracing subscriber")?;

            warn!(error = %e, "Tracing initialized without OpenTelemetry (file logging only)");
        }
    }

    Ok(())
}

pub async fn shutdown_tracer() {
    if !is_observability_enabled() {
        return;
    }

    info!("Shutting down OpenTelemetry tracer...");
    global::shutdown_tracer_provider();
}
