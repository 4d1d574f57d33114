use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize basic console logging when observability is disabled.
///
/// - **Log Level**: Controlled by `LOG_LEVEL` environment variable (default: "info")
/// - **Filtering**: Noisy dependencies filtered to warn level
/// - **Format**: Compact format with ANSI colors
pub fn init_basic_console_logging() {
    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "carenet={log_level},carenet_auth={log_level},tower_http=warn,hyper=warn,sqlx=warn"
        ))
    });

    let console_layer = fmt::layer()
        .compact()
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(true)
        .with_filter(env_filter);

    // A subscriber installed earlier (tests, embedding) wins.
    if tracing_subscriber::registry().with(console_layer).try_init().is_ok() {
        eprintln!("Observability disabled - console logging only");
    }
}
