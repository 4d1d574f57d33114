use std::net::SocketAddr;

use anyhow::Context;
use carenet::router::init_router;
use carenet::state::init_app_state;
use carenet_config::ServerConfig;
use carenet_observability::{init_tracing, shutdown_tracer};
use dotenvy::dotenv;
use tokio::signal;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    init_tracing()?;

    let server = ServerConfig::from_env();
    let state = init_app_state(&server).await?;

    #[cfg(feature = "observability")]
    spawn_metrics_server(&server).await?;

    let app = init_router(state);

    let listener = tokio::net::TcpListener::bind(server.bind_address())
        .await
        .with_context(|| format!("Failed to bind {}", server.bind_address()))?;
    info!(address = %server.bind_address(), "Server listening");
    info!("Swagger UI available at /swagger-ui");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("Server error")?;

    shutdown_tracer().await;
    Ok(())
}

#[cfg(feature = "observability")]
async fn spawn_metrics_server(server: &ServerConfig) -> anyhow::Result<()> {
    use carenet_observability::{init_metrics, metrics_app};

    let Some(handle) = init_metrics()? else {
        return Ok(());
    };

    let listener = tokio::net::TcpListener::bind(server.metrics_address())
        .await
        .with_context(|| format!("Failed to bind {}", server.metrics_address()))?;
    info!(address = %server.metrics_address(), "Metrics listening");

    tokio::spawn(async move {
        if let Err(err) = axum::serve(listener, metrics_app(handle)).await {
            error!(error = %err, "Metrics server stopped");
        }
    });
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(err) => {
                error!("Failed to install SIGTERM handler: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
