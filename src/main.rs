use std::path::PathBuf;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::signal;

use userdir::config::Configuration;
use userdir::{app, initialize_state, telemetry};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Err(err) = telemetry::setup_logging() {
        eprintln!("tracing init failed: {err}");
    }

    let metrics = match telemetry::setup_metrics_recorder() {
        Ok(handle) => Some(handle),
        Err(err) => {
            tracing::warn!(error = %err, "prometheus recorder not installed");
            None
        },
    };

    let port = std::env::var("PORT").ok().and_then(|port| port.parse::<u16>().ok());
    let config = Configuration::default()
        .path(std::env::var("CONFIG_PATH").map(PathBuf::from).unwrap_or_default())
        .read();
    let config = Arc::new(Arc::unwrap_or_clone(config).with_port(port));
    let addr = config.socket_addr()?;

    let state = initialize_state(config, metrics).await?;

    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server started");

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for ctrl-c");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            },
            Err(err) => tracing::error!(error = %err, "failed to listen for SIGTERM"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutting down");
}
