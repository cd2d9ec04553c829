//! Scan Ingest - Main application entry point

use std::net::SocketAddr;
use tokio::{net::TcpListener, signal};

use scan_ingest::{Config, create_app, init_tracing};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::load().unwrap_or_else(|e| {
        eprintln!("Failed to load configuration ({}), using defaults", e);
        Config::default()
    });

    init_tracing(&config.logging)?;

    tracing::info!("Starting scan-ingest server...");
    tracing::info!(
        "Configuration loaded: server={}:{} database={} max_concurrent_fetches={:?}",
        config.server.host,
        config.server.port,
        config.database.url,
        config.ingestion.max_concurrent_fetches
    );
    if config.database.reset_on_startup {
        tracing::info!("VulnerabilityScan table will be recreated");
    }

    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);
    let enable_docs = config.server.enable_docs;
    let app = create_app(config).await?;

    tracing::info!("Server listening on {}", addr);
    if enable_docs {
        tracing::info!(
            "OpenAPI document available at http://{}/api-docs/openapi.json",
            addr
        );
    } else {
        tracing::info!("API documentation disabled (enable_docs=false)");
    }

    // Start server with graceful shutdown
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Handle graceful shutdown signals
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        },
    }
}
