//! ng-web: Main Entry Point

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use ng_core::AgentConfig;
use ng_web::{create_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment from NG_ENV_FILE, /etc/ng-agent/environment or .env
    let env_file = ng_core::config::load_environment();

    // Initialize logging with environment filter
    tracing_subscriber::registry()
        .with(fmt::layer().compact())
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,ng_web=debug,ng_chat=debug")),
        )
        .init();

    if let Some(path) = env_file {
        info!("Loaded environment from {}", path);
    }

    let config = AgentConfig::from_env();
    if config.openai_api_key.is_none() {
        warn!("OPENAI_API_KEY not set; chat replies will be disabled");
    }

    info!("Initializing application state...");
    let state = Arc::new(AppState::new(config)?);
    info!("✅ Loaded {} tools", ng_tools::catalog().len());
    info!("✅ LLM Provider: {}", state.provider_name);

    let app = create_router(state.clone());

    let addr = SocketAddr::from(([0, 0, 0, 0], state.config.port));
    info!("🌐 Listening on http://{}", addr);

    // Start server with graceful shutdown
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down...");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down...");
        },
    }
}
