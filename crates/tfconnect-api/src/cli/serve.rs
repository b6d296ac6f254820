//! Webhook listener command.

use anyhow::Result;
use console::style;

use tfconnect_types::config::BridgeConfig;

use crate::http::router::build_router;
use crate::state::AppState;

/// Start the webhook server and block until Ctrl+C or SIGTERM.
///
/// The engine is installed and upstream credentials are verified before
/// the listener binds, so no request is accepted by a misconfigured
/// process.
pub async fn serve(
    mut config: BridgeConfig,
    host: Option<String>,
    port: Option<u16>,
    quiet: bool,
) -> Result<()> {
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    let state = AppState::init(&config).await?;

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, templates = %config.templates.dir.display(), "listening");

    if !quiet {
        println!(
            "  {} tfconnect listening on {}",
            style("⚡").bold(),
            style(format!("http://{addr}")).cyan()
        );
        println!("  {}", style("Press Ctrl+C to stop").dim());
    }

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if !quiet {
        println!("\n  Server stopped.");
    }
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
