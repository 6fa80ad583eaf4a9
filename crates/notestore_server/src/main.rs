//! Server entry point.
//!
//! Loads `.env`, reads configuration, initializes logging, connects the
//! datastore and serves until Ctrl-C / SIGTERM.

use anyhow::Context;
use clap::Parser;
use log::{error, info};
use notestore_core::init_logging;
use notestore_server::{build_app, ServerConfig};
use std::net::SocketAddr;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // `.env` must be loaded before clap reads env fallbacks.
    dotenvy::dotenv().ok();
    let config = ServerConfig::parse();

    init_logging(config.effective_log_level(), config.log_dir.as_deref())
        .context("failed to initialize logging")?;

    let app = match build_app(&config) {
        Ok(app) => app,
        Err(err) => {
            error!("event=server_start module=server status=error error={err}");
            return Err(err.into());
        }
    };

    let addr = config.socket_addr();
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(
        "event=server_start module=server status=ok addr={} version={}",
        addr,
        notestore_core::core_version()
    );

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server terminated unexpectedly")?;

    info!("event=server_stop module=server status=ok");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!("event=signal_install module=server status=error error={err}");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!("event=signal_install module=server status=error error={err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
