use anyhow::Context;
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use whatif_server::{build_service, init_tracing, routes, ServerConfig};

#[derive(Debug, Parser)]
#[command(name = "whatif-server", version, about = "What-if climate scenario backend")]
struct Cli {
    /// TOML configuration file
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Listen address
    #[arg(long, value_name = "ADDR")]
    bind: Option<SocketAddr>,

    /// JSON file backing the scenario store
    #[arg(long, value_name = "PATH")]
    store: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = ServerConfig::load(cli.config.as_deref()).context("loading configuration")?;
    if let Some(bind) = cli.bind {
        config = config.with_bind(bind);
    }
    if let Some(store) = cli.store {
        config = config.with_store_path(store);
    }

    init_tracing(config.log_json);

    let service = build_service(&config)
        .await
        .context("initialising scenario service")?;
    tracing::info!(?service, "Scenario service ready");

    let (addr, server) = warp::serve(routes(service))
        .try_bind_with_graceful_shutdown(config.bind, wait_for_shutdown_signal())
        .with_context(|| format!("binding {}", config.bind))?;

    tracing::info!("Listening on http://{}", addr);
    server.await;
    tracing::info!("Server stopped");
    Ok(())
}

async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match (
            signal(SignalKind::terminate()),
            signal(SignalKind::interrupt()),
        ) {
            (Ok(mut sigterm), Ok(mut sigint)) => {
                tokio::select! {
                    _ = sigterm.recv() => {}
                    _ = sigint.recv() => {}
                }
            }
            _ => {
                tracing::warn!("Could not register signal handlers; falling back to ctrl-c");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
    tracing::info!("Shutdown signal received");
}
