use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};

use gemgate_core::Gateway;
use gemgate_core::bootstrap::bootstrap_from_env;
use gemgate_router::gateway_router;

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(err) = run().await {
        eprintln!("gemgate failed: {err:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let boot = bootstrap_from_env()?;
    let bind = boot.config.bind_addr();

    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("bind {bind}"))?;
    info!(addr = %bind, "listening");

    if boot.config.warm_up {
        tokio::spawn(warm_up(boot.gateway.clone()));
    }

    let app = gateway_router(boot.gateway);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serve")?;

    Ok(())
}

/// Initializes the upstream client ahead of the first request. Failure is
/// not fatal; the first request retries.
async fn warm_up(gateway: Arc<Gateway>) {
    match gateway.client().acquire().await {
        Ok(_) => info!(event = "warm_up", "upstream client ready"),
        Err(err) => warn!(
            event = "warm_up",
            error = %err,
            "upstream client not ready; will initialize on first request"
        ),
    }
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("gemgate=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
