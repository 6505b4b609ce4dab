use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use lns_erp_proxy::config;
use lns_erp_proxy::server::app;
use lns_erp_proxy::state::AppState;

#[derive(Parser, Debug)]
#[command(name = "lns-erp-proxy", version, about = "LoRaWAN console proxy for ERPNext and Keycloak")]
struct Args {
    /// Port to listen on
    #[arg(long, env = "PORT")]
    port: Option<u16>,

    /// ERPNext base URL
    #[arg(long = "erp-url", env = "ERP_BASE_URL")]
    erp_url: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up ERP_BASE_URL, SSO_TOKEN_URL, etc.
    let _ = dotenvy::dotenv();

    let args = Args::parse();
    let mut config = config::config().clone();
    if let Some(port) = args.port {
        config.api.port = port;
    }
    if let Some(erp_url) = args.erp_url {
        config.upstream.erp_base_url = erp_url;
    }

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.log_filter())))
        .init();

    tracing::info!(
        "Starting in {:?} mode, forwarding to {}",
        config.environment,
        config.upstream.erp_base_url
    );

    let bind_addr = format!("0.0.0.0:{}", config.api.port);
    let state = AppState::from_config(config).context("failed to build upstream clients")?;

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    tracing::info!("Listening on http://{}", bind_addr);

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutting down");
}
