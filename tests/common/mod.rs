#![allow(dead_code)]

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;
use wiremock::MockServer;

use lns_erp_proxy::config::AppConfig;
use lns_erp_proxy::server::app;
use lns_erp_proxy::state::AppState;

pub const SESSION: &str = "Bearer 3f9a1c2d7e";

/// One proxy instance per test, wired to its own mock ERPNext.
pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    pub erp: MockServer,
    pub client: reqwest::Client,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            // Any response from the root route means the listener is up
            if let Ok(resp) = self.client.get(self.url("/")).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }
}

pub async fn spawn_server() -> Result<TestServer> {
    spawn_with(|_| {}).await
}

pub async fn spawn_with(customize: impl FnOnce(&mut AppConfig)) -> Result<TestServer> {
    let erp = MockServer::start().await;

    let mut config = AppConfig::development();
    config.upstream.erp_base_url = erp.uri();
    config.upstream.enrichment_delay_ms = 10;
    customize(&mut config);

    let state = AppState::from_config(config).context("failed to build state")?;

    let port = portpicker::pick_unused_port().context("failed to pick free port")?;
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
        .await
        .context("failed to bind test listener")?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app(state)).await;
    });

    let server = TestServer {
        port,
        base_url: format!("http://127.0.0.1:{}", port),
        erp,
        client: reqwest::Client::new(),
    };
    server.wait_ready(Duration::from_secs(5)).await?;
    Ok(server)
}
