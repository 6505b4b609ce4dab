use std::sync::Arc;
use std::time::Duration;

use crate::config::AppConfig;
use crate::filter::PageDefaults;
use crate::upstream::{ErpClient, SsoClient, UpstreamError};

/// Per-process handles shared by every handler. Holds no per-request or
/// mutable state.
#[derive(Clone, Debug)]
pub struct AppState {
    pub erp: ErpClient,
    pub sso: SsoClient,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn from_config(config: AppConfig) -> Result<Self, UpstreamError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let erp = ErpClient::new(http.clone(), &config.upstream.erp_base_url)?
            .with_enrichment_delay(Duration::from_millis(config.upstream.enrichment_delay_ms));
        let sso = SsoClient::new(
            http,
            config.sso.token_url.clone(),
            config.sso.client_id.clone(),
            config.sso.client_secret.clone(),
        );

        Ok(Self {
            erp,
            sso,
            config: Arc::new(config),
        })
    }

    pub fn namespace(&self) -> &str {
        &self.config.upstream.method_namespace
    }

    pub fn page_defaults(&self) -> PageDefaults {
        PageDefaults {
            default_limit: self.config.api.default_page_length,
            max_limit: self.config.api.max_page_length,
        }
    }
}
