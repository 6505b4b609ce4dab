use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub upstream: UpstreamConfig,
    pub sso: SsoConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// ERPNext origin, without the `/api` suffix
    pub erp_base_url: String,
    /// Python module prefix of the whitelisted RPC methods
    pub method_namespace: String,
    /// Wait before the single post-create re-fetch
    pub enrichment_delay_ms: u64,
    pub debug_logging: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SsoConfig {
    pub token_url: Option<String>,
    pub client_id: String,
    pub client_secret: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub port: u16,
    pub default_page_length: u32,
    pub max_page_length: u32,
    /// Region code used when a device profile arrives without one
    pub default_region: String,
    pub max_request_size_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Upstream overrides
        if let Ok(v) = env::var("ERP_BASE_URL") {
            self.upstream.erp_base_url = v.trim_end_matches('/').to_string();
        }
        if let Ok(v) = env::var("ERP_METHOD_NAMESPACE") {
            self.upstream.method_namespace = v;
        }
        if let Ok(v) = env::var("ERP_ENRICHMENT_DELAY_MS") {
            self.upstream.enrichment_delay_ms = v.parse().unwrap_or(self.upstream.enrichment_delay_ms);
        }
        if let Ok(v) = env::var("ERP_DEBUG_LOGGING") {
            self.upstream.debug_logging = v.parse().unwrap_or(self.upstream.debug_logging);
        }

        // SSO overrides
        if let Ok(v) = env::var("SSO_TOKEN_URL") {
            self.sso.token_url = Some(v).filter(|s| !s.trim().is_empty());
        }
        if let Ok(v) = env::var("SSO_CLIENT_ID") {
            self.sso.client_id = v;
        }
        if let Ok(v) = env::var("SSO_CLIENT_SECRET") {
            self.sso.client_secret = Some(v).filter(|s| !s.is_empty());
        }

        // API overrides
        if let Ok(v) = env::var("PORT") {
            self.api.port = v.parse().unwrap_or(self.api.port);
        }
        if let Ok(v) = env::var("API_DEFAULT_PAGE_LENGTH") {
            self.api.default_page_length = v.parse().unwrap_or(self.api.default_page_length);
        }
        if let Ok(v) = env::var("API_MAX_PAGE_LENGTH") {
            self.api.max_page_length = v.parse().unwrap_or(self.api.max_page_length);
        }
        if let Ok(v) = env::var("DEFAULT_REGION") {
            self.api.default_region = v.trim_end_matches('\n').to_string();
        }
        if let Ok(v) = env::var("API_MAX_REQUEST_SIZE_BYTES") {
            self.api.max_request_size_bytes = v.parse().unwrap_or(self.api.max_request_size_bytes);
        }

        // Security overrides
        if let Ok(v) = env::var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect();
        }

        self
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            upstream: UpstreamConfig {
                erp_base_url: "http://localhost:8000".to_string(),
                method_namespace: "lorawan.api".to_string(),
                enrichment_delay_ms: 1000,
                debug_logging: true,
            },
            sso: SsoConfig {
                token_url: None,
                client_id: "lns-console".to_string(),
                client_secret: None,
            },
            api: ApiConfig {
                port: 3000,
                default_page_length: 20,
                max_page_length: 1000,
                default_region: "AS923".to_string(),
                max_request_size_bytes: 10 * 1024 * 1024, // 10MB
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec![],
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            upstream: UpstreamConfig {
                erp_base_url: "http://erpnext:8000".to_string(),
                method_namespace: "lorawan.api".to_string(),
                enrichment_delay_ms: 1000,
                debug_logging: false,
            },
            sso: SsoConfig {
                token_url: None,
                client_id: "lns-console".to_string(),
                client_secret: None,
            },
            api: ApiConfig {
                port: 3000,
                default_page_length: 20,
                max_page_length: 500,
                default_region: "AS923".to_string(),
                max_request_size_bytes: 5 * 1024 * 1024, // 5MB
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://staging.example.com".to_string()],
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            upstream: UpstreamConfig {
                erp_base_url: "http://erpnext:8000".to_string(),
                method_namespace: "lorawan.api".to_string(),
                enrichment_delay_ms: 1000,
                debug_logging: false,
            },
            sso: SsoConfig {
                token_url: None,
                client_id: "lns-console".to_string(),
                client_secret: None,
            },
            api: ApiConfig {
                port: 3000,
                default_page_length: 20,
                max_page_length: 100,
                default_region: "AS923".to_string(),
                max_request_size_bytes: 2 * 1024 * 1024, // 2MB
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://app.example.com".to_string()],
            },
        }
    }

    pub fn is_development(&self) -> bool {
        matches!(self.environment, Environment::Development)
    }

    /// Default tracing directives when `RUST_LOG` is unset. `debug_logging`
    /// turns on the per-call upstream logs.
    pub fn log_filter(&self) -> &'static str {
        if self.upstream.debug_logging {
            "info,tower_http=info,lns_erp_proxy=debug"
        } else {
            "info,tower_http=info"
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}
