//! Application settings

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::ConfigError;

/// Environment variable prefix (`REVPULSE__SERVER__PORT=9000`)
pub const ENV_PREFIX: &str = "REVPULSE";

/// Environment variable naming the runtime environment file to layer
pub const ENV_SELECTOR: &str = "REVPULSE_ENV";

/// Runtime environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEnvironment {
    /// Relaxed validation
    #[default]
    Development,
    Staging,
    /// All validations enforced
    Production,
}

impl RuntimeEnvironment {
    /// Parse an environment name such as a `REVPULSE_ENV` value
    ///
    /// Matching ignores case and surrounding whitespace; `dev` and `prod`
    /// are accepted as short forms. Unknown names yield `None`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Some(Self::Development),
            "staging" => Some(Self::Staging),
            "production" | "prod" => Some(Self::Production),
            _ => None,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    /// Check if strict validation should be applied
    pub fn is_strict(&self) -> bool {
        matches!(self, Self::Production | Self::Staging)
    }
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub environment: RuntimeEnvironment,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub dashboard: DashboardConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Settings {
    /// Validate settings, rejecting impossible or unsafe combinations
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_server()?;
        self.validate_auth()?;
        self.validate_store()?;
        self.validate_llm()?;
        self.validate_dashboard()?;
        Ok(())
    }

    fn validate_server(&self) -> Result<(), ConfigError> {
        let server = &self.server;

        if server.port == 0 {
            return Err(invalid("server.port", "Port cannot be 0"));
        }

        if server.request_timeout_secs == 0 {
            return Err(invalid(
                "server.request_timeout_secs",
                "Timeout must be at least 1 second",
            ));
        }

        if self.environment.is_production()
            && server.cors_enabled
            && server.cors_origins.iter().any(|o| o.trim() == "*")
        {
            return Err(invalid(
                "server.cors_origins",
                "Wildcard origin is not allowed in production",
            ));
        }

        if self.environment.is_production() && server.cors_enabled && server.cors_origins.is_empty()
        {
            tracing::warn!(
                "CORS is enabled in production but no origins are configured. \
                 Browser clients will be rejected."
            );
        }

        Ok(())
    }

    fn validate_auth(&self) -> Result<(), ConfigError> {
        if self.environment.is_production() && !self.auth.enabled {
            return Err(invalid(
                "auth.enabled",
                "Authentication cannot be disabled in production",
            ));
        }

        if self.auth.api_key_prefix_len == 0 {
            return Err(invalid("auth.api_key_prefix_len", "Must be at least 1"));
        }

        Ok(())
    }

    fn validate_store(&self) -> Result<(), ConfigError> {
        let store = &self.store;

        if store.backend == StoreBackend::Rest {
            match store.url.as_deref().map(str::trim) {
                None | Some("") => {
                    return Err(ConfigError::MissingField("store.url".to_string()));
                }
                Some(url) if !(url.starts_with("http://") || url.starts_with("https://")) => {
                    return Err(invalid(
                        "store.url",
                        format!("Must be an http(s) URL, got {url}"),
                    ));
                }
                _ => {}
            }

            if store.service_key.is_none() && self.environment.is_strict() {
                return Err(ConfigError::MissingField("store.service_key".to_string()));
            }
        }

        if store.timeout_secs == 0 {
            return Err(invalid("store.timeout_secs", "Must be at least 1 second"));
        }

        Ok(())
    }

    fn validate_llm(&self) -> Result<(), ConfigError> {
        let llm = &self.llm;
        if !llm.enabled {
            return Ok(());
        }

        if llm.endpoint.trim().is_empty() {
            return Err(ConfigError::MissingField("llm.endpoint".to_string()));
        }

        if llm.timeout_secs == 0 {
            return Err(invalid("llm.timeout_secs", "Must be at least 1 second"));
        }

        if !(0.0..=2.0).contains(&llm.temperature) {
            return Err(invalid(
                "llm.temperature",
                format!("Must be between 0.0 and 2.0, got {}", llm.temperature),
            ));
        }

        if llm.max_tokens == 0 {
            return Err(invalid("llm.max_tokens", "Must be at least 1"));
        }

        Ok(())
    }

    fn validate_dashboard(&self) -> Result<(), ConfigError> {
        let dashboard = &self.dashboard;
        for (field, value) in [
            ("dashboard.alert_limit", dashboard.alert_limit),
            ("dashboard.top_campaigns", dashboard.top_campaigns),
            ("dashboard.insight_limit", dashboard.insight_limit),
        ] {
            if value == 0 {
                return Err(invalid(field, "Must be at least 1"));
            }
        }
        Ok(())
    }
}

fn invalid(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        message: message.into(),
    }
}

fn default_true() -> bool {
    true
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Allowed CORS origins, empty allows none
    #[serde(default)]
    pub cors_origins: Vec<String>,

    /// Per-request timeout
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_request_timeout() -> u64 {
    30
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_enabled: true,
            cors_origins: Vec::new(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

/// API key authentication
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Paths that bypass authentication
    #[serde(default = "default_public_paths")]
    pub public_paths: Vec<String>,

    /// Leading characters of a key stored in clear for lookup
    #[serde(default = "default_prefix_len")]
    pub api_key_prefix_len: usize,
}

fn default_public_paths() -> Vec<String> {
    vec![
        "/health".to_string(),
        "/ready".to_string(),
        "/metrics".to_string(),
    ]
}

fn default_prefix_len() -> usize {
    8
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            public_paths: default_public_paths(),
            api_key_prefix_len: default_prefix_len(),
        }
    }
}

/// Which record store implementation to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// In-process store, optionally seeded from a JSON file
    #[default]
    Memory,
    /// Hosted relational store behind a REST query API
    Rest,
}

/// Record store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,

    /// Base URL of the REST query API (e.g. `https://db.example.com/rest/v1`)
    #[serde(default)]
    pub url: Option<String>,

    /// Service-role key sent as `apikey` and bearer token
    /// (set via REVPULSE__STORE__SERVICE_KEY)
    #[serde(default)]
    pub service_key: Option<String>,

    #[serde(default = "default_store_timeout")]
    pub timeout_secs: u64,

    /// JSON fixture loaded into the in-memory store at startup
    #[serde(default)]
    pub seed_file: Option<String>,
}

fn default_store_timeout() -> u64 {
    10
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Memory,
            url: None,
            service_key: None,
            timeout_secs: default_store_timeout(),
            seed_file: None,
        }
    }
}

/// Narrative insight generation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Disabled means rule-based insights only
    #[serde(default)]
    pub enabled: bool,

    /// OpenAI-compatible API base (the client appends `/chat/completions`)
    #[serde(default = "default_llm_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_llm_model")]
    pub model: String,

    /// Bearer token (set via REVPULSE__LLM__API_KEY)
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_initial_backoff")]
    pub initial_backoff_ms: u64,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_llm_endpoint() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_llm_model() -> String {
    "gpt-4o-mini".to_string()
}
fn default_llm_timeout() -> u64 {
    20
}
fn default_max_retries() -> u32 {
    2
}
fn default_initial_backoff() -> u64 {
    250
}
fn default_max_tokens() -> u32 {
    512
}
fn default_temperature() -> f32 {
    0.3
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: default_llm_endpoint(),
            model: default_llm_model(),
            api_key: None,
            timeout_secs: default_llm_timeout(),
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
        }
    }
}

/// Dashboard list sizes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Customer health alerts returned by the dashboard
    #[serde(default = "default_alert_limit")]
    pub alert_limit: usize,

    /// Campaigns shown on the RevOps dashboard
    #[serde(default = "default_top_campaigns")]
    pub top_campaigns: usize,

    /// Insights and recommendations per analysis
    #[serde(default = "default_insight_limit")]
    pub insight_limit: usize,
}

fn default_alert_limit() -> usize {
    10
}
fn default_top_campaigns() -> usize {
    5
}
fn default_insight_limit() -> usize {
    4
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            alert_limit: default_alert_limit(),
            top_campaigns: default_top_campaigns(),
            insight_limit: default_insight_limit(),
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

/// Observability configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Default filter directive, overridden by RUST_LOG
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub log_format: LogFormat,

    /// Expose Prometheus metrics on /metrics
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: LogFormat::Compact,
            metrics_enabled: true,
        }
    }
}

/// Load settings from `config/` under the working directory
///
/// `env` names an extra file layered over `config/default`; when `None`,
/// the `REVPULSE_ENV` variable is consulted.
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    load_settings_from(Path::new("config"), env)
}

/// Load settings from an explicit configuration directory
pub fn load_settings_from(dir: &Path, env: Option<&str>) -> Result<Settings, ConfigError> {
    let selected = match env {
        Some(name) => Some(name.to_string()),
        None => std::env::var(ENV_SELECTOR).ok().filter(|s| !s.is_empty()),
    };
    build_settings(dir, selected.as_deref(), None)
}

/// Layer files and environment variables into validated settings
///
/// `vars` replaces the process environment when given.
pub(crate) fn build_settings(
    dir: &Path,
    env: Option<&str>,
    vars: Option<HashMap<String, String>>,
) -> Result<Settings, ConfigError> {
    if !dir.exists() {
        tracing::debug!(dir = %dir.display(), "Config directory missing, using defaults");
    }

    let mut builder = Config::builder();

    builder = builder.add_source(File::from(dir.join("default")).required(false));

    if let Some(env_name) = env {
        builder = builder.add_source(File::from(dir.join(env_name)).required(false));
    }

    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("__")
            .separator("__")
            .list_separator(",")
            .with_list_parse_key("server.cors_origins")
            .with_list_parse_key("auth.public_paths")
            .try_parsing(true)
            .source(vars),
    );

    let config = builder.build()?;
    let settings: Settings = config.try_deserialize()?;

    settings.validate()?;

    tracing::debug!(environment = ?settings.environment, "Settings loaded");
    Ok(settings)
}
