use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fs;

use super::defaults;

/// Top-level configuration for the edgeguard gatekeeper.
/// Deserializes from a TOML configuration file.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default = "defaults::default_server_config")]
    pub server: ServerConfig,

    #[serde(default = "defaults::default_upstream_config")]
    pub upstream: UpstreamConfig,

    #[serde(default = "defaults::default_client_ip_config")]
    pub client_ip: ClientIpConfig,

    #[serde(default = "defaults::default_reputation_config")]
    pub reputation: ReputationConfig,

    #[serde(default = "defaults::default_redirect_config")]
    pub redirect: RedirectConfig,

    #[serde(default = "defaults::default_bots_config")]
    pub bots: BotsConfig,

    #[serde(default = "defaults::default_logging_config")]
    pub logging: LoggingConfig,
}

impl Settings {
    /// Load configuration from a TOML file at the given path.
    pub fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;
        Self::from_toml(&content).with_context(|| format!("Failed to parse config file: {}", path))
    }

    /// Parse and validate configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self> {
        let settings: Settings = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        if !(300..400).contains(&self.redirect.status) {
            bail!(
                "redirect.status must be a 3xx status code, got {}",
                self.redirect.status
            );
        }
        if self.redirect.location.is_empty() {
            bail!("redirect.location must not be empty");
        }
        if self.reputation.base_url.is_empty() {
            bail!("reputation.base_url must not be empty");
        }
        Ok(())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: defaults::default_server_config(),
            upstream: defaults::default_upstream_config(),
            client_ip: defaults::default_client_ip_config(),
            reputation: defaults::default_reputation_config(),
            redirect: defaults::default_redirect_config(),
            bots: defaults::default_bots_config(),
            logging: defaults::default_logging_config(),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "defaults::default_bind")]
    pub bind: String,

    #[serde(default = "defaults::default_max_connections")]
    pub max_connections: usize,
}

/// Origin that receives pass-through traffic.
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamConfig {
    #[serde(default = "defaults::default_upstream_address")]
    pub address: String,

    #[serde(default = "defaults::default_response_timeout_ms")]
    pub response_timeout_ms: u64,
}

/// Client IP resolution.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientIpConfig {
    /// Treat the TCP peer address as the platform-supplied client IP.
    /// Disable when running behind a load balancer.
    #[serde(default = "defaults::default_trust_peer_address")]
    pub trust_peer_address: bool,
}

/// IP-intelligence lookup (ipinfo.io compatible).
#[derive(Debug, Clone, Deserialize)]
pub struct ReputationConfig {
    #[serde(default = "defaults::default_reputation_base_url")]
    pub base_url: String,

    /// Name of the environment variable holding the API token.
    #[serde(default = "defaults::default_token_env")]
    pub token_env: String,

    #[serde(default = "defaults::default_reputation_timeout_ms")]
    pub timeout_ms: u64,
}

/// Where ISP users are sent.
#[derive(Debug, Clone, Deserialize)]
pub struct RedirectConfig {
    #[serde(default = "defaults::default_redirect_location")]
    pub location: String,

    #[serde(default = "defaults::default_redirect_status")]
    pub status: u16,
}

/// Additional user-agent signatures appended to the built-in table.
#[derive(Debug, Clone, Deserialize)]
pub struct BotsConfig {
    #[serde(default)]
    pub extra_signatures: Vec<String>,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "defaults::default_log_level")]
    pub level: String,

    /// Optional log file written alongside stdout. Empty disables it.
    #[serde(default)]
    pub file: String,

    #[serde(default)]
    pub json: bool,
}
