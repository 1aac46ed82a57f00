use super::settings::{
    BotsConfig, ClientIpConfig, LoggingConfig, RedirectConfig, ReputationConfig, ServerConfig,
    UpstreamConfig,
};

// ---------------------------------------------------------------------------
// Top-level struct defaults
// ---------------------------------------------------------------------------

pub fn default_server_config() -> ServerConfig {
    ServerConfig {
        bind: default_bind(),
        max_connections: default_max_connections(),
    }
}

pub fn default_upstream_config() -> UpstreamConfig {
    UpstreamConfig {
        address: default_upstream_address(),
        response_timeout_ms: default_response_timeout_ms(),
    }
}

pub fn default_client_ip_config() -> ClientIpConfig {
    ClientIpConfig {
        trust_peer_address: default_trust_peer_address(),
    }
}

pub fn default_reputation_config() -> ReputationConfig {
    ReputationConfig {
        base_url: default_reputation_base_url(),
        token_env: default_token_env(),
        timeout_ms: default_reputation_timeout_ms(),
    }
}

pub fn default_redirect_config() -> RedirectConfig {
    RedirectConfig {
        location: default_redirect_location(),
        status: default_redirect_status(),
    }
}

pub fn default_bots_config() -> BotsConfig {
    BotsConfig {
        extra_signatures: Vec::new(),
    }
}

pub fn default_logging_config() -> LoggingConfig {
    LoggingConfig {
        level: default_log_level(),
        file: String::new(),
        json: false,
    }
}

// ---------------------------------------------------------------------------
// Server
// ---------------------------------------------------------------------------

pub fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

pub fn default_max_connections() -> usize {
    10_000
}

// ---------------------------------------------------------------------------
// Upstream
// ---------------------------------------------------------------------------

pub fn default_upstream_address() -> String {
    "127.0.0.1:3000".to_string()
}

pub fn default_response_timeout_ms() -> u64 {
    60_000
}

// ---------------------------------------------------------------------------
// Client IP / reputation / redirect
// ---------------------------------------------------------------------------

pub fn default_trust_peer_address() -> bool { true }

pub fn default_reputation_base_url() -> String {
    "https://ipinfo.io".to_string()
}

pub fn default_token_env() -> String {
    "IPINFO_TOKEN".to_string()
}

pub fn default_reputation_timeout_ms() -> u64 { 3_000 }

pub fn default_redirect_location() -> String {
    "https://myworkshop.net".to_string()
}

pub fn default_redirect_status() -> u16 { 302 }

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

pub fn default_log_level() -> String {
    "info".to_string()
}
