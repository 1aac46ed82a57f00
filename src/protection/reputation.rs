use std::time::Duration;

use anyhow::{bail, Context};
use async_trait::async_trait;
use reqwest::{Client, Url};
use tracing::debug;

use crate::config::settings::ReputationConfig;
use crate::models::reputation::ReputationRecord;

// ---------------------------------------------------------------------------
// Lookup errors
// ---------------------------------------------------------------------------

/// Why a reputation lookup produced no record.
#[derive(Debug)]
pub enum LookupError {
    /// No API token configured; no request was made.
    MissingCredential,
    /// The request timed out.
    Timeout,
    /// Connection or protocol failure.
    Transport(reqwest::Error),
    /// The service answered with a non-2xx status.
    Status(u16),
    /// The body was not a valid reputation document.
    Decode(String),
    /// The lookup URL could not be built for this IP.
    InvalidTarget,
}

impl LookupError {
    /// Stable reason code for log fields.
    pub fn code(&self) -> &'static str {
        match self {
            LookupError::MissingCredential => "missing_credential",
            LookupError::Timeout => "timeout",
            LookupError::Transport(_) => "transport",
            LookupError::Status(_) => "http_status",
            LookupError::Decode(_) => "decode",
            LookupError::InvalidTarget => "invalid_target",
        }
    }
}

impl std::fmt::Display for LookupError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LookupError::MissingCredential => write!(f, "No reputation API token configured"),
            LookupError::Timeout => write!(f, "Request timed out"),
            LookupError::Transport(e) => write!(f, "HTTP error: {}", e),
            LookupError::Status(code) => write!(f, "Unexpected HTTP status {}", code),
            LookupError::Decode(msg) => write!(f, "Invalid response: {}", msg),
            LookupError::InvalidTarget => write!(f, "Cannot build lookup URL"),
        }
    }
}

impl std::error::Error for LookupError {}

impl From<reqwest::Error> for LookupError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            LookupError::Timeout
        } else if e.is_decode() {
            LookupError::Decode(e.to_string())
        } else {
            LookupError::Transport(e)
        }
    }
}

// ---------------------------------------------------------------------------
// ReputationSource
// ---------------------------------------------------------------------------

/// Something that can classify an IP address.
#[async_trait]
pub trait ReputationSource: Send + Sync {
    /// Fetch the reputation record for `ip`. Exactly one attempt is made.
    async fn lookup(&self, ip: &str) -> Result<ReputationRecord, LookupError>;

    /// Source name for logging.
    fn name(&self) -> &str;
}

// ---------------------------------------------------------------------------
// IpInfoClient
// ---------------------------------------------------------------------------

/// ipinfo.io client: `GET <base>/<ip>?token=<token>`.
pub struct IpInfoClient {
    client: Client,
    base_url: Url,
    token: Option<String>,
}

impl IpInfoClient {
    pub fn new(config: &ReputationConfig, token: Option<String>) -> anyhow::Result<Self> {
        let base_url = Url::parse(&config.base_url)
            .with_context(|| format!("Invalid reputation.base_url: {}", config.base_url))?;
        if base_url.cannot_be_a_base() {
            bail!("reputation.base_url cannot carry a path: {}", config.base_url);
        }

        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .no_proxy()
            .build()
            .context("Failed to create reputation HTTP client")?;

        Ok(Self {
            client,
            base_url,
            token: token.filter(|t| !t.is_empty()),
        })
    }

    pub fn has_credential(&self) -> bool {
        self.token.is_some()
    }

    /// Build the lookup URL. The IP is pushed as a single path segment so
    /// unvalidated header input cannot change the request target.
    fn lookup_url(&self, ip: &str, token: &str) -> Result<Url, LookupError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| LookupError::InvalidTarget)?
            .pop_if_empty()
            .push(ip);
        url.query_pairs_mut().append_pair("token", token);
        Ok(url)
    }
}

#[async_trait]
impl ReputationSource for IpInfoClient {
    async fn lookup(&self, ip: &str) -> Result<ReputationRecord, LookupError> {
        let token = self.token.as_deref().ok_or(LookupError::MissingCredential)?;
        let url = self.lookup_url(ip, token)?;

        debug!(ip = %ip, "Querying ipinfo");

        let response = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::Status(status.as_u16()));
        }

        let record: ReputationRecord = response.json().await?;

        debug!(
            ip = %ip,
            bogon = record.is_bogon(),
            privacy = record.any_privacy_flag(),
            company_type = %record.company_type(),
            "ipinfo lookup complete"
        );

        Ok(record)
    }

    fn name(&self) -> &str {
        "ipinfo"
    }
}
