mod config;
mod models;
mod protection;
mod proxy;
#[cfg(test)]
mod test_support;

use std::sync::Arc;

use anyhow::Context;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::settings::{LoggingConfig, Settings};
use crate::protection::bot_signatures::BotSignatures;
use crate::protection::classifier::RequestClassifier;
use crate::protection::policy::ReputationPolicy;
use crate::protection::reputation::IpInfoClient;
use crate::proxy::http_handler::HttpHandler;
use crate::proxy::server::GatewayServer;

/// Parse the `--config` CLI flag. Defaults to `/opt/edgeguard/config/edgeguard.toml`.
fn parse_config_path() -> String {
    let args: Vec<String> = std::env::args().collect();
    let mut config_path = String::from("/opt/edgeguard/config/edgeguard.toml");

    let mut i = 1;
    while i < args.len() {
        if args[i] == "--config" {
            if let Some(path) = args.get(i + 1) {
                config_path = path.clone();
            }
            i += 2;
        } else {
            i += 1;
        }
    }

    config_path
}

/// Initialise the `tracing` subscriber: stdout always, plus an optional
/// log file. `RUST_LOG` overrides the configured level.
fn init_tracing(logging: &LoggingConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let stdout_layer = if logging.json {
        fmt::layer().json().with_target(true).boxed()
    } else {
        fmt::layer().with_writer(std::io::stdout).with_target(true).boxed()
    };

    let file_layer = if logging.file.is_empty() {
        None
    } else {
        if let Some(parent) = std::path::Path::new(&logging.file).parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        let log_file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&logging.file)
            .with_context(|| format!("Failed to open log file {}", logging.file))?;
        Some(
            fmt::layer()
                .with_writer(std::sync::Mutex::new(log_file))
                .with_ansi(false)
                .with_target(true),
        )
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    Ok(())
}

/// Read the reputation API token from the environment once at startup.
fn read_credential(env_name: &str) -> Option<String> {
    std::env::var(env_name).ok().filter(|t| !t.trim().is_empty())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ---------------------------------------------------------------
    // 1. Configuration
    // ---------------------------------------------------------------
    let config_path = parse_config_path();
    let settings = Settings::load(&config_path)?;

    // ---------------------------------------------------------------
    // 2. Logging
    // ---------------------------------------------------------------
    init_tracing(&settings.logging)?;

    info!("Starting edgeguard");
    info!("Config loaded from {}", config_path);

    // ---------------------------------------------------------------
    // 3. Classifier
    // ---------------------------------------------------------------
    let bots = BotSignatures::new(&settings.bots.extra_signatures)
        .context("Invalid entry in bots.extra_signatures")?;
    info!("Loaded {} bot signatures", bots.len());

    let credential = read_credential(&settings.reputation.token_env);
    let reputation = Arc::new(IpInfoClient::new(&settings.reputation, credential)?);
    if !reputation.has_credential() {
        warn!(
            env = %settings.reputation.token_env,
            "Reputation API token not set; IP reputation checks will pass every request"
        );
    }
    let classifier = Arc::new(RequestClassifier::new(
        bots,
        reputation,
        ReputationPolicy::new(&settings.redirect),
    ));

    // ---------------------------------------------------------------
    // 4. HTTP front
    // ---------------------------------------------------------------
    let handler = Arc::new(HttpHandler::new(classifier, &settings));
    let server = GatewayServer::new(&settings.server, handler);

    info!(
        upstream = %settings.upstream.address,
        trust_peer_address = settings.client_ip.trust_peer_address,
        "Gatekeeper configured"
    );

    let mut server_handle = tokio::spawn(async move { server.run().await });

    // ---------------------------------------------------------------
    // 5. Run until Ctrl+C or the listener fails
    // ---------------------------------------------------------------
    tokio::select! {
        res = tokio::signal::ctrl_c() => {
            res?;
            info!("Shutting down edgeguard...");
        }
        res = &mut server_handle => {
            if let Err(e) = res.context("Server task panicked")? {
                error!("Server error: {:#}", e);
                return Err(e);
            }
        }
    }

    server_handle.abort();
    info!("edgeguard shut down");
    Ok(())
}
