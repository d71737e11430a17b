//! `mailrelay` - SMTP relay to the SendGrid v3 mail/send API
//!
//! Accepts mail on an unauthenticated SMTP listener, reshapes each message
//! into a delivery document and submits it over HTTPS.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

use anyhow::Context;
use mailrelay_core::{Relay, RelayConfig, SendGridClient};
use mailrelay_smtp::Server;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "mailrelay=info,mailrelay_core=info,mailrelay_smtp=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = RelayConfig::from_env().context("Failed to load configuration")?;
    info!(?config, "Configuration loaded");

    let client = SendGridClient::new(&config.api_key).with_api_url(&config.api_url);
    let server = Server::new(config.server_config(), Relay::new(client));

    tokio::select! {
        result = server.listen_and_serve() => {
            result.with_context(|| format!("SMTP server on {} failed", config.listen_addr))?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutting down");
        }
    }

    Ok(())
}
