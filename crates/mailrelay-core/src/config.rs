//! Relay configuration loaded from the environment.

use crate::delivery::DEFAULT_API_URL;
use crate::error::{Error, Result};
use mailrelay_smtp::ServerConfig;
use std::str::FromStr;
use std::time::Duration;

/// Default listen address.
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:2525";
/// Default SMTP domain announced in greetings.
pub const DEFAULT_DOMAIN: &str = "localhost";
/// Default idle timeout per command, in seconds.
pub const DEFAULT_MAX_IDLE_SECONDS: u64 = 300;
/// Default maximum message size (32 MiB).
pub const DEFAULT_MAX_MESSAGE_BYTES: usize = 32 * 1024 * 1024;
/// Default maximum recipients per transaction.
pub const DEFAULT_MAX_RECIPIENTS: usize = 50;

/// Runtime configuration of the relay.
#[derive(Clone, PartialEq, Eq)]
pub struct RelayConfig {
    /// Socket address the SMTP listener binds to.
    pub listen_addr: String,
    /// Domain announced in the SMTP greeting.
    pub domain: String,
    /// Delivery API credential.
    pub api_key: String,
    /// Delivery API endpoint.
    pub api_url: String,
    /// Idle timeout for a single command read.
    pub max_idle: Duration,
    /// Maximum accepted message size in bytes.
    pub max_message_bytes: usize,
    /// Maximum recipients per transaction.
    pub max_recipients: usize,
}

impl std::fmt::Debug for RelayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayConfig")
            .field("listen_addr", &self.listen_addr)
            .field("domain", &self.domain)
            .field("api_key", &"<redacted>")
            .field("api_url", &self.api_url)
            .field("max_idle", &self.max_idle)
            .field("max_message_bytes", &self.max_message_bytes)
            .field("max_recipients", &self.max_recipients)
            .finish()
    }
}

impl RelayConfig {
    /// Loads the configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `SENDGRID_API_KEY` is missing or a
    /// numeric variable does not parse.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads the configuration through an arbitrary variable lookup.
    ///
    /// Unset and empty variables take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the API key is missing or a numeric
    /// variable does not parse.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let api_key = get("SENDGRID_API_KEY")
            .ok_or_else(|| Error::Config("SENDGRID_API_KEY is required".into()))?;

        Ok(Self {
            listen_addr: get("LISTEN_ADDR").unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string()),
            domain: get("DOMAIN").unwrap_or_else(|| DEFAULT_DOMAIN.to_string()),
            api_key,
            api_url: get("SENDGRID_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            max_idle: Duration::from_secs(parse_number(
                "MAX_IDLE_SECONDS",
                get("MAX_IDLE_SECONDS"),
                DEFAULT_MAX_IDLE_SECONDS,
            )?),
            max_message_bytes: parse_number(
                "MAX_MESSAGE_BYTES",
                get("MAX_MESSAGE_BYTES"),
                DEFAULT_MAX_MESSAGE_BYTES,
            )?,
            max_recipients: parse_number(
                "MAX_RECIPIENTS",
                get("MAX_RECIPIENTS"),
                DEFAULT_MAX_RECIPIENTS,
            )?,
        })
    }
}

impl RelayConfig {
    /// SMTP listener settings derived from this configuration.
    #[must_use]
    pub fn server_config(&self) -> ServerConfig {
        ServerConfig::new(&self.listen_addr, &self.domain)
            .with_max_idle(self.max_idle)
            .with_max_message_bytes(self.max_message_bytes)
            .with_max_recipients(self.max_recipients)
    }
}

fn parse_number<T: FromStr>(name: &str, value: Option<String>, default: T) -> Result<T> {
    value.map_or(Ok(default), |value| {
        value
            .trim()
            .parse()
            .map_err(|_| Error::Config(format!("{name} must be a non-negative integer, got {value:?}")))
    })
}
