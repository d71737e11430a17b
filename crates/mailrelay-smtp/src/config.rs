//! Server configuration.

use std::time::Duration;

/// Limits and identity of the SMTP server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Socket address to bind.
    pub listen_addr: String,
    /// Domain announced in the greeting and EHLO response.
    pub domain: String,
    /// Maximum wait for the next command or DATA line.
    pub max_idle: Duration,
    /// Maximum message size in bytes.
    pub max_message_bytes: usize,
    /// Maximum recipients per transaction.
    pub max_recipients: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:2525".to_string(),
            domain: "localhost".to_string(),
            max_idle: Duration::from_secs(300),
            max_message_bytes: 32 * 1024 * 1024,
            max_recipients: 50,
        }
    }
}

impl ServerConfig {
    /// Creates a configuration with default limits.
    #[must_use]
    pub fn new(listen_addr: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            listen_addr: listen_addr.into(),
            domain: domain.into(),
            ..Self::default()
        }
    }

    /// Sets the idle timeout.
    #[must_use]
    pub const fn with_max_idle(mut self, max_idle: Duration) -> Self {
        self.max_idle = max_idle;
        self
    }

    /// Sets the maximum message size.
    #[must_use]
    pub const fn with_max_message_bytes(mut self, max_message_bytes: usize) -> Self {
        self.max_message_bytes = max_message_bytes;
        self
    }

    /// Sets the maximum recipients per transaction.
    #[must_use]
    pub const fn with_max_recipients(mut self, max_recipients: usize) -> Self {
        self.max_recipients = max_recipients;
        self
    }
}
