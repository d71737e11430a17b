//! Error types for the relay core.

use crate::delivery::DeliveryError;
use thiserror::Error;

/// Errors that can occur while relaying a message.
#[derive(Debug, Error)]
pub enum Error {
    /// The message body is structurally malformed.
    #[error("MIME error: {0}")]
    Mime(#[from] mailrelay_mime::Error),

    /// The delivery API rejected the document or could not be reached.
    #[error("Delivery error: {0}")]
    Delivery(#[from] DeliveryError),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
