//! Delivery API client seam.
//!
//! The relay only depends on [`DeliveryClient`]; [`SendGridClient`] is the
//! production implementation and tests substitute their own.

mod sendgrid;

pub use sendgrid::{DEFAULT_API_URL, SendGridClient};

use crate::document::DeliveryDocument;
use std::future::Future;

/// Failure to hand a document to the delivery API.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    /// The API answered with a non-success status (>= 300).
    #[error("Delivery rejected with status {status}: {body}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Diagnostic response body.
        body: String,
    },

    /// The request never produced a response.
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The document could not be serialized.
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Status and body returned by the delivery API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body.
    pub body: String,
}

impl DeliveryResponse {
    /// Creates a response.
    #[must_use]
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Returns true for statuses below 300.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status < 300
    }

    /// Converts a non-success response into [`DeliveryError::Rejected`].
    ///
    /// # Errors
    ///
    /// Returns an error if the status is 300 or above.
    pub fn into_result(self) -> Result<Self, DeliveryError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(DeliveryError::Rejected {
                status: self.status,
                body: self.body,
            })
        }
    }
}

/// Submits documents to a delivery API.
///
/// Implementations report every HTTP status as a [`DeliveryResponse`] and
/// only fail for transport or serialization problems. They do not retry.
pub trait DeliveryClient: Send + Sync {
    /// Sends one document.
    fn send(
        &self,
        document: &DeliveryDocument,
    ) -> impl Future<Output = Result<DeliveryResponse, DeliveryError>> + Send;
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_response_status_mapping() {
        assert!(DeliveryResponse::new(202, "").into_result().is_ok());

        let err = DeliveryResponse::new(400, "bad request")
            .into_result()
            .unwrap_err();
        assert!(matches!(
            err,
            DeliveryError::Rejected { status: 400, ref body } if body == "bad request"
        ));

        assert!(!DeliveryResponse::new(300, "").is_success());
    }
}
