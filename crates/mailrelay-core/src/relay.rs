//! Relay service.
//!
//! Turns raw RFC 822 bytes into a [`DeliveryDocument`] and submits it
//! through a [`DeliveryClient`]. A structural MIME failure aborts the
//! attempt before anything is sent.

use crate::delivery::{DeliveryClient, DeliveryError, DeliveryResponse};
use crate::document::{DeliveryDocument, DocumentBuilder};
use crate::envelope::EnvelopeMapper;
use crate::error::{Error, Result};
use mailrelay_mime::{MimeWalker, RawMessage};
use mailrelay_smtp::{MessageHandler, ReceivedMessage};
use tracing::{debug, error, info, warn};

/// Relays messages to a delivery API.
#[derive(Debug, Clone)]
pub struct Relay<C> {
    client: C,
    walker: MimeWalker,
}

impl<C: DeliveryClient> Relay<C> {
    /// Creates a relay with the default walker limits.
    #[must_use]
    pub fn new(client: C) -> Self {
        Self {
            client,
            walker: MimeWalker::new(),
        }
    }

    /// Replaces the walker, e.g. to change the nesting limit.
    #[must_use]
    pub fn with_walker(mut self, walker: MimeWalker) -> Self {
        self.walker = walker;
        self
    }

    /// Returns the delivery client.
    #[must_use]
    pub const fn client(&self) -> &C {
        &self.client
    }

    /// Builds the delivery document without sending it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Mime`] if the body is structurally malformed.
    pub fn prepare(&self, raw: &[u8]) -> Result<DeliveryDocument> {
        let message = RawMessage::parse(raw);

        let envelope = EnvelopeMapper::map(&message.headers);
        for rejected in &envelope.rejected {
            warn!(
                field = %rejected.field,
                value = %rejected.value,
                error = %rejected.error,
                "Ignoring malformed address header"
            );
        }

        let body = self.walker.walk(&message.headers, message.body())?;
        debug!(
            contents = body.contents.len(),
            attachments = body.attachments.len(),
            "Message body normalized"
        );

        Ok(DocumentBuilder::new(envelope).build(body))
    }

    /// Builds the document and sends it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Mime`] for a malformed body and [`Error::Delivery`]
    /// when the API answers with status 300 or above or cannot be reached.
    pub async fn relay(&self, raw: &[u8]) -> Result<DeliveryResponse> {
        let document = self.prepare(raw)?;
        let recipients = recipient_list(&document);

        match self.client.send(&document).await.and_then(DeliveryResponse::into_result) {
            Ok(response) => {
                info!(%recipients, status = response.status, "Message relayed");
                Ok(response)
            }
            Err(DeliveryError::Rejected { status, body }) => {
                warn!(%recipients, status, %body, "Delivery API rejected message");
                Err(DeliveryError::Rejected { status, body }.into())
            }
            Err(err) => {
                error!(%recipients, error = %err, "Delivery failed");
                Err(err.into())
            }
        }
    }
}

impl<C: DeliveryClient + 'static> MessageHandler for Relay<C> {
    type Error = Error;

    async fn handle(&self, message: ReceivedMessage) -> Result<()> {
        debug!(
            client = %message.client_hostname,
            envelope_recipients = message.recipients.len(),
            body = ?message.body,
            "Relaying received message"
        );
        self.relay(&message.data).await.map(|_| ())
    }
}

fn recipient_list(document: &DeliveryDocument) -> String {
    document
        .recipients()
        .map(|recipient| recipient.address.as_str())
        .collect::<Vec<_>>()
        .join(",")
}
