//! Message handler seam between the SMTP session and the application.

use crate::types::{Address, BodyType};
use std::fmt::Display;
use std::future::Future;

/// A message accepted at the end of DATA.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedMessage {
    /// Hostname the client announced in HELO/EHLO.
    pub client_hostname: String,
    /// Envelope sender, `None` for the null reverse-path.
    pub from: Option<Address>,
    /// Body type declared with `BODY=`, 7BIT when absent.
    pub body: BodyType,
    /// Envelope recipients in RCPT order.
    pub recipients: Vec<Address>,
    /// Raw RFC 822 message with dot-stuffing removed.
    pub data: Vec<u8>,
}

/// Processes messages received by the server.
///
/// `Ok` is answered with 250 and `Err` with 554 carrying the error text.
pub trait MessageHandler: Send + Sync + 'static {
    /// Failure reported to the client.
    type Error: Display + Send;

    /// Handles one message.
    fn handle(
        &self,
        message: ReceivedMessage,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;
}
