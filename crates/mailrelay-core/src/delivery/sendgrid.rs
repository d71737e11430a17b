//! SendGrid v3 `mail/send` client.

use super::{DeliveryClient, DeliveryError, DeliveryResponse};
use crate::document::DeliveryDocument;
use crate::envelope::EmailAddress;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use serde::Serialize;
use std::collections::BTreeMap;
use std::future::Future;

/// Default SendGrid v3 endpoint.
pub const DEFAULT_API_URL: &str = "https://api.sendgrid.com/v3/mail/send";

/// Delivery client for the SendGrid v3 API.
#[derive(Clone)]
pub struct SendGridClient {
    api_key: String,
    api_url: String,
    http_client: Client,
}

impl std::fmt::Debug for SendGridClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SendGridClient")
            .field("api_key", &"<redacted>")
            .field("api_url", &self.api_url)
            .finish_non_exhaustive()
    }
}

impl SendGridClient {
    /// Creates a client for the default endpoint.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_url: DEFAULT_API_URL.to_string(),
            http_client: Client::new(),
        }
    }

    /// Sets the endpoint URL.
    #[must_use]
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    /// Returns the endpoint URL.
    #[must_use]
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Serializes a document into a `mail/send` request body.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn request_body(document: &DeliveryDocument) -> Result<Vec<u8>, DeliveryError> {
        serde_json::to_vec(&MailSend::from(document)).map_err(Into::into)
    }
}

impl DeliveryClient for SendGridClient {
    fn send(
        &self,
        document: &DeliveryDocument,
    ) -> impl Future<Output = Result<DeliveryResponse, DeliveryError>> + Send {
        let body = Self::request_body(document);

        async move {
            let response = self
                .http_client
                .post(&self.api_url)
                .bearer_auth(&self.api_key)
                .header(CONTENT_TYPE, "application/json")
                .body(body?)
                .send()
                .await?;

            let status = response.status().as_u16();
            let body = response.text().await?;
            Ok(DeliveryResponse { status, body })
        }
    }
}

fn is_empty(s: &&str) -> bool {
    s.is_empty()
}

#[derive(Serialize)]
struct MailSend<'a> {
    personalizations: Vec<WirePersonalization<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    from: Option<WireEmail<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to: Option<WireEmail<'a>>,
    #[serde(skip_serializing_if = "is_empty")]
    subject: &'a str,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    headers: BTreeMap<&'static str, &'a str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    content: Vec<WireContent<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    attachments: Vec<WireAttachment<'a>>,
}

#[derive(Serialize)]
struct WirePersonalization<'a> {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    to: Vec<WireEmail<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    cc: Vec<WireEmail<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    bcc: Vec<WireEmail<'a>>,
}

#[derive(Serialize)]
struct WireEmail<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    email: &'a str,
}

#[derive(Serialize)]
struct WireContent<'a> {
    #[serde(rename = "type")]
    media_type: &'a str,
    value: &'a str,
}

#[derive(Serialize)]
struct WireAttachment<'a> {
    content: &'a str,
    #[serde(rename = "type")]
    media_type: &'a str,
    filename: &'a str,
    disposition: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    content_id: Option<&'a str>,
}

impl<'a> From<&'a EmailAddress> for WireEmail<'a> {
    fn from(address: &'a EmailAddress) -> Self {
        Self {
            name: address.name.as_deref(),
            email: &address.address,
        }
    }
}

fn wire_list(addresses: &[EmailAddress]) -> Vec<WireEmail<'_>> {
    addresses.iter().map(WireEmail::from).collect()
}

impl<'a> From<&'a DeliveryDocument> for MailSend<'a> {
    fn from(document: &'a DeliveryDocument) -> Self {
        let mut headers = BTreeMap::new();
        if !document.date.is_empty() {
            headers.insert("Date", document.date.as_str());
        }

        Self {
            personalizations: vec![WirePersonalization {
                to: wire_list(&document.personalization.to),
                cc: wire_list(&document.personalization.cc),
                bcc: wire_list(&document.personalization.bcc),
            }],
            from: document.from.as_ref().map(WireEmail::from),
            reply_to: document.reply_to.as_ref().map(WireEmail::from),
            subject: &document.subject,
            headers,
            content: document
                .contents
                .iter()
                .map(|c| WireContent {
                    media_type: &c.media_type,
                    value: &c.text,
                })
                .collect(),
            attachments: document
                .attachments
                .iter()
                .map(|a| WireAttachment {
                    content: &a.content,
                    media_type: &a.media_type,
                    filename: &a.filename,
                    disposition: a.disposition.as_str(),
                    content_id: a.content_id.as_deref(),
                })
                .collect(),
        }
    }
}
