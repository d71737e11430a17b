//! Normalized delivery document and its builder.

use crate::envelope::{EmailAddress, Envelope};
use mailrelay_mime::{Attachment, TextContent, WalkOutput};
use std::collections::HashSet;
use uuid::Uuid;

/// Recipient grouping for one logical send.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Personalization {
    /// Primary recipients.
    pub to: Vec<EmailAddress>,
    /// Carbon-copy recipients.
    pub cc: Vec<EmailAddress>,
    /// Blind carbon-copy recipients.
    pub bcc: Vec<EmailAddress>,
}

/// A message reshaped for a delivery API.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryDocument {
    /// Sender.
    pub from: Option<EmailAddress>,
    /// Recipients.
    pub personalization: Personalization,
    /// Reply address.
    pub reply_to: Option<EmailAddress>,
    /// Subject, verbatim.
    pub subject: String,
    /// Date header, verbatim.
    pub date: String,
    /// Text bodies in document order.
    pub contents: Vec<TextContent>,
    /// Attachments in document order.
    pub attachments: Vec<Attachment>,
}

impl DeliveryDocument {
    /// Iterates over every recipient (to, cc, bcc).
    pub fn recipients(&self) -> impl Iterator<Item = &EmailAddress> {
        self.personalization
            .to
            .iter()
            .chain(&self.personalization.cc)
            .chain(&self.personalization.bcc)
    }
}

/// Merges an [`Envelope`] and a successful walk into a [`DeliveryDocument`].
#[derive(Debug, Clone)]
pub struct DocumentBuilder {
    envelope: Envelope,
}

impl DocumentBuilder {
    /// Starts a document from its envelope.
    #[must_use]
    pub const fn new(envelope: Envelope) -> Self {
        Self { envelope }
    }

    /// Finishes the document with the walked body.
    ///
    /// Attachment filenames are made non-empty and unique within the
    /// document; colliding names get a `-N` suffix before the extension.
    /// Content-IDs lose any angle brackets, and blank ones are dropped.
    #[must_use]
    pub fn build(self, body: WalkOutput) -> DeliveryDocument {
        let Envelope {
            from,
            to,
            cc,
            bcc,
            reply_to,
            subject,
            date,
            ..
        } = self.envelope;

        let mut taken = HashSet::new();
        let attachments = body
            .attachments
            .into_iter()
            .map(|mut attachment| {
                attachment.filename = unique_filename(&attachment.filename, &mut taken);
                attachment.content_id = attachment.content_id.as_deref().and_then(normalize_cid);
                attachment
            })
            .collect();

        DeliveryDocument {
            from,
            personalization: Personalization { to, cc, bcc },
            reply_to,
            subject,
            date,
            contents: body.contents,
            attachments,
        }
    }
}

fn unique_filename(declared: &str, taken: &mut HashSet<String>) -> String {
    if declared.trim().is_empty() {
        let generated = Uuid::new_v4().to_string();
        taken.insert(generated.clone());
        return generated;
    }

    if taken.insert(declared.to_string()) {
        return declared.to_string();
    }

    let (stem, extension) = match declared.rfind('.') {
        Some(dot) if dot > 0 => declared.split_at(dot),
        _ => (declared, ""),
    };

    let mut counter = 1;
    loop {
        let candidate = format!("{stem}-{counter}{extension}");
        if taken.insert(candidate.clone()) {
            return candidate;
        }
        counter += 1;
    }
}

fn normalize_cid(value: &str) -> Option<String> {
    let value = value.trim().trim_start_matches('<').trim_end_matches('>').trim();
    (!value.is_empty()).then(|| value.to_string())
}
