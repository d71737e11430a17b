//! Header-level envelope extraction.

use super::address::{AddressError, EmailAddress, parse_address_list};
use mailrelay_mime::Headers;

/// Address-bearing header fields read into the envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressField {
    /// `From`.
    From,
    /// `To`.
    To,
    /// `Cc`.
    Cc,
    /// `Bcc`.
    Bcc,
    /// `Reply-To`.
    ReplyTo,
}

impl AddressField {
    /// All fields, in the order they are mapped.
    pub const ALL: [Self; 5] = [Self::From, Self::To, Self::Cc, Self::Bcc, Self::ReplyTo];

    /// Get the header name for this field.
    #[must_use]
    pub const fn header_name(self) -> &'static str {
        match self {
            Self::From => "From",
            Self::To => "To",
            Self::Cc => "Cc",
            Self::Bcc => "Bcc",
            Self::ReplyTo => "Reply-To",
        }
    }
}

impl std::fmt::Display for AddressField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.header_name())
    }
}

/// A header field whose address list could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedField {
    /// Which field.
    pub field: AddressField,
    /// Raw header value.
    pub value: String,
    /// Parse failure.
    pub error: AddressError,
}

/// Addressing, subject and date of a message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Envelope {
    /// Sender; the last address of the `From` list.
    pub from: Option<EmailAddress>,
    /// Primary recipients.
    pub to: Vec<EmailAddress>,
    /// Carbon-copy recipients.
    pub cc: Vec<EmailAddress>,
    /// Blind carbon-copy recipients.
    pub bcc: Vec<EmailAddress>,
    /// Reply address; the last address of the `Reply-To` list.
    pub reply_to: Option<EmailAddress>,
    /// Subject, verbatim.
    pub subject: String,
    /// Date, verbatim.
    pub date: String,
    /// Fields that were present but malformed and therefore left empty.
    pub rejected: Vec<RejectedField>,
}

/// Maps message headers to an [`Envelope`].
///
/// Every address field is parsed on its own. A malformed field becomes
/// empty and is recorded in [`Envelope::rejected`]; it never fails the
/// mapping.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvelopeMapper;

impl EnvelopeMapper {
    /// Extracts the envelope from top-level message headers.
    #[must_use]
    pub fn map(headers: &Headers) -> Envelope {
        let mut envelope = Envelope {
            subject: headers.get("subject").unwrap_or_default().to_string(),
            date: headers.get("date").unwrap_or_default().to_string(),
            ..Envelope::default()
        };

        for field in AddressField::ALL {
            let Some(value) = headers.get(field.header_name()) else {
                continue;
            };

            let mut addresses = match parse_address_list(value) {
                Ok(addresses) => addresses,
                Err(error) => {
                    envelope.rejected.push(RejectedField {
                        field,
                        value: value.to_string(),
                        error,
                    });
                    continue;
                }
            };

            match field {
                AddressField::From => envelope.from = addresses.pop(),
                AddressField::ReplyTo => envelope.reply_to = addresses.pop(),
                AddressField::To => envelope.to = addresses,
                AddressField::Cc => envelope.cc = addresses,
                AddressField::Bcc => envelope.bcc = addresses,
            }
        }

        envelope
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn headers(pairs: &[(&str, &str)]) -> Headers {
        let mut headers = Headers::new();
        for (name, value) in pairs {
            headers.add(*name, *value);
        }
        headers
    }

    #[test]
    fn test_map_all_fields() {
        let envelope = EnvelopeMapper::map(&headers(&[
            ("From", "Alice <alice@example.com>"),
            ("To", "bob@example.com, Carol <carol@example.com>"),
            ("Cc", "dave@example.com"),
            ("Bcc", "eve@example.com"),
            ("Reply-To", "replies@example.com"),
            ("Subject", "=?utf-8?Q?Caf=C3=A9?= plans"),
            ("Date", "Mon, 19 Oct 2026 10:00:00 +0200"),
        ]));

        assert_eq!(
            envelope.from,
            Some(EmailAddress::with_name("Alice", "alice@example.com"))
        );
        assert_eq!(envelope.to.len(), 2);
        assert_eq!(envelope.cc, vec![EmailAddress::new("dave@example.com")]);
        assert_eq!(envelope.bcc, vec![EmailAddress::new("eve@example.com")]);
        assert_eq!(
            envelope.reply_to,
            Some(EmailAddress::new("replies@example.com"))
        );
        assert_eq!(envelope.subject, "=?utf-8?Q?Caf=C3=A9?= plans");
        assert_eq!(envelope.date, "Mon, 19 Oct 2026 10:00:00 +0200");
        assert!(envelope.rejected.is_empty());
    }

    #[test]
    fn test_last_from_wins() {
        let envelope = EnvelopeMapper::map(&headers(&[(
            "From",
            "first@example.com, second@example.com",
        )]));
        assert_eq!(envelope.from, Some(EmailAddress::new("second@example.com")));
    }

    #[test]
    fn test_malformed_field_is_isolated() {
        let envelope = EnvelopeMapper::map(&headers(&[
            ("To", "bob@example.com"),
            ("Cc", "\"unterminated <x@example.com>"),
        ]));

        assert_eq!(envelope.to, vec![EmailAddress::new("bob@example.com")]);
        assert!(envelope.cc.is_empty());
        assert_eq!(envelope.rejected.len(), 1);
        assert_eq!(envelope.rejected[0].field, AddressField::Cc);
        assert_eq!(envelope.rejected[0].error, AddressError::UnterminatedQuote);
    }

    #[test]
    fn test_missing_headers() {
        let envelope = EnvelopeMapper::map(&Headers::new());
        assert_eq!(envelope, Envelope::default());
    }
}
