//! Raw message and body segment structures.

use crate::content_type::{ContentType, parse_parameters};
use crate::encoding::decode_rfc2047;
use crate::error::Result;
use crate::header::Headers;
use crate::walker::Disposition;

/// Transfer encoding types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferEncoding {
    /// 7-bit ASCII.
    SevenBit,
    /// 8-bit binary.
    EightBit,
    /// Base64 encoding.
    Base64,
    /// Quoted-Printable encoding.
    QuotedPrintable,
    /// Binary (no encoding).
    Binary,
}

impl TransferEncoding {
    /// Parses transfer encoding from string.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "8bit" => Self::EightBit,
            "base64" => Self::Base64,
            "quoted-printable" => Self::QuotedPrintable,
            "binary" => Self::Binary,
            _ => Self::SevenBit, // Default (includes "7bit")
        }
    }
}

/// An inbound message split into its header block and unconsumed body.
#[derive(Debug, Clone)]
pub struct RawMessage {
    /// Top-level headers.
    pub headers: Headers,
    body: Vec<u8>,
}

impl RawMessage {
    /// Splits a raw RFC 822 message on the first empty line.
    ///
    /// A message with no empty line is all headers and has an empty body.
    #[must_use]
    pub fn parse(raw: &[u8]) -> Self {
        let (header_block, body) = split_header_block(raw);
        Self {
            headers: Headers::parse(&String::from_utf8_lossy(header_block)),
            body: body.to_vec(),
        }
    }

    /// Returns the body positioned after the header block.
    ///
    /// `&[u8]` implements [`std::io::Read`], so the result can be handed
    /// directly to [`MimeWalker::walk`](crate::MimeWalker::walk).
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }
}

/// One MIME entity: its own headers and the raw bytes following them.
#[derive(Debug, Clone)]
pub struct Segment<'a> {
    /// Segment headers.
    pub headers: Headers,
    /// Raw body bytes, still transfer-encoded.
    pub body: &'a [u8],
}

impl<'a> Segment<'a> {
    /// Creates a segment from already separated headers and body.
    #[must_use]
    pub const fn new(headers: Headers, body: &'a [u8]) -> Self {
        Self { headers, body }
    }

    /// Parses a multipart child: headers, an empty line, then the body.
    ///
    /// A child whose first line is not a header has no header block and is
    /// all body.
    #[must_use]
    pub fn parse(raw: &'a [u8]) -> Self {
        let (header_block, body) = split_header_block(raw);
        Self::new(Headers::parse(&String::from_utf8_lossy(header_block)), body)
    }

    /// Gets the content type, defaulting to `text/plain; charset=us-ascii`.
    ///
    /// # Errors
    ///
    /// Returns an error if the Content-Type header is malformed.
    pub fn content_type(&self) -> Result<ContentType> {
        ContentType::from_header(self.headers.get("content-type"))
    }

    /// Gets the declared transfer encoding, if any.
    #[must_use]
    pub fn transfer_encoding(&self) -> Option<TransferEncoding> {
        self.headers
            .get("content-transfer-encoding")
            .map(TransferEncoding::parse)
    }

    /// Gets the Content-ID without its angle bracket delimiters.
    #[must_use]
    pub fn content_id(&self) -> Option<String> {
        let value = self.headers.get("content-id")?.trim();
        let value = value.strip_prefix('<').unwrap_or(value);
        let value = value.strip_suffix('>').unwrap_or(value).trim();
        (!value.is_empty()).then(|| value.to_string())
    }

    /// Returns [`Disposition::Inline`] only if Content-Disposition starts
    /// with `inline`.
    #[must_use]
    pub fn disposition(&self) -> Disposition {
        match self.headers.get("content-disposition") {
            Some(value) if value.trim_start().to_lowercase().starts_with("inline") => {
                Disposition::Inline
            }
            _ => Disposition::Attachment,
        }
    }

    /// Gets the declared file name: the Content-Type `name` parameter, then
    /// the Content-Disposition `filename` parameter.
    ///
    /// Empty values count as absent. RFC 2231 extended and continued names
    /// and RFC 2047 encoded words are decoded.
    #[must_use]
    pub fn filename(&self, content_type: &ContentType) -> Option<String> {
        let declared = content_type
            .parameter("name")
            .map(ToString::to_string)
            .filter(|name| !name.trim().is_empty())
            .or_else(|| self.disposition_filename())?;

        Some(decode_rfc2047(&declared).unwrap_or(declared))
    }

    fn disposition_filename(&self) -> Option<String> {
        let value = self.headers.get("content-disposition")?;
        let (_, params) = value.split_once(';')?;
        parse_parameters(params)
            .ok()?
            .remove("filename")
            .filter(|name| !name.trim().is_empty())
    }
}

/// Splits raw bytes at the first empty line into header block and body.
fn split_header_block(raw: &[u8]) -> (&[u8], &[u8]) {
    let mut pos = 0;

    while pos < raw.len() {
        let line_end = raw[pos..]
            .iter()
            .position(|&b| b == b'\n')
            .map_or(raw.len(), |i| pos + i + 1);
        let line = &raw[pos..line_end];

        if line == b"\r\n" || line == b"\n" {
            return (&raw[..pos], &raw[line_end..]);
        }
        if pos == 0 && !starts_with_field_name(line) {
            return (&[], raw);
        }

        pos = line_end;
    }

    (raw, &[])
}

fn starts_with_field_name(line: &[u8]) -> bool {
    line.iter()
        .position(|&b| b == b':')
        .is_some_and(|colon| colon > 0 && line[..colon].iter().all(u8::is_ascii_graphic))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_transfer_encoding_parse() {
        assert_eq!(TransferEncoding::parse("7bit"), TransferEncoding::SevenBit);
        assert_eq!(TransferEncoding::parse(" BASE64 "), TransferEncoding::Base64);
        assert_eq!(
            TransferEncoding::parse("quoted-printable"),
            TransferEncoding::QuotedPrintable
        );
        assert_eq!(TransferEncoding::parse("x-uuencode"), TransferEncoding::SevenBit);
    }

    #[test]
    fn test_raw_message_parse() {
        let message = RawMessage::parse(b"Subject: Hi\r\nTo: a@b.c\r\n\r\nBody\r\n\r\nMore");
        assert_eq!(message.headers.get("subject"), Some("Hi"));
        assert_eq!(message.body(), b"Body\r\n\r\nMore");
    }

    #[test]
    fn test_raw_message_lf_only() {
        let message = RawMessage::parse(b"Subject: Hi\n\nBody");
        assert_eq!(message.headers.get("subject"), Some("Hi"));
        assert_eq!(message.body(), b"Body");
    }

    #[test]
    fn test_raw_message_headers_only() {
        let message = RawMessage::parse(b"Subject: Hi\r\n");
        assert_eq!(message.headers.get("subject"), Some("Hi"));
        assert!(message.body().is_empty());
    }

    #[test]
    fn test_segment_without_headers() {
        let segment = Segment::parse(b"\r\nJust a body");
        assert!(segment.headers.is_empty());
        assert_eq!(segment.body, b"Just a body");

        let segment = Segment::parse(b"no header here\r\nsecond line");
        assert!(segment.headers.is_empty());
        assert_eq!(segment.body, b"no header here\r\nsecond line");
    }

    #[test]
    fn test_segment_content_type_default() {
        let segment = Segment::parse(b"\r\nhello");
        assert_eq!(segment.content_type().unwrap(), ContentType::implicit());
        assert_eq!(segment.transfer_encoding(), None);
    }

    #[test]
    fn test_content_id() {
        let segment = Segment::parse(b"Content-ID: <abc123>\r\n\r\n");
        assert_eq!(segment.content_id().as_deref(), Some("abc123"));

        let segment = Segment::parse(b"Content-Id: plain-id\r\n\r\n");
        assert_eq!(segment.content_id().as_deref(), Some("plain-id"));

        let segment = Segment::parse(b"Content-Id: <>\r\n\r\n");
        assert_eq!(segment.content_id(), None);
    }

    #[test]
    fn test_disposition() {
        let segment = Segment::parse(b"Content-Disposition: inline; filename=x.png\r\n\r\n");
        assert_eq!(segment.disposition(), Disposition::Inline);

        let segment = Segment::parse(b"Content-Disposition: attachment; filename=inline.png\r\n\r\n");
        assert_eq!(segment.disposition(), Disposition::Attachment);

        let segment = Segment::parse(b"\r\n");
        assert_eq!(segment.disposition(), Disposition::Attachment);
    }

    #[test]
    fn test_filename_lookup_order() {
        let segment = Segment::parse(
            b"Content-Type: image/png; name=\"from-type.png\"\r\n\
              Content-Disposition: inline; filename=\"from-disposition.png\"\r\n\r\n",
        );
        let ct = segment.content_type().unwrap();
        assert_eq!(segment.filename(&ct).as_deref(), Some("from-type.png"));

        let segment = Segment::parse(
            b"Content-Type: image/png\r\nContent-Disposition: inline; filename=x.png\r\n\r\n",
        );
        let ct = segment.content_type().unwrap();
        assert_eq!(segment.filename(&ct).as_deref(), Some("x.png"));

        let segment = Segment::parse(b"Content-Type: image/png; name=\"\"\r\n\r\n");
        let ct = segment.content_type().unwrap();
        assert_eq!(segment.filename(&ct), None);
    }

    #[test]
    fn test_filename_encoded_word() {
        let segment =
            Segment::parse(b"Content-Type: application/pdf; name=\"=?utf-8?B?w6l0w6kucGRm?=\"\r\n\r\n");
        let ct = segment.content_type().unwrap();
        assert_eq!(segment.filename(&ct).as_deref(), Some("été.pdf"));
    }

    #[test]
    fn test_filename_extended_parameters() {
        let segment = Segment::parse(
            b"Content-Type: application/pdf\r\n\
              Content-Disposition: attachment; filename*=UTF-8''%E2%82%AC-report.pdf\r\n\r\n",
        );
        let ct = segment.content_type().unwrap();
        assert_eq!(segment.filename(&ct).as_deref(), Some("€-report.pdf"));

        let segment = Segment::parse(
            b"Content-Type: application/pdf;\r\n name*0=\"invoice\";\r\n name*1=\".pdf\"\r\n\r\n",
        );
        let ct = segment.content_type().unwrap();
        assert_eq!(segment.filename(&ct).as_deref(), Some("invoice.pdf"));
    }
}
