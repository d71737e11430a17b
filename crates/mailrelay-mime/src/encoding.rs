//! MIME encoding and decoding utilities.
//!
//! Supports Base64, Quoted-Printable, RFC 2047 header decoding and charset
//! conversion. [`encode_content`] is the attachment payload encoder used by
//! the walker.

use crate::error::{Error, Result};
use crate::message::TransferEncoding;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Encodes data as Base64.
#[must_use]
pub fn encode_base64(data: &[u8]) -> String {
    STANDARD.encode(data)
}

/// Decodes Base64 data.
///
/// # Errors
///
/// Returns an error if the input is not valid Base64.
pub fn decode_base64(data: &str) -> Result<Vec<u8>> {
    STANDARD.decode(data).map_err(Into::into)
}

/// Removes ASCII whitespace (space, tab, CR, LF, form feed, vertical tab).
#[must_use]
pub fn strip_whitespace(data: &[u8]) -> String {
    data.iter()
        .filter(|b| !b.is_ascii_whitespace() && **b != 0x0b)
        .map(|&b| char::from(b))
        .collect()
}

/// Probes whether `data` is Base64 text, ignoring line breaks only.
fn is_base64(data: &[u8]) -> bool {
    let unwrapped: Vec<u8> = data
        .iter()
        .copied()
        .filter(|b| *b != b'\r' && *b != b'\n')
        .collect();
    STANDARD.decode(unwrapped).is_ok()
}

/// Produces the Base64 payload of an attachment.
///
/// - Declared `base64`: the body already is Base64 text; whitespace is
///   stripped and the rest passed through verbatim, valid or not.
/// - Declared `quoted-printable`: the body is decoded first and the real
///   bytes are encoded.
/// - Anything else, or no header: if the body (line breaks ignored) decodes
///   as Base64 it is assumed to be pre-encoded and passed through stripped,
///   otherwise the raw bytes are encoded.
///
/// Pre-encoded payloads are never encoded twice: one Base64 decode on the
/// receiving side yields the original bytes.
#[must_use]
pub fn encode_content(encoding: Option<TransferEncoding>, raw: &[u8]) -> String {
    match encoding {
        Some(TransferEncoding::Base64) => strip_whitespace(raw),
        Some(TransferEncoding::QuotedPrintable) => encode_base64(&decode_quoted_printable(raw)),
        _ => encode_probed(raw),
    }
}

fn encode_probed(raw: &[u8]) -> String {
    if is_base64(raw) {
        strip_whitespace(raw)
    } else {
        encode_base64(raw)
    }
}

/// Undoes the declared transfer encoding of a text part.
///
/// Base64 bodies that fail to decode are returned unchanged.
#[must_use]
pub fn decode_transfer(encoding: Option<TransferEncoding>, raw: &[u8]) -> Vec<u8> {
    match encoding {
        Some(TransferEncoding::Base64) => {
            decode_base64(&strip_whitespace(raw)).unwrap_or_else(|_| raw.to_vec())
        }
        Some(TransferEncoding::QuotedPrintable) => decode_quoted_printable(raw),
        _ => raw.to_vec(),
    }
}

/// Decodes bytes using a named charset.
///
/// Absent, ASCII and UTF-8 charsets are read as UTF-8; unknown labels fall
/// back to lossy UTF-8.
#[must_use]
pub fn decode_charset(charset: Option<&str>, bytes: &[u8]) -> String {
    let label = charset.map(|c| c.trim().to_lowercase());
    match label.as_deref() {
        None | Some("utf-8" | "utf8" | "us-ascii" | "ascii") => {
            String::from_utf8_lossy(bytes).into_owned()
        }
        Some(label) => encoding_rs::Encoding::for_label(label.as_bytes()).map_or_else(
            || String::from_utf8_lossy(bytes).into_owned(),
            |encoding| encoding.decode(bytes).0.into_owned(),
        ),
    }
}

/// Decodes Quoted-Printable data (RFC 2045).
///
/// Trailing spaces and tabs are dropped from every line, so padding before a
/// soft line break disappears with it. An `=` that does not start a valid
/// escape is kept as a literal character.
#[must_use]
pub fn decode_quoted_printable(data: &[u8]) -> Vec<u8> {
    let mut result = Vec::with_capacity(data.len());

    for line in data.split_inclusive(|&b| b == b'\n') {
        let (content, line_break) = split_line_break(line);
        let content = trim_trailing_blanks(content);

        match content.strip_suffix(b"=") {
            // Soft line break
            Some(content) => decode_escapes(content, &mut result),
            None => {
                decode_escapes(content, &mut result);
                result.extend_from_slice(line_break);
            }
        }
    }

    result
}

fn split_line_break(line: &[u8]) -> (&[u8], &[u8]) {
    let content_len = line
        .strip_suffix(b"\r\n")
        .or_else(|| line.strip_suffix(b"\n"))
        .map_or(line.len(), <[u8]>::len);
    line.split_at(content_len)
}

fn trim_trailing_blanks(mut content: &[u8]) -> &[u8] {
    while let [rest @ .., b' ' | b'\t'] = content {
        content = rest;
    }
    content
}

/// Expands `=XX` escapes into `out`; anything else is copied verbatim.
fn decode_escapes(data: &[u8], out: &mut Vec<u8>) {
    let mut i = 0;
    while i < data.len() {
        if data[i] == b'=' {
            let high = data.get(i + 1).copied().and_then(hex_value);
            let low = data.get(i + 2).copied().and_then(hex_value);
            if let (Some(high), Some(low)) = (high, low) {
                out.push((high << 4) | low);
                i += 3;
                continue;
            }
        }
        out.push(data[i]);
        i += 1;
    }
}

fn hex_value(byte: u8) -> Option<u8> {
    char::from(byte)
        .to_digit(16)
        .and_then(|digit| u8::try_from(digit).ok())
}

/// Decodes RFC 2047 encoded words in a header value.
///
/// Format: `=?charset?encoding?encoded-text?=`. Whitespace between two
/// adjacent encoded words is dropped; plain text is kept as is.
///
/// # Errors
///
/// Returns an error if an encoded word uses an unknown encoding or its
/// payload cannot be decoded.
pub fn decode_rfc2047(text: &str) -> Result<String> {
    let mut result = String::new();
    let mut rest = text;
    let mut previous_was_word = false;

    while let Some(start) = rest.find("=?") {
        let Some((word, consumed)) = split_encoded_word(&rest[start..]) else {
            result.push_str(&rest[..start + 2]);
            rest = &rest[start + 2..];
            previous_was_word = false;
            continue;
        };

        let between = &rest[..start];
        if !(previous_was_word && between.trim().is_empty()) {
            result.push_str(between);
        }

        result.push_str(&decode_encoded_word(word)?);
        rest = &rest[start + consumed..];
        previous_was_word = true;
    }

    result.push_str(rest);
    Ok(result)
}

/// Returns the inner `charset?enc?text` of a leading encoded word and the
/// number of bytes it spans.
fn split_encoded_word(s: &str) -> Option<(&str, usize)> {
    let inner = s.strip_prefix("=?")?;
    let charset_end = inner.find('?')?;
    let encoding_end = charset_end + 1 + inner[charset_end + 1..].find('?')?;
    let text_end = encoding_end + 1 + inner[encoding_end + 1..].find("?=")?;
    Some((&inner[..text_end], text_end + 4))
}

fn decode_encoded_word(word: &str) -> Result<String> {
    let mut parts = word.splitn(3, '?');
    let (Some(charset), Some(encoding), Some(encoded_text)) =
        (parts.next(), parts.next(), parts.next())
    else {
        return Err(Error::InvalidEncoding(
            "Invalid RFC 2047 format".to_string(),
        ));
    };

    // RFC 2231 language suffix: charset*lang
    let charset = charset.split('*').next().unwrap_or(charset);

    let bytes = match encoding.to_uppercase().as_str() {
        "B" => decode_base64(encoded_text)?,
        // Quoted-Printable with underscore for space
        "Q" => {
            let mut bytes = Vec::with_capacity(encoded_text.len());
            decode_escapes(encoded_text.replace('_', " ").as_bytes(), &mut bytes);
            bytes
        }
        other => {
            return Err(Error::InvalidEncoding(format!(
                "Unknown encoding: {other}"
            )));
        }
    };

    Ok(decode_charset(Some(charset), &bytes))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_base64_encode_decode() {
        let data = b"Hello, World!";
        let encoded = encode_base64(data);
        assert_eq!(encoded, "SGVsbG8sIFdvcmxkIQ==");

        let decoded = decode_base64(&encoded).unwrap();
        assert_eq!(decoded, data);
    }

    #[test]
    fn test_strip_whitespace() {
        assert_eq!(strip_whitespace(b" SGVs\r\n\tbG8=\n"), "SGVsbG8=");
    }

    #[test]
    fn test_encode_content_declared_base64_passthrough() {
        let raw = b"SGVsbG8s\r\nIFdvcmxkIQ==\r\n";
        let content = encode_content(Some(TransferEncoding::Base64), raw);
        assert_eq!(content, "SGVsbG8sIFdvcmxkIQ==");
    }

    #[test]
    fn test_encode_content_declared_base64_invalid_still_verbatim() {
        let content = encode_content(Some(TransferEncoding::Base64), b"not base64 !!");
        assert_eq!(content, "notbase64!!");
    }

    #[test]
    fn test_encode_content_undeclared_base64_probe() {
        let raw = b"SGVsbG8sIFdvcmxkIQ==\r\n";
        let content = encode_content(None, raw);
        assert_eq!(content, "SGVsbG8sIFdvcmxkIQ==");
        assert_eq!(decode_base64(&content).unwrap(), b"Hello, World!");
    }

    #[test]
    fn test_encode_content_binary() {
        let raw = [0x89, b'P', b'N', b'G', 0x00, 0xff];
        let content = encode_content(None, &raw);
        assert_eq!(decode_base64(&content).unwrap(), raw);
    }

    #[test]
    fn test_encode_content_text_with_spaces_is_encoded() {
        // Spaces are not ignored by the probe, so prose is never mistaken for Base64
        let content = encode_content(Some(TransferEncoding::SevenBit), b"ab cd");
        assert_eq!(decode_base64(&content).unwrap(), b"ab cd");
    }

    #[test]
    fn test_encode_content_quoted_printable() {
        let content = encode_content(Some(TransferEncoding::QuotedPrintable), b"H=C3=A9llo=\r\n!");
        assert_eq!(decode_base64(&content).unwrap(), "Héllo!".as_bytes());
    }

    #[test]
    fn test_decode_transfer() {
        assert_eq!(
            decode_transfer(Some(TransferEncoding::Base64), b"SGVs\r\nbG8="),
            b"Hello"
        );
        assert_eq!(
            decode_transfer(Some(TransferEncoding::QuotedPrintable), b"a=3Db"),
            b"a=b"
        );
        assert_eq!(decode_transfer(None, b"plain"), b"plain");
        assert_eq!(
            decode_transfer(Some(TransferEncoding::Base64), b"%%%"),
            b"%%%"
        );
    }

    #[test]
    fn test_decode_charset() {
        assert_eq!(decode_charset(None, "Héllo".as_bytes()), "Héllo");
        assert_eq!(decode_charset(Some("ISO-8859-1"), &[0x48, 0xe9]), "Hé");
        assert_eq!(decode_charset(Some("x-bogus"), b"abc"), "abc");
    }

    #[test]
    fn test_quoted_printable_decode() {
        let decoded = decode_quoted_printable(b"Hello, World!");
        assert_eq!(decoded, b"Hello, World!");

        let decoded = decode_quoted_printable(b"H=C3=A9llo");
        assert_eq!(decoded, "Héllo".as_bytes());
    }

    #[test]
    fn test_quoted_printable_soft_line_break() {
        let decoded = decode_quoted_printable(b"Hello=\r\nWorld=\nAgain");
        assert_eq!(decoded, b"HelloWorldAgain");
    }

    #[test]
    fn test_quoted_printable_padding_before_soft_break() {
        let decoded = decode_quoted_printable(b"caf=C3=A9 soft=  \r\nbreak");
        assert_eq!(decoded, "café softbreak".as_bytes());

        let decoded = decode_quoted_printable(b"tab=\t\nbed");
        assert_eq!(decoded, b"tabbed");
    }

    #[test]
    fn test_quoted_printable_hard_break_drops_padding() {
        let decoded = decode_quoted_printable(b"line one  \r\nline two\t\n");
        assert_eq!(decoded, b"line one\r\nline two\n");
    }

    #[test]
    fn test_quoted_printable_stray_equals_is_literal() {
        assert_eq!(decode_quoted_printable(b"bad=Z1"), b"bad=Z1");
        assert_eq!(decode_quoted_printable(b"short=4"), b"short=4");

        let decoded = decode_quoted_printable(b"caf=C3=A9 costs 5=EUR");
        assert_eq!(decoded, "café costs 5=EUR".as_bytes());
    }

    #[test]
    fn test_decode_transfer_quoted_printable_keeps_good_escapes() {
        let decoded = decode_transfer(
            Some(TransferEncoding::QuotedPrintable),
            b"caf=C3=A9 costs 5=EUR",
        );
        assert_eq!(decoded, "café costs 5=EUR".as_bytes());
    }

    #[test]
    fn test_rfc2047_decode() {
        assert_eq!(decode_rfc2047("Hello").unwrap(), "Hello");
        assert_eq!(decode_rfc2047("=?utf-8?B?SMOpbGxv?=").unwrap(), "Héllo");
    }

    #[test]
    fn test_rfc2047_quoted_printable() {
        let decoded = decode_rfc2047("=?utf-8?Q?H=C3=A9llo_there?=").unwrap();
        assert_eq!(decoded, "Héllo there");
    }

    #[test]
    fn test_rfc2047_mixed_and_adjacent_words() {
        let decoded = decode_rfc2047("Re: =?utf-8?Q?caf=C3=A9?= =?iso-8859-1?Q?_ol=E9?= !").unwrap();
        assert_eq!(decoded, "Re: café olé !");
    }

    #[test]
    fn test_rfc2047_unknown_encoding() {
        assert!(decode_rfc2047("=?utf-8?X?abc?=").is_err());
    }
}
