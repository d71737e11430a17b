//! MIME content type handling and part classification.

use crate::encoding::decode_charset;
use crate::error::{Error, Result};
use std::collections::BTreeMap;

/// Characters that may not appear in an RFC 2045 token.
const TSPECIALS: &str = "()<>@,;:\\\"/[]?=";

/// MIME content type with parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentType {
    /// Main type (e.g., "text", "image", "multipart").
    pub main_type: String,
    /// Subtype (e.g., "plain", "html", "jpeg").
    pub sub_type: String,
    /// Parameters keyed by lowercase name (e.g., charset=utf-8, boundary=xxx).
    pub parameters: BTreeMap<String, String>,
}

/// How a body segment is treated by the walker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartKind {
    /// Nested multipart body split on `boundary`.
    Container {
        /// Delimiter between child parts.
        boundary: String,
    },
    /// Rendered as string content.
    Text,
    /// Carried as a binary attachment.
    Opaque,
}

impl ContentType {
    /// Creates a new content type.
    #[must_use]
    pub fn new(main_type: impl Into<String>, sub_type: impl Into<String>) -> Self {
        Self {
            main_type: main_type.into(),
            sub_type: sub_type.into(),
            parameters: BTreeMap::new(),
        }
    }

    /// The type assumed for a part without a Content-Type header
    /// (`text/plain; charset=us-ascii`, RFC 2045 section 5.2).
    #[must_use]
    pub fn implicit() -> Self {
        Self::new("text", "plain").with_parameter("charset", "us-ascii")
    }

    /// Adds a parameter.
    #[must_use]
    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    /// Returns a parameter by (lowercase) name.
    #[must_use]
    pub fn parameter(&self, key: &str) -> Option<&str> {
        self.parameters.get(key).map(String::as_str)
    }

    /// Returns the charset parameter if present.
    #[must_use]
    pub fn charset(&self) -> Option<&str> {
        self.parameter("charset")
    }

    /// Returns the boundary parameter if present.
    #[must_use]
    pub fn boundary(&self) -> Option<&str> {
        self.parameter("boundary")
    }

    /// Returns the `type/subtype` pair without parameters.
    #[must_use]
    pub fn media_type(&self) -> String {
        format!("{}/{}", self.main_type, self.sub_type)
    }

    /// Checks if this is a multipart content type.
    #[must_use]
    pub fn is_multipart(&self) -> bool {
        self.main_type.eq_ignore_ascii_case("multipart")
    }

    /// Checks if this is a text content type.
    #[must_use]
    pub fn is_text(&self) -> bool {
        self.main_type.eq_ignore_ascii_case("text")
    }

    /// Classifies the part carrying this content type.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingBoundary`] for a multipart type without a
    /// non-empty `boundary` parameter.
    pub fn classify(&self) -> Result<PartKind> {
        if self.is_multipart() {
            return match self.boundary() {
                Some(boundary) if !boundary.is_empty() => Ok(PartKind::Container {
                    boundary: boundary.to_string(),
                }),
                _ => Err(Error::MissingBoundary(self.media_type())),
            };
        }

        if self.is_text() {
            Ok(PartKind::Text)
        } else {
            Ok(PartKind::Opaque)
        }
    }

    /// Resolves the content type of a part from its optional header value.
    ///
    /// An absent header yields [`ContentType::implicit`].
    ///
    /// # Errors
    ///
    /// Returns an error if the header is present but malformed.
    pub fn from_header(value: Option<&str>) -> Result<Self> {
        value.map_or_else(|| Ok(Self::implicit()), Self::parse)
    }

    /// Parses a content type string.
    ///
    /// Format: `type/subtype; param1=value1; param2="quoted value"`
    ///
    /// # Errors
    ///
    /// Returns an error if the format is invalid.
    pub fn parse(s: &str) -> Result<Self> {
        let invalid = |reason: &'static str| Error::InvalidContentType {
            value: s.to_string(),
            reason,
        };

        let (type_str, params) = s.split_once(';').unwrap_or((s, ""));
        let type_str = type_str.trim();
        if type_str.is_empty() {
            return Err(invalid("empty media type"));
        }

        let (main_type, sub_type) = type_str
            .split_once('/')
            .ok_or_else(|| invalid("missing subtype"))?;
        let (main_type, sub_type) = (main_type.trim(), sub_type.trim());

        if !is_token(main_type) {
            return Err(invalid("invalid main type"));
        }
        if !is_token(sub_type) {
            return Err(invalid("invalid subtype"));
        }

        let mut content_type = Self::new(main_type.to_lowercase(), sub_type.to_lowercase());
        content_type.parameters = parse_parameters(params).map_err(invalid)?;

        Ok(content_type)
    }
}

/// Parses a `Content-Disposition` style parameter list (the text after the
/// first `;`).
///
/// Empty parameters (`;;`, trailing `;`) are tolerated. RFC 2231 extended
/// (`name*`) and continued (`name*0`, `name*1*`) parameters are folded into
/// their plain name.
///
/// # Errors
///
/// Returns the reason when a parameter has no `=`, an invalid name, an
/// empty value or an unterminated quoted string.
pub(crate) fn parse_parameters(
    s: &str,
) -> std::result::Result<BTreeMap<String, String>, &'static str> {
    let mut parameters = BTreeMap::new();
    let mut rest = s;

    loop {
        rest = rest.trim_start_matches(|c: char| c == ';' || c.is_ascii_whitespace());
        if rest.is_empty() {
            break;
        }

        let eq = rest.find('=').ok_or("parameter without value")?;
        let key = rest[..eq].trim();
        if !is_token(key) {
            return Err("invalid parameter name");
        }

        rest = rest[eq + 1..].trim_start();
        let (value, remainder) = if let Some(quoted) = rest.strip_prefix('"') {
            parse_quoted(quoted)?
        } else {
            let end = rest.find(';').unwrap_or(rest.len());
            let value = rest[..end].trim();
            if value.is_empty() {
                return Err("empty parameter value");
            }
            (value.to_string(), &rest[end..])
        };

        let remainder_trimmed = remainder.trim_start();
        if !remainder_trimmed.is_empty() && !remainder_trimmed.starts_with(';') {
            return Err("unexpected text after parameter value");
        }

        parameters.insert(key.to_lowercase(), value);
        rest = remainder;
    }

    Ok(merge_extended(parameters))
}

/// Replaces RFC 2231 `name*...` entries by a single decoded `name` entry.
///
/// An extended value overrides a plain parameter of the same name. A value
/// whose charset prefix is malformed is dropped.
fn merge_extended(raw: BTreeMap<String, String>) -> BTreeMap<String, String> {
    let mut parameters = BTreeMap::new();
    let mut extended: BTreeMap<String, BTreeMap<String, String>> = BTreeMap::new();

    for (key, value) in raw {
        match key.split_once('*') {
            Some((name, section)) => {
                extended
                    .entry(name.to_string())
                    .or_default()
                    .insert(section.to_string(), value);
            }
            None => {
                parameters.insert(key, value);
            }
        }
    }

    for (name, sections) in extended {
        let decoded = match sections.get("") {
            Some(value) => decode_extended_value(value),
            None => join_continuations(&sections),
        };
        if let Some(decoded) = decoded {
            parameters.insert(name, decoded);
        }
    }

    parameters
}

/// Decodes `charset'language'percent-encoded-text`.
fn decode_extended_value(value: &str) -> Option<String> {
    let (charset, encoded) = split_charset(value)?;
    Some(decode_charset(charset, &percent_decode(encoded)))
}

/// Concatenates `*0`, `*1`, ... sections in order, stopping at the first gap.
///
/// Sections ending in `*` are percent-encoded; the charset named by `*0*`
/// applies to the joined value.
fn join_continuations(sections: &BTreeMap<String, String>) -> Option<String> {
    let mut charset = None;
    let mut bytes = Vec::new();

    for index in 0.. {
        if let Some(value) = sections.get(&index.to_string()) {
            bytes.extend_from_slice(value.as_bytes());
        } else if let Some(value) = sections.get(&format!("{index}*")) {
            let encoded = if index == 0 {
                let (declared, encoded) = split_charset(value)?;
                charset = declared;
                encoded
            } else {
                value.as_str()
            };
            bytes.extend(percent_decode(encoded));
        } else if index == 0 {
            return None;
        } else {
            break;
        }
    }

    Some(decode_charset(charset, &bytes))
}

/// Splits off the charset and language prefix; the language is ignored.
fn split_charset(value: &str) -> Option<(Option<&str>, &str)> {
    let mut parts = value.splitn(3, '\'');
    let (Some(charset), Some(_language), Some(encoded)) =
        (parts.next(), parts.next(), parts.next())
    else {
        return None;
    };
    Some(((!charset.is_empty()).then_some(charset), encoded))
}

/// Expands `%XX` escapes; a `%` without two hex digits is kept.
fn percent_decode(s: &str) -> Vec<u8> {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        let escaped = if bytes[i] == b'%' {
            s.get(i + 1..i + 3)
                .filter(|hex| hex.bytes().all(|b| b.is_ascii_hexdigit()))
                .and_then(|hex| u8::from_str_radix(hex, 16).ok())
        } else {
            None
        };
        match escaped {
            Some(byte) => {
                out.push(byte);
                i += 3;
            }
            None => {
                out.push(bytes[i]);
                i += 1;
            }
        }
    }

    out
}

/// Reads a quoted string whose opening quote was already consumed.
fn parse_quoted(s: &str) -> std::result::Result<(String, &str), &'static str> {
    let mut value = String::new();
    let mut chars = s.char_indices();

    while let Some((index, ch)) = chars.next() {
        match ch {
            '\\' => {
                if let Some((_, escaped)) = chars.next() {
                    value.push(escaped);
                }
            }
            '"' => return Ok((value, &s[index + 1..])),
            _ => value.push(ch),
        }
    }

    Err("unterminated quoted string")
}

fn is_token(s: &str) -> bool {
    !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_ascii_graphic() && !TSPECIALS.contains(c))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_new() {
        let ct = ContentType::new("text", "plain");
        assert_eq!(ct.main_type, "text");
        assert_eq!(ct.sub_type, "plain");
        assert!(ct.parameters.is_empty());
    }

    #[test]
    fn test_implicit() {
        let ct = ContentType::implicit();
        assert_eq!(ct.media_type(), "text/plain");
        assert_eq!(ct.charset(), Some("us-ascii"));
        assert_eq!(ct.classify().unwrap(), PartKind::Text);
    }

    #[test]
    fn test_content_type_parse() {
        let ct = ContentType::parse("text/plain; charset=utf-8").unwrap();
        assert_eq!(ct.main_type, "text");
        assert_eq!(ct.sub_type, "plain");
        assert_eq!(ct.charset(), Some("utf-8"));
    }

    #[test]
    fn test_content_type_parse_case_insensitive() {
        let ct = ContentType::parse("Multipart/Alternative; BOUNDARY=xyz").unwrap();
        assert_eq!(ct.media_type(), "multipart/alternative");
        assert_eq!(ct.boundary(), Some("xyz"));
    }

    #[test]
    fn test_content_type_parse_quoted() {
        let ct = ContentType::parse("multipart/mixed; boundary=\"----=_Part_123\"").unwrap();
        assert_eq!(ct.main_type, "multipart");
        assert_eq!(ct.sub_type, "mixed");
        assert_eq!(ct.boundary(), Some("----=_Part_123"));
    }

    #[test]
    fn test_content_type_parse_quoted_semicolon() {
        let ct = ContentType::parse("application/pdf; name=\"a;b.pdf\"; x=1").unwrap();
        assert_eq!(ct.parameter("name"), Some("a;b.pdf"));
        assert_eq!(ct.parameter("x"), Some("1"));
    }

    #[test]
    fn test_content_type_parse_trailing_semicolon() {
        let ct = ContentType::parse("text/html;").unwrap();
        assert_eq!(ct.media_type(), "text/html");
        assert!(ct.parameters.is_empty());
    }

    #[test]
    fn test_content_type_parse_errors() {
        for bad in [
            "",
            "text",
            "/plain",
            "text/",
            "text plain/html",
            "text/plain; charset",
            "text/plain; =utf-8",
            "text/plain; name=\"open",
            "text/plain; charset=",
            "text/plain; name=\"a\" junk",
        ] {
            assert!(
                matches!(
                    ContentType::parse(bad),
                    Err(Error::InvalidContentType { .. })
                ),
                "{bad:?} should not parse"
            );
        }
    }

    #[test]
    fn test_classify() {
        let kind = ContentType::parse("multipart/related; boundary=b1")
            .unwrap()
            .classify()
            .unwrap();
        assert_eq!(
            kind,
            PartKind::Container {
                boundary: "b1".to_string()
            }
        );

        for (value, expected) in [
            ("text/html", PartKind::Text),
            ("text/calendar; method=REQUEST", PartKind::Text),
            ("application/pdf", PartKind::Opaque),
            ("image/png", PartKind::Opaque),
            ("x-unknown/thing", PartKind::Opaque),
            ("message/rfc822", PartKind::Opaque),
        ] {
            assert_eq!(
                ContentType::parse(value).unwrap().classify().unwrap(),
                expected,
                "{value}"
            );
        }
    }

    #[test]
    fn test_classify_missing_boundary() {
        let ct = ContentType::parse("multipart/mixed").unwrap();
        assert!(matches!(ct.classify(), Err(Error::MissingBoundary(_))));

        let ct = ContentType::parse("multipart/mixed; boundary=\"\"").unwrap();
        assert!(matches!(ct.classify(), Err(Error::MissingBoundary(_))));
    }

    #[test]
    fn test_from_header_absent() {
        let ct = ContentType::from_header(None).unwrap();
        assert_eq!(ct, ContentType::implicit());
    }

    #[test]
    fn test_extended_parameter() {
        let ct = ContentType::parse("application/pdf; name*=UTF-8''%E2%82%AC-report.pdf").unwrap();
        assert_eq!(ct.parameter("name"), Some("€-report.pdf"));
        assert_eq!(ct.parameter("name*"), None);

        let ct = ContentType::parse("application/pdf; name*=iso-8859-15'de'%A4-bericht.pdf").unwrap();
        assert_eq!(ct.parameter("name"), Some("€-bericht.pdf"));

        let ct = ContentType::parse("application/pdf; name*=utf-8''100%25%+1%2.pdf").unwrap();
        assert_eq!(ct.parameter("name"), Some("100%%+1%2.pdf"));
    }

    #[test]
    fn test_extended_parameter_overrides_plain() {
        let ct = ContentType::parse(
            "application/pdf; name=\"fallback.pdf\"; name*=utf-8''caf%C3%A9.pdf",
        )
        .unwrap();
        assert_eq!(ct.parameter("name"), Some("café.pdf"));
    }

    #[test]
    fn test_continued_parameter() {
        let ct = ContentType::parse("application/pdf; name*0=\"inv\"; name*1=oice; name*2=.pdf").unwrap();
        assert_eq!(ct.parameter("name"), Some("invoice.pdf"));

        let ct = ContentType::parse(
            "application/pdf; name*0*=utf-8''%E2%82%AC; name*1=-report; name*2*=%2Epdf",
        )
        .unwrap();
        assert_eq!(ct.parameter("name"), Some("€-report.pdf"));
        assert_eq!(ct.parameters.len(), 1);
    }

    #[test]
    fn test_continued_parameter_without_first_section_is_dropped() {
        let ct = ContentType::parse("application/pdf; name*1=tail.pdf; x=1").unwrap();
        assert_eq!(ct.parameter("name"), None);
        assert_eq!(ct.parameter("x"), Some("1"));
    }

    #[test]
    fn test_extended_parameter_without_charset_prefix_is_dropped() {
        let ct = ContentType::parse("application/pdf; name=plain.pdf; name*=no-quotes.pdf").unwrap();
        assert_eq!(ct.parameter("name"), Some("plain.pdf"));
    }
}
