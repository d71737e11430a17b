//! Address list parsing (RFC 5322 §3.4).

use mailrelay_mime::encoding::decode_rfc2047;

/// Why an address list header could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressError {
    /// A list entry between commas was empty.
    #[error("empty address in list")]
    EmptyEntry,
    /// A quoted string was never closed.
    #[error("unterminated quoted string")]
    UnterminatedQuote,
    /// A comment was never closed.
    #[error("unterminated comment")]
    UnterminatedComment,
    /// A group (`name: a@b, c@d;`) was never closed.
    #[error("unterminated group")]
    UnterminatedGroup,
    /// Angle brackets do not pair up.
    #[error("unbalanced '{0}'")]
    Unbalanced(char),
    /// The display name contains characters that must be quoted.
    #[error("invalid display name: {0}")]
    InvalidName(String),
    /// The address itself is malformed.
    #[error("invalid address: {0}")]
    InvalidAddress(String),
}

/// A mailbox: optional display name and bare address.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EmailAddress {
    /// Display name, decoded from RFC 2047 if needed.
    pub name: Option<String>,
    /// Bare `local@domain` address.
    pub address: String,
}

impl EmailAddress {
    /// Creates an address without a display name.
    #[must_use]
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            name: None,
            address: address.into(),
        }
    }

    /// Creates an address with a display name.
    #[must_use]
    pub fn with_name(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            address: address.into(),
        }
    }
}

impl std::fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.name {
            Some(name) => {
                let escaped = name.replace('\\', "\\\\").replace('"', "\\\"");
                write!(f, "\"{escaped}\" <{}>", self.address)
            }
            None => write!(f, "{}", self.address),
        }
    }
}

/// Parses a comma-separated address list header value.
///
/// Supports quoted display names, `(comments)`, angle addresses and groups;
/// group members are flattened into the result. A bare address followed by
/// a comment, as in `a@b.com (Alice)`, takes the comment as its name. An empty or blank value is
/// an empty list.
///
/// # Errors
///
/// Any malformed entry fails the whole list.
pub fn parse_address_list(value: &str) -> Result<Vec<EmailAddress>, AddressError> {
    if value.trim().is_empty() {
        return Ok(Vec::new());
    }

    let mut addresses = Vec::new();
    for entry in split_entries(value)? {
        let text = entry.text.trim();
        if text.is_empty() {
            if entry.optional {
                continue;
            }
            return Err(AddressError::EmptyEntry);
        }
        addresses.push(parse_mailbox(text, entry.comment.as_deref())?);
    }

    Ok(addresses)
}

/// One list entry; blank optional entries come from group syntax.
struct Entry {
    text: String,
    /// First comment that follows some entry text.
    comment: Option<String>,
    optional: bool,
}

fn split_entries(value: &str) -> Result<Vec<Entry>, AddressError> {
    let mut entries = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut in_angle = false;
    let mut comment_depth = 0usize;
    let mut comment = String::new();
    let mut comment_trails = false;
    let mut trailing_comment: Option<String> = None;
    let mut in_group = false;
    let mut group_closed = false;
    let mut chars = value.chars();

    while let Some(ch) = chars.next() {
        if comment_depth > 0 {
            match ch {
                '\\' => {
                    if let Some(escaped) = chars.next() {
                        comment.push(escaped);
                    }
                    continue;
                }
                '(' => comment_depth += 1,
                ')' => comment_depth -= 1,
                _ => {}
            }
            if comment_depth > 0 {
                comment.push(ch);
            } else {
                let text = std::mem::take(&mut comment);
                if comment_trails && trailing_comment.is_none() {
                    trailing_comment = Some(text);
                }
            }
            continue;
        }

        if in_quotes {
            current.push(ch);
            match ch {
                '\\' => {
                    if let Some(escaped) = chars.next() {
                        current.push(escaped);
                    }
                }
                '"' => in_quotes = false,
                _ => {}
            }
            continue;
        }

        match ch {
            '"' => {
                in_quotes = true;
                current.push(ch);
            }
            '(' => {
                comment_depth = 1;
                comment_trails = !current.trim().is_empty();
                current.push(' ');
            }
            '<' if in_angle => return Err(AddressError::Unbalanced('<')),
            '<' => {
                in_angle = true;
                current.push(ch);
            }
            '>' if !in_angle => return Err(AddressError::Unbalanced('>')),
            '>' => {
                in_angle = false;
                current.push(ch);
            }
            ',' if !in_angle => {
                entries.push(Entry {
                    text: std::mem::take(&mut current),
                    comment: trailing_comment.take(),
                    optional: in_group || group_closed,
                });
                group_closed = false;
            }
            ':' if !in_angle && !in_group && !group_closed => {
                // Group display name
                current.clear();
                trailing_comment = None;
                in_group = true;
            }
            ';' if !in_angle && in_group => {
                entries.push(Entry {
                    text: std::mem::take(&mut current),
                    comment: trailing_comment.take(),
                    optional: true,
                });
                in_group = false;
                group_closed = true;
            }
            _ => current.push(ch),
        }
    }

    if in_quotes {
        return Err(AddressError::UnterminatedQuote);
    }
    if comment_depth > 0 {
        return Err(AddressError::UnterminatedComment);
    }
    if in_angle {
        return Err(AddressError::Unbalanced('<'));
    }
    if in_group {
        return Err(AddressError::UnterminatedGroup);
    }

    entries.push(Entry {
        text: current,
        comment: trailing_comment,
        optional: group_closed,
    });
    Ok(entries)
}

fn parse_mailbox(text: &str, comment: Option<&str>) -> Result<EmailAddress, AddressError> {
    let Some(inner) = text.strip_suffix('>') else {
        if text.contains('<') || text.contains('"') {
            return Err(AddressError::InvalidAddress(text.to_string()));
        }
        validate_addr_spec(text)?;
        return Ok(EmailAddress {
            name: comment.and_then(comment_name),
            address: text.to_string(),
        });
    };

    let open = find_unquoted(inner, '<')
        .ok_or_else(|| AddressError::InvalidAddress(text.to_string()))?;
    let address = inner[open + 1..].trim();
    validate_addr_spec(address)?;

    Ok(EmailAddress {
        name: parse_display_name(inner[..open].trim())?,
        address: address.to_string(),
    })
}

fn parse_display_name(phrase: &str) -> Result<Option<String>, AddressError> {
    let mut name = String::new();
    let mut in_quotes = false;
    let mut chars = phrase.chars();

    while let Some(ch) = chars.next() {
        match ch {
            '"' => in_quotes = !in_quotes,
            '\\' if in_quotes => {
                if let Some(escaped) = chars.next() {
                    name.push(escaped);
                }
            }
            '@' | '<' | '>' | ',' | ';' | ':' | '[' | ']' if !in_quotes => {
                return Err(AddressError::InvalidName(phrase.to_string()));
            }
            _ => name.push(ch),
        }
    }

    let collapsed = name.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        return Ok(None);
    }
    Ok(Some(decode_rfc2047(&collapsed).unwrap_or(collapsed)))
}

/// Display name taken from a comment; RFC 2047 words are decoded.
fn comment_name(comment: &str) -> Option<String> {
    let collapsed = comment.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        return None;
    }
    Some(decode_rfc2047(&collapsed).unwrap_or(collapsed))
}

fn find_unquoted(s: &str, needle: char) -> Option<usize> {
    let mut in_quotes = false;
    let mut escaped = false;

    for (index, ch) in s.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' if in_quotes => escaped = true,
            '"' => in_quotes = !in_quotes,
            c if c == needle && !in_quotes => return Some(index),
            _ => {}
        }
    }

    None
}

/// Validates `local@domain`.
fn validate_addr_spec(spec: &str) -> Result<(), AddressError> {
    let invalid = || AddressError::InvalidAddress(spec.to_string());

    let at = spec.rfind('@').ok_or_else(invalid)?;
    let (local, domain) = (&spec[..at], &spec[at + 1..]);

    let local_ok = if local.len() >= 2 && local.starts_with('"') && local.ends_with('"') {
        true
    } else {
        is_dot_atom(local, |c| {
            c.is_ascii_alphanumeric() || "!#$%&'*+-/=?^_`{|}~".contains(c) || !c.is_ascii()
        })
    };

    let domain_ok = if domain.starts_with('[') && domain.ends_with(']') {
        !domain.contains(char::is_whitespace)
    } else {
        is_dot_atom(domain, |c| {
            c.is_ascii_alphanumeric() || c == '-' || !c.is_ascii()
        })
    };

    if local_ok && domain_ok {
        Ok(())
    } else {
        Err(invalid())
    }
}

fn is_dot_atom(s: &str, allowed: impl Fn(char) -> bool) -> bool {
    !s.is_empty()
        && s.split('.')
            .all(|atom| !atom.is_empty() && atom.chars().all(&allowed))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bare_address() {
        let list = parse_address_list("user@example.com").unwrap();
        assert_eq!(list, vec![EmailAddress::new("user@example.com")]);
    }

    #[test]
    fn test_parse_name_and_address() {
        let list = parse_address_list("User One <user1@example.com>").unwrap();
        assert_eq!(list[0].name.as_deref(), Some("User One"));
        assert_eq!(list[0].address, "user1@example.com");
    }

    #[test]
    fn test_parse_quoted_name_with_comma() {
        let list = parse_address_list("\"Last, First\" <a@b.com>, other@c.com").unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].name.as_deref(), Some("Last, First"));
        assert_eq!(list[1], EmailAddress::new("other@c.com"));
    }

    #[test]
    fn test_parse_encoded_name() {
        let list = parse_address_list("=?UTF-8?Q?Jos=C3=A9?= <jose@example.com>").unwrap();
        assert_eq!(list[0].name.as_deref(), Some("José"));
    }

    #[test]
    fn test_parse_comment_names_bare_address() {
        let list = parse_address_list("a@b.com (work), <c@d.com>").unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0], EmailAddress::with_name("work", "a@b.com"));
        assert_eq!(list[1].name, None);

        let list = parse_address_list("jose@example.com (=?UTF-8?Q?Jos=C3=A9?=  P.)").unwrap();
        assert_eq!(list[0].name.as_deref(), Some("José P."));
    }

    #[test]
    fn test_parse_comment_does_not_replace_phrase() {
        let list = parse_address_list("Alice <a@b.com> (home)").unwrap();
        assert_eq!(list[0].name.as_deref(), Some("Alice"));

        let list = parse_address_list("(leading) a@b.com, c@d.com ( )").unwrap();
        assert_eq!(list[0].name, None);
        assert_eq!(list[1].name, None);
    }

    #[test]
    fn test_parse_group_is_flattened() {
        let list = parse_address_list("Team: a@b.com, c@d.com;, e@f.com").unwrap();
        let addresses: Vec<_> = list.iter().map(|a| a.address.as_str()).collect();
        assert_eq!(addresses, vec!["a@b.com", "c@d.com", "e@f.com"]);

        assert!(parse_address_list("undisclosed-recipients:;").unwrap().is_empty());
    }

    #[test]
    fn test_parse_blank_is_empty() {
        assert!(parse_address_list("   ").unwrap().is_empty());
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            parse_address_list("a@b.com,,c@d.com"),
            Err(AddressError::EmptyEntry)
        );
        assert_eq!(
            parse_address_list("\"open <a@b.com>"),
            Err(AddressError::UnterminatedQuote)
        );
        assert_eq!(
            parse_address_list("Name <a@b.com"),
            Err(AddressError::Unbalanced('<'))
        );
        assert_eq!(
            parse_address_list("Team: a@b.com"),
            Err(AddressError::UnterminatedGroup)
        );
        assert!(matches!(
            parse_address_list("not an address"),
            Err(AddressError::InvalidAddress(_))
        ));
        assert!(matches!(
            parse_address_list("user@"),
            Err(AddressError::InvalidAddress(_))
        ));
        assert!(matches!(
            parse_address_list("a@b@ <x@y.com>"),
            Err(AddressError::InvalidName(_))
        ));
    }

    #[test]
    fn test_display() {
        assert_eq!(EmailAddress::new("a@b.com").to_string(), "a@b.com");
        assert_eq!(
            EmailAddress::with_name("Alice \"A\"", "a@b.com").to_string(),
            "\"Alice \\\"A\\\"\" <a@b.com>"
        );
    }
}
