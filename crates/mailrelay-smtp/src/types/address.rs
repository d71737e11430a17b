//! Envelope address types.

use crate::error::{Error, Result};

/// Email address from an SMTP envelope path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Address(String);

impl Address {
    /// Creates a new address from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is invalid.
    pub fn new(addr: impl Into<String>) -> Result<Self> {
        let addr = addr.into();
        Self::validate(&addr)?;
        Ok(Self(addr))
    }

    /// Returns the address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Validates an email address (basic validation).
    fn validate(addr: &str) -> Result<()> {
        if addr.is_empty() {
            return Err(Error::InvalidAddress("Address cannot be empty".into()));
        }

        if addr.contains(char::is_whitespace) {
            return Err(Error::InvalidAddress(format!(
                "Address cannot contain whitespace: {addr}"
            )));
        }

        let Some((local, domain)) = addr.rsplit_once('@') else {
            return Err(Error::InvalidAddress(format!(
                "Address must contain @: {addr}"
            )));
        };

        if local.is_empty() || domain.is_empty() {
            return Err(Error::InvalidAddress(
                "Local and domain parts cannot be empty".into(),
            ));
        }

        Ok(())
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Parses an angle-bracketed path (`<user@example.com>`).
///
/// Returns the path and the remaining parameter text. An empty path (`<>`)
/// yields `None`. A source route (`<@a,@b:user@c>`) is discarded.
///
/// # Errors
///
/// Returns an error if the brackets are missing or the address is invalid.
pub fn parse_path(arg: &str) -> Result<(Option<Address>, &str)> {
    let arg = arg.trim_start();
    let inner_start = arg
        .strip_prefix('<')
        .ok_or_else(|| Error::Syntax(format!("Path must be enclosed in <>: {arg}")))?;
    let close = inner_start
        .find('>')
        .ok_or_else(|| Error::Syntax(format!("Unterminated path: {arg}")))?;

    let path = &inner_start[..close];
    let params = &inner_start[close + 1..];

    if path.is_empty() {
        return Ok((None, params));
    }

    let mailbox = if path.starts_with('@') {
        path.split_once(':').map_or(path, |(_, mailbox)| mailbox)
    } else {
        path
    };

    Ok((Some(Address::new(mailbox)?), params))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_address() {
        let addr = Address::new("user@example.com").unwrap();
        assert_eq!(addr.as_str(), "user@example.com");
    }

    #[test]
    fn test_invalid_addresses() {
        assert!(Address::new("userexample.com").is_err());
        assert!(Address::new("").is_err());
        assert!(Address::new("@example.com").is_err());
        assert!(Address::new("user@").is_err());
        assert!(Address::new("us er@example.com").is_err());
    }

    #[test]
    fn test_parse_path() {
        let (addr, params) = parse_path("<user@example.com> SIZE=100").unwrap();
        assert_eq!(addr.unwrap().as_str(), "user@example.com");
        assert_eq!(params, " SIZE=100");
    }

    #[test]
    fn test_parse_null_path() {
        let (addr, params) = parse_path("<>").unwrap();
        assert!(addr.is_none());
        assert!(params.is_empty());
    }

    #[test]
    fn test_parse_source_route() {
        let (addr, _) = parse_path("<@relay.example,@b.example:user@example.com>").unwrap();
        assert_eq!(addr.unwrap().as_str(), "user@example.com");
    }

    #[test]
    fn test_parse_path_errors() {
        assert!(matches!(
            parse_path("user@example.com"),
            Err(Error::Syntax(_))
        ));
        assert!(matches!(parse_path("<user@example.com"), Err(Error::Syntax(_))));
        assert!(matches!(parse_path("<nobody>"), Err(Error::InvalidAddress(_))));
    }
}
