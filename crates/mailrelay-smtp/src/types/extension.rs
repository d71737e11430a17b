//! SMTP extension types.

use std::fmt;

/// SMTP extensions advertised in the EHLO response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Extension {
    /// SIZE - Maximum message size
    Size(usize),
    /// 8BITMIME - 8-bit MIME transport
    EightBitMime,
    /// PIPELINING - Command pipelining
    Pipelining,
}

impl fmt::Display for Extension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Size(max) => write!(f, "SIZE {max}"),
            Self::EightBitMime => f.write_str("8BITMIME"),
            Self::Pipelining => f.write_str("PIPELINING"),
        }
    }
}

/// Message body type declared with the `BODY=` parameter of MAIL FROM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BodyType {
    /// 7BIT
    #[default]
    SevenBit,
    /// 8BITMIME
    EightBitMime,
}

impl BodyType {
    /// Parses a `BODY=` value.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "7BIT" => Some(Self::SevenBit),
            "8BITMIME" => Some(Self::EightBitMime),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Extension::Size(1024).to_string(), "SIZE 1024");
        assert_eq!(Extension::EightBitMime.to_string(), "8BITMIME");
        assert_eq!(Extension::Pipelining.to_string(), "PIPELINING");
    }

    #[test]
    fn test_body_type() {
        assert_eq!(BodyType::parse("8bitmime"), Some(BodyType::EightBitMime));
        assert_eq!(BodyType::parse("7BIT"), Some(BodyType::SevenBit));
        assert_eq!(BodyType::parse("BINARYMIME"), None);
    }
}
