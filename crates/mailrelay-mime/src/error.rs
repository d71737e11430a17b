//! Error types for MIME operations.

use std::io;

/// Result type alias for MIME operations.
pub type Result<T> = std::result::Result<T, Error>;

/// MIME error types.
///
/// Every variant except [`Error::Io`] is structural: the message cannot be
/// relayed and no document must be produced from it.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Reading the body stream failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Content-Type header could not be parsed.
    #[error("Invalid content type {value:?}: {reason}")]
    InvalidContentType {
        /// Raw header value.
        value: String,
        /// What was wrong with it.
        reason: &'static str,
    },

    /// Multipart content type without a `boundary` parameter.
    #[error("Missing boundary in {0}")]
    MissingBoundary(String),

    /// Body ended before the closing boundary delimiter.
    #[error("Unterminated multipart body (boundary {0:?})")]
    UnterminatedMultipart(String),

    /// Containers nested deeper than the walker allows.
    #[error("MIME nesting exceeds {0} levels")]
    NestingTooDeep(usize),

    /// Invalid transfer encoding.
    #[error("Invalid encoding: {0}")]
    InvalidEncoding(String),

    /// Base64 decode error.
    #[error("Base64 decode error: {0}")]
    Base64Decode(#[from] base64::DecodeError),

    /// A structural error located at a specific part of the tree.
    #[error("Part {part} ({content_type}): {source}")]
    InPart {
        /// Dotted part path, `root` for the top-level body.
        part: String,
        /// Declared content type of the failing part.
        content_type: String,
        /// Underlying error.
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Attaches the part location to a structural error.
    #[must_use]
    pub fn in_part(self, part: impl Into<String>, content_type: impl Into<String>) -> Self {
        Self::InPart {
            part: part.into(),
            content_type: content_type.into(),
            source: Box::new(self),
        }
    }

    /// Returns the innermost error, skipping part location wrappers.
    #[must_use]
    pub fn root_cause(&self) -> &Self {
        match self {
            Self::InPart { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Returns true if the error describes a malformed message rather than
    /// a failure to read it.
    #[must_use]
    pub fn is_structural(&self) -> bool {
        !matches!(self.root_cause(), Self::Io(_))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_in_part_display() {
        let err = Error::UnterminatedMultipart("abc".into()).in_part("1.2", "multipart/mixed");
        assert_eq!(
            err.to_string(),
            "Part 1.2 (multipart/mixed): Unterminated multipart body (boundary \"abc\")"
        );
    }

    #[test]
    fn test_root_cause() {
        let err = Error::NestingTooDeep(100).in_part("1", "multipart/mixed");
        assert!(matches!(err.root_cause(), Error::NestingTooDeep(100)));
        assert!(err.is_structural());
    }

    #[test]
    fn test_io_is_not_structural() {
        let err = Error::Io(io::Error::new(io::ErrorKind::UnexpectedEof, "eof"));
        assert!(!err.is_structural());
    }
}
