//! Error types for SMTP server operations.

use crate::types::{Reply, ReplyCode};
use std::io;

/// Result type alias for SMTP operations.
pub type Result<T> = std::result::Result<T, Error>;

/// SMTP error types.
///
/// Everything except [`Error::Io`] is a protocol-level failure that is
/// answered with a reply and keeps the session open.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Command verb not recognized.
    #[error("Syntax error, command unrecognized: {0}")]
    UnknownCommand(String),

    /// Malformed command arguments.
    #[error("Syntax error in parameters or arguments: {0}")]
    Syntax(String),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Command line longer than the protocol allows.
    #[error("Line too long")]
    LineTooLong,

    /// Command valid but not offered by this server.
    #[error("Command not implemented: {0}")]
    NotImplemented(String),

    /// Command out of order.
    #[error("Bad sequence of commands: {0}")]
    BadSequence(&'static str),

    /// Message exceeds the size limit.
    #[error("Message exceeds size limit: {0} bytes")]
    MessageTooLarge(usize),

    /// Transaction exceeds the recipient limit.
    #[error("Too many recipients (limit {0})")]
    TooManyRecipients(usize),
}

impl Error {
    /// Returns the reply code answering this error, or `None` for I/O
    /// failures that end the session.
    #[must_use]
    pub const fn reply_code(&self) -> Option<ReplyCode> {
        match self {
            Self::Io(_) => None,
            Self::UnknownCommand(_) | Self::LineTooLong => Some(ReplyCode::SYNTAX_ERROR),
            Self::Syntax(_) | Self::InvalidAddress(_) => Some(ReplyCode::PARAMETER_ERROR),
            Self::NotImplemented(_) => Some(ReplyCode::NOT_IMPLEMENTED),
            Self::BadSequence(_) => Some(ReplyCode::BAD_SEQUENCE),
            Self::MessageTooLarge(_) => Some(ReplyCode::EXCEEDED_STORAGE),
            Self::TooManyRecipients(_) => Some(ReplyCode::INSUFFICIENT_STORAGE),
        }
    }

    /// Builds the reply sent to the client for this error.
    #[must_use]
    pub fn to_reply(&self) -> Option<Reply> {
        self.reply_code()
            .map(|code| Reply::single(code, self.to_string()))
    }
}
