//! # mailrelay-mime
//!
//! MIME decomposition engine for relaying inbound mail to a delivery API.
//!
//! ## Features
//!
//! - **Message splitting**: Separate an RFC 822 message into headers and body
//! - **Part classification**: Decide whether a part is a container, text or opaque
//! - **Recursive walk**: Flatten arbitrarily nested multipart bodies in document order
//! - **Content encoding**: Produce canonical Base64 payloads without double encoding
//!
//! ## Quick Start
//!
//! ```ignore
//! use mailrelay_mime::{MimeWalker, RawMessage};
//!
//! let raw = b"From: sender@example.com\r\n\
//!             Content-Type: text/plain\r\n\
//!             \r\n\
//!             Hello, World!";
//!
//! let message = RawMessage::parse(raw);
//! let output = MimeWalker::new().walk(&message.headers, message.body())?;
//! assert_eq!(output.contents[0].text, "Hello, World!");
//! ```
//!
//! ### Attachment encoding
//!
//! ```ignore
//! use mailrelay_mime::encoding::encode_content;
//! use mailrelay_mime::TransferEncoding;
//!
//! // Declared base64 is passed through with whitespace removed
//! let content = encode_content(Some(TransferEncoding::Base64), b"SGVs\r\nbG8=");
//! assert_eq!(content, "SGVsbG8=");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod content_type;
mod error;
mod header;
mod message;
mod multipart;
mod walker;

pub mod encoding;

pub use content_type::{ContentType, PartKind};
pub use error::{Error, Result};
pub use header::Headers;
pub use message::{RawMessage, Segment, TransferEncoding};
pub use multipart::split_multipart;
pub use walker::{
    Attachment, DEFAULT_MAX_DEPTH, Disposition, MimeWalker, PartPath, TextContent, WalkOutput,
};
