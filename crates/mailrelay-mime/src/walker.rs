//! Recursive MIME walker.
//!
//! Flattens a MIME tree into ordered text contents and attachments. The walk
//! is depth-first and pre-order, so output order is document order no matter
//! how deeply containers nest.

use crate::content_type::PartKind;
use crate::encoding::{decode_charset, decode_transfer, encode_content};
use crate::error::{Error, Result};
use crate::header::Headers;
use crate::message::Segment;
use crate::multipart::split_multipart;
use std::fmt;
use std::io::Read;
use uuid::Uuid;

/// Default limit on nested multipart containers.
pub const DEFAULT_MAX_DEPTH: usize = 100;

/// Whether an attachment is rendered inline or offered for download.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Disposition {
    /// Downloadable attachment.
    #[default]
    Attachment,
    /// Rendered inline, usually referenced through a `cid:` URL.
    Inline,
}

impl Disposition {
    /// Returns the lowercase disposition token.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Attachment => "attachment",
            Self::Inline => "inline",
        }
    }
}

impl fmt::Display for Disposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A text part rendered as a string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextContent {
    /// Media type without parameters (e.g., "text/html").
    pub media_type: String,
    /// Decoded text.
    pub text: String,
}

/// A non-text leaf carried as Base64.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// Media type without parameters (e.g., "application/pdf").
    pub media_type: String,
    /// Declared or generated file name, never empty.
    pub filename: String,
    /// Content-ID without angle brackets.
    pub content_id: Option<String>,
    /// Inline or attachment.
    pub disposition: Disposition,
    /// Base64 payload.
    pub content: String,
}

/// Everything a walk produced, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalkOutput {
    /// Text parts.
    pub contents: Vec<TextContent>,
    /// Attachments.
    pub attachments: Vec<Attachment>,
}

/// Location of a part in the MIME tree (`root`, `1`, `2.1`, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartPath(Vec<usize>);

impl PartPath {
    /// The top-level body.
    #[must_use]
    pub const fn root() -> Self {
        Self(Vec::new())
    }

    /// Number of containers enclosing this part.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.0.len()
    }

    fn push(&mut self, index: usize) {
        self.0.push(index);
    }

    fn pop(&mut self) {
        self.0.pop();
    }
}

impl fmt::Display for PartPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("root");
        }
        for (i, index) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{index}")?;
        }
        Ok(())
    }
}

/// Walks MIME bodies into [`WalkOutput`].
#[derive(Debug, Clone, Copy)]
pub struct MimeWalker {
    max_depth: usize,
}

impl Default for MimeWalker {
    fn default() -> Self {
        Self::new()
    }
}

impl MimeWalker {
    /// Creates a walker allowing [`DEFAULT_MAX_DEPTH`] nested containers.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Sets the nesting limit.
    #[must_use]
    pub const fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Reads `body` to the end and walks it as the entity described by
    /// `headers`.
    ///
    /// # Errors
    ///
    /// Read failures are returned as [`Error::Io`] immediately. Any
    /// malformed part aborts the whole walk with a structural error.
    pub fn walk<R: Read>(&self, headers: &Headers, mut body: R) -> Result<WalkOutput> {
        let mut raw = Vec::new();
        body.read_to_end(&mut raw)?;
        self.walk_segment(&Segment::new(headers.clone(), &raw))
    }

    /// Walks an already buffered segment.
    ///
    /// # Errors
    ///
    /// Any malformed part aborts the whole walk with a structural error.
    pub fn walk_segment(&self, segment: &Segment<'_>) -> Result<WalkOutput> {
        let mut output = WalkOutput::default();
        self.visit(segment, &mut PartPath::root(), &mut output)?;
        Ok(output)
    }

    fn visit(
        &self,
        segment: &Segment<'_>,
        path: &mut PartPath,
        output: &mut WalkOutput,
    ) -> Result<()> {
        let content_type = segment.content_type().map_err(|e| {
            let declared = segment.headers.get("content-type").unwrap_or_default();
            e.in_part(path.to_string(), declared)
        })?;
        let media_type = content_type.media_type();
        let kind = content_type
            .classify()
            .map_err(|e| e.in_part(path.to_string(), &media_type))?;

        match kind {
            PartKind::Container { boundary } => {
                if path.depth() >= self.max_depth {
                    return Err(
                        Error::NestingTooDeep(self.max_depth).in_part(path.to_string(), media_type)
                    );
                }

                let children = split_multipart(segment.body, &boundary)
                    .map_err(|e| e.in_part(path.to_string(), &media_type))?;

                for (index, child) in children.into_iter().enumerate() {
                    path.push(index + 1);
                    self.visit(&Segment::parse(child), path, output)?;
                    path.pop();
                }
            }
            PartKind::Text => {
                let bytes = decode_transfer(segment.transfer_encoding(), segment.body);
                output.contents.push(TextContent {
                    media_type,
                    text: decode_charset(content_type.charset(), &bytes),
                });
            }
            PartKind::Opaque => {
                output.attachments.push(Attachment {
                    media_type,
                    filename: segment
                        .filename(&content_type)
                        .unwrap_or_else(generate_filename),
                    content_id: segment.content_id(),
                    disposition: segment.disposition(),
                    content: encode_content(segment.transfer_encoding(), segment.body),
                });
            }
        }

        Ok(())
    }
}

/// Returns a process-wide unique file name for an unnamed attachment.
fn generate_filename() -> String {
    Uuid::new_v4().to_string()
}
