//! Multipart body splitting (RFC 2046 section 5.1.1).

use crate::error::{Error, Result};

/// Splits a multipart body into its raw child entities.
///
/// A delimiter line is `--boundary`, optionally followed by linear
/// whitespace; the close delimiter adds a trailing `--`. The preamble before
/// the first delimiter and the epilogue after the close delimiter are
/// discarded. The line break preceding a delimiter belongs to the delimiter,
/// not to the child.
///
/// # Errors
///
/// Returns [`Error::UnterminatedMultipart`] if the body ends before the
/// close delimiter.
pub fn split_multipart<'a>(body: &'a [u8], boundary: &str) -> Result<Vec<&'a [u8]>> {
    let delimiter = format!("--{boundary}");
    let mut parts = Vec::new();
    let mut part_start: Option<usize> = None;
    let mut pos = 0;

    while pos < body.len() {
        let line_end = body[pos..]
            .iter()
            .position(|&b| b == b'\n')
            .map_or(body.len(), |i| pos + i + 1);

        if let Some(is_close) = match_delimiter(&body[pos..line_end], delimiter.as_bytes()) {
            if let Some(start) = part_start.take() {
                parts.push(strip_line_break(&body[start..pos]));
            }
            if is_close {
                return Ok(parts);
            }
            part_start = Some(line_end);
        }

        pos = line_end;
    }

    Err(Error::UnterminatedMultipart(boundary.to_string()))
}

/// Returns `Some(is_close)` if the line is a delimiter for this boundary.
fn match_delimiter(line: &[u8], delimiter: &[u8]) -> Option<bool> {
    let rest = line.strip_prefix(delimiter)?;
    let (is_close, rest) = match rest.strip_prefix(b"--") {
        Some(rest) => (true, rest),
        None => (false, rest),
    };

    rest.iter()
        .all(|&b| matches!(b, b' ' | b'\t' | b'\r' | b'\n'))
        .then_some(is_close)
}

fn strip_line_break(part: &[u8]) -> &[u8] {
    part.strip_suffix(b"\r\n")
        .or_else(|| part.strip_suffix(b"\n"))
        .unwrap_or(part)
}
