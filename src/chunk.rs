//! Shared chunk-size line framing helpers used by both the chunked body
//! reader and writer (RFC 7230 §4.1).
//!
//! Per the redesign flag in `spec.md` §9, chunk sizes are hexadecimal —
//! not the decimal the Python original and its `isnumeric()` check used.

use crate::error::{Error, Result};

/// Render a chunk-size line: `"<size-in-hex>\r\n"`. No chunk-extensions
/// are ever emitted.
pub fn format_chunk_size_line(len: usize) -> Vec<u8> {
    let mut out = format!("{:x}", len).into_bytes();
    out.extend_from_slice(b"\r\n");
    out
}

/// Parse a chunk-size line's content (CRLF already stripped by the line
/// reader). Tolerates a trailing `;chunk-ext` per RFC 7230 §4.1.1, which
/// is discarded.
pub fn parse_chunk_size_line(line: &[u8]) -> Result<usize> {
    let size_part = match line.iter().position(|&b| b == b';') {
        Some(i) => &line[..i],
        None => line,
    };
    let s = std::str::from_utf8(size_part).map_err(|_| Error::InvalidChunkSize)?;
    usize::from_str_radix(s.trim(), 16).map_err(|_| Error::InvalidChunkSize)
}
