//! Reading CRLF-terminated lines out of a buffered byte source.

use std::io::BufRead;

use crate::error::{Error, Result};

/// Read a single CRLF-terminated line, up to `max_len` bytes including the
/// terminator, from `source`.
///
/// Returns the bytes preceding the terminator; the terminator itself is
/// consumed but not returned. Fails with [`Error::UnterminatedLine`] if
/// `max_len` bytes are read without seeing a CRLF, or if the source ends
/// before one is found.
///
/// A zero-length result (an immediate `CRLF`) is a legal return value —
/// it is how the header block's terminating empty line is represented.
pub fn read_line<R: BufRead + ?Sized>(source: &mut R, max_len: usize) -> Result<Vec<u8>> {
    let mut line = Vec::new();

    loop {
        if line.len() >= max_len {
            return Err(Error::UnterminatedLine);
        }

        let mut byte = [0u8; 1];
        let n = std::io::Read::read(source, &mut byte)?;
        if n == 0 {
            return Err(Error::UnterminatedLine);
        }

        if byte[0] == b'\n' {
            if line.last() == Some(&b'\r') {
                line.pop();
                return Ok(line);
            }
            // A bare LF is not a valid terminator under this codec; keep
            // scanning would let it slip past, so treat it as framing
            // corruption instead of silently accepting it.
            return Err(Error::UnterminatedLine);
        }

        line.push(byte[0]);
    }
}
