use std::io::BufRead;

use super::BodyLimits;
use crate::chunk::parse_chunk_size_line;
use crate::error::{Error, Result};
use crate::field::{validate_name, validate_value};
use crate::headers::HeaderList;
use crate::line::read_line;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChunkState {
    BetweenChunks,
    InChunk(usize),
    Exhausted,
}

enum Mode {
    NoBody,
    Sized { remaining: u64 },
    Chunked { state: ChunkState },
}

/// Reads a message body with the framing the message reader detected.
///
/// `read_into` fills the caller's buffer and returns 0 only once the body
/// is fully consumed. `close` drains any residual bytes so the transport
/// stays aligned for the next message on the connection; for `Chunked`
/// bodies it additionally parses trailer fields into the trailer list
/// once the zero-sized chunk has been seen.
pub struct BodyReader<'a, R: BufRead> {
    source: &'a mut R,
    mode: Mode,
    limits: BodyLimits,
    trailers: HeaderList,
}

impl<'a, R: BufRead> BodyReader<'a, R> {
    pub(crate) fn no_body(source: &'a mut R) -> Self {
        BodyReader {
            source,
            mode: Mode::NoBody,
            limits: BodyLimits::default(),
            trailers: HeaderList::new(),
        }
    }

    pub(crate) fn sized(source: &'a mut R, size: u64, limits: BodyLimits) -> Self {
        BodyReader {
            source,
            mode: Mode::Sized { remaining: size },
            limits,
            trailers: HeaderList::new(),
        }
    }

    pub(crate) fn chunked(source: &'a mut R, limits: BodyLimits) -> Self {
        BodyReader {
            source,
            mode: Mode::Chunked {
                state: ChunkState::BetweenChunks,
            },
            limits,
            trailers: HeaderList::new(),
        }
    }

    /// Trailer fields parsed by `close`, for `Chunked` bodies. Empty
    /// until `close` has been called (or for non-chunked bodies).
    pub fn trailers(&self) -> &HeaderList {
        &self.trailers
    }

    /// Fill `buf`; returns 0 only once the body is fully consumed.
    pub fn read_into(&mut self, buf: &mut [u8]) -> Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        match &mut self.mode {
            Mode::NoBody => Ok(0),
            Mode::Sized { remaining } => {
                if *remaining == 0 {
                    return Ok(0);
                }
                let cap = (buf.len() as u64).min(*remaining) as usize;
                let n = self.source.read(&mut buf[..cap])?;
                *remaining -= n as u64;
                Ok(n)
            }
            Mode::Chunked { state } => read_chunked(self.source, state, &self.limits, buf),
        }
    }

    /// Loop over `read_into` until the body is fully consumed.
    pub fn read_all(&mut self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        let mut buf = [0u8; 8192];
        loop {
            let n = self.read_into(&mut buf)?;
            if n == 0 {
                break;
            }
            out.extend_from_slice(&buf[..n]);
        }
        Ok(out)
    }

    /// Drain any residual body bytes, then (for `Chunked`) parse trailer
    /// fields into [`BodyReader::trailers`].
    pub fn close(&mut self) -> Result<()> {
        let mut scratch = [0u8; 8192];
        loop {
            let n = self.read_into(&mut scratch)?;
            if n == 0 {
                break;
            }
        }

        if let Mode::Chunked { state } = &self.mode {
            if *state == ChunkState::Exhausted {
                read_trailers(self.source, &self.limits, &mut self.trailers)?;
            }
        }

        Ok(())
    }
}

fn read_chunked<R: BufRead>(
    source: &mut R,
    state: &mut ChunkState,
    limits: &BodyLimits,
    buf: &mut [u8],
) -> Result<usize> {
    loop {
        match state {
            ChunkState::Exhausted => return Ok(0),
            ChunkState::BetweenChunks => {
                let line = read_line(source, limits.max_line_size)?;
                let size = parse_chunk_size_line(&line)?;
                *state = if size == 0 {
                    ChunkState::Exhausted
                } else {
                    ChunkState::InChunk(size)
                };
            }
            ChunkState::InChunk(remaining) => {
                let cap = buf.len().min(*remaining);
                let n = source.read(&mut buf[..cap])?;
                if n == 0 {
                    return Err(Error::UnterminatedLine);
                }
                *remaining -= n;
                if *remaining == 0 {
                    let terminator = read_line(source, 2)?;
                    if !terminator.is_empty() {
                        return Err(Error::InvalidChunkSize);
                    }
                    *state = ChunkState::BetweenChunks;
                }
                return Ok(n);
            }
        }
    }
}

fn read_trailers<R: BufRead>(
    source: &mut R,
    limits: &BodyLimits,
    trailers: &mut HeaderList,
) -> Result<()> {
    loop {
        let line = read_line(source, limits.max_line_size)?;
        if line.is_empty() {
            return Ok(());
        }
        if trailers.len() >= limits.max_field_count {
            return Err(Error::TooManyFields);
        }

        let colon = line
            .iter()
            .position(|&b| b == b':')
            .ok_or(Error::MalformedHeader)?;
        let name = &line[..colon];
        let name = rtrim(name);
        let value = ltrim(&line[colon + 1..]);

        validate_name(name)?;
        validate_value(value)?;

        let name = std::str::from_utf8(name).map_err(|_| Error::InvalidFieldName)?;
        let value = std::str::from_utf8(value).map_err(|_| Error::InvalidFieldValue)?;
        trailers.append(name, value)?;
    }
}

fn rtrim(bytes: &[u8]) -> &[u8] {
    let end = bytes
        .iter()
        .rposition(|&b| b != b' ' && b != b'\t')
        .map(|i| i + 1)
        .unwrap_or(0);
    &bytes[..end]
}

fn ltrim(bytes: &[u8]) -> &[u8] {
    let start = bytes
        .iter()
        .position(|&b| b != b' ' && b != b'\t')
        .unwrap_or(bytes.len());
    &bytes[start..]
}
