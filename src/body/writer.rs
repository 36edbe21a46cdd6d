use std::io::Write;

use super::{write_all_checked, DEFAULT_CHUNK_SIZE};
use crate::chunk::format_chunk_size_line;
use crate::error::Result;
use crate::headers::HeaderList;

enum Mode {
    NoBody,
    Sized {
        remaining: u64,
    },
    Chunked {
        chunk_size: usize,
        buffer: Vec<u8>,
        trailers: HeaderList,
    },
}

/// Writes a message body with the framing the message writer declared.
///
/// `write` accepts up to its declared length in `Sized` mode and returns
/// how much was accepted; in `Chunked` mode it always accepts everything,
/// buffering until a full chunk is ready to emit. `close` finalizes the
/// framing (the chunked terminator and trailers, for `Chunked`) and
/// flushes. `flush` only pushes already-framed bytes to the transport —
/// it never forces a partial chunk out early.
pub struct BodyWriter<'a, T: Write> {
    transport: &'a mut T,
    mode: Mode,
}

impl<'a, T: Write> BodyWriter<'a, T> {
    pub(crate) fn no_body(transport: &'a mut T) -> Self {
        BodyWriter {
            transport,
            mode: Mode::NoBody,
        }
    }

    pub(crate) fn sized(transport: &'a mut T, size: u64) -> Self {
        BodyWriter {
            transport,
            mode: Mode::Sized { remaining: size },
        }
    }

    pub(crate) fn chunked(transport: &'a mut T, chunk_size: usize, trailers: HeaderList) -> Self {
        let chunk_size = chunk_size.max(1);
        BodyWriter {
            transport,
            mode: Mode::Chunked {
                chunk_size,
                buffer: Vec::with_capacity(chunk_size),
                trailers,
            },
        }
    }

    pub(crate) fn chunked_default(transport: &'a mut T, trailers: HeaderList) -> Self {
        Self::chunked(transport, DEFAULT_CHUNK_SIZE, trailers)
    }

    /// Mutable access to the trailer field list, valid for `Chunked`
    /// writers. Fields appended here are emitted by `close`.
    pub fn trailers_mut(&mut self) -> Option<&mut HeaderList> {
        match &mut self.mode {
            Mode::Chunked { trailers, .. } => Some(trailers),
            _ => None,
        }
    }

    /// Accept up to `data.len()` octets; returns the number actually
    /// accepted. In `Sized` mode this clamps to the declared length and
    /// never over-writes it; in `Chunked` mode everything offered is
    /// accepted and chunk boundaries are emitted as the buffer fills.
    pub fn write(&mut self, data: &[u8]) -> Result<usize> {
        match &mut self.mode {
            Mode::NoBody => Ok(0),
            Mode::Sized { remaining } => {
                let n = (data.len() as u64).min(*remaining) as usize;
                write_all_checked(self.transport, &data[..n])?;
                *remaining -= n as u64;
                Ok(n)
            }
            Mode::Chunked {
                chunk_size,
                buffer,
                ..
            } => {
                buffer.extend_from_slice(data);
                let chunk_size = *chunk_size;
                while buffer.len() >= chunk_size {
                    let chunk: Vec<u8> = buffer.drain(..chunk_size).collect();
                    write_all_checked(self.transport, &format_chunk_size_line(chunk.len()))?;
                    write_all_checked(self.transport, &chunk)?;
                    write_all_checked(self.transport, b"\r\n")?;
                }
                Ok(data.len())
            }
        }
    }

    /// Push any already-framed bytes to the transport. Never forces a
    /// partial chunk or pads a short `Sized` body.
    pub fn flush(&mut self) -> Result<()> {
        self.transport.flush()?;
        Ok(())
    }

    /// Finalize framing: for `Chunked`, emit the residual partial chunk
    /// (if any), the terminating zero chunk, every trailer field and the
    /// closing empty line; then flush.
    pub fn close(mut self) -> Result<()> {
        if let Mode::Chunked {
            buffer, trailers, ..
        } = &mut self.mode
        {
            if !buffer.is_empty() {
                let residual = std::mem::take(buffer);
                write_all_checked(self.transport, &format_chunk_size_line(residual.len()))?;
                write_all_checked(self.transport, &residual)?;
                write_all_checked(self.transport, b"\r\n")?;
            }
            write_all_checked(self.transport, b"0\r\n")?;
            for field in trailers.iter() {
                write_all_checked(self.transport, field.name().as_bytes())?;
                write_all_checked(self.transport, b": ")?;
                write_all_checked(self.transport, field.value().as_bytes())?;
                write_all_checked(self.transport, b"\r\n")?;
            }
            write_all_checked(self.transport, b"\r\n")?;
        }
        self.transport.flush()?;
        Ok(())
    }
}
