//! Writing a request or response: start-line, header block, and the body
//! stream constructed once framing has been declared.

use std::io::Write;

use crate::body::{BodyWriter, Framing, DEFAULT_CHUNK_SIZE};
use crate::error::{Error, Result};
use crate::headers::HeaderList;
use crate::message::{Method, StatusCode, Version};

/// Renders and writes a request or response start-line, its headers, and
/// (once framing is declared) its body.
///
/// Call sequence: populate [`MessageWriter::headers_mut`], call
/// [`MessageWriter::declare_sized`] or [`MessageWriter::declare_chunked`]
/// (or leave framing unset for a bodyless message), then
/// [`MessageWriter::write_body`] zero or more times, then
/// [`MessageWriter::close`]. The start-line and headers are flushed to
/// the transport on the first call that needs the body stream (or on
/// `close`, for a bodyless message).
pub struct MessageWriter<'a, T: Write> {
    transport: Option<&'a mut T>,
    start_line: Vec<u8>,
    headers: HeaderList,
    trailers: HeaderList,
    framing: Framing,
    chunk_size: usize,
    started: bool,
    body: Option<BodyWriter<'a, T>>,
}

impl<'a, T: Write> MessageWriter<'a, T> {
    fn new(transport: &'a mut T, start_line: Vec<u8>, headers: HeaderList) -> Self {
        MessageWriter {
            transport: Some(transport),
            start_line,
            headers,
            trailers: HeaderList::new(),
            framing: Framing::NoBody,
            chunk_size: DEFAULT_CHUNK_SIZE,
            started: false,
            body: None,
        }
    }

    /// Begin a request: `method SP target SP version`.
    pub fn request(
        transport: &'a mut T,
        method: &Method,
        target: &str,
        version: Version,
    ) -> Result<Self> {
        let mut line = Vec::new();
        line.extend_from_slice(method.as_str().as_bytes());
        line.push(b' ');
        line.extend_from_slice(target.as_bytes());
        line.push(b' ');
        line.extend_from_slice(version.as_str().as_bytes());
        Ok(Self::new(transport, line, HeaderList::new()))
    }

    /// Begin a response: `version SP status SP reason`.
    pub fn response(
        transport: &'a mut T,
        version: Version,
        status: StatusCode,
        reason: &str,
    ) -> Result<Self> {
        let mut line = Vec::new();
        line.extend_from_slice(version.as_str().as_bytes());
        line.push(b' ');
        line.extend_from_slice(status.0.to_string().as_bytes());
        line.push(b' ');
        line.extend_from_slice(reason.as_bytes());
        Ok(Self::new(transport, line, HeaderList::new()))
    }

    /// Mutable access to the header list. Must not be touched after the
    /// first [`MessageWriter::write_body`]/[`MessageWriter::close`] call.
    pub fn headers_mut(&mut self) -> &mut HeaderList {
        &mut self.headers
    }

    /// Declare a fixed-length body and set `Content-Length` accordingly.
    pub fn declare_sized(&mut self, len: u64) -> Result<()> {
        self.framing = Framing::Sized(len);
        self.headers.remove("Transfer-Encoding");
        self.headers.set("Content-Length", Some(&len.to_string()))
    }

    /// Declare a chunked body and set `Transfer-Encoding: chunked`.
    pub fn declare_chunked(&mut self) -> Result<()> {
        self.declare_chunked_with_size(DEFAULT_CHUNK_SIZE)
    }

    /// Declare a chunked body with a specific chunk size (the size is a
    /// local buffering detail, not part of the wire contract).
    pub fn declare_chunked_with_size(&mut self, chunk_size: usize) -> Result<()> {
        self.framing = Framing::Chunked;
        self.chunk_size = chunk_size.max(1);
        self.headers.remove("Content-Length");
        self.headers.set("Transfer-Encoding", Some("chunked"))
    }

    /// Mutable access to the trailer fields emitted by `close`, for a
    /// chunked body. Returns `None` until chunked framing has been
    /// declared.
    ///
    /// Before the first `write_body`/`close` call this is the writer's own
    /// staging list; once headers have been flushed, the list has been
    /// handed off to the [`BodyWriter`], so this delegates there instead —
    /// otherwise fields appended after that point would land in a list
    /// nothing reads.
    pub fn trailers_mut(&mut self) -> Option<&mut HeaderList> {
        if self.started {
            return self.body.as_mut().and_then(|b| b.trailers_mut());
        }
        match self.framing {
            Framing::Chunked => Some(&mut self.trailers),
            _ => None,
        }
    }

    fn ensure_started(&mut self) -> Result<()> {
        if self.started {
            return Ok(());
        }
        let transport = self.transport.take().ok_or(Error::ConnectionClosed)?;
        write_line(transport, &self.start_line)?;
        for field in self.headers.iter() {
            write_line(transport, format!("{}: {}", field.name(), field.value()).as_bytes())?;
        }
        write_line(transport, b"")?;

        self.body = Some(match self.framing {
            Framing::NoBody => BodyWriter::no_body(transport),
            Framing::Sized(len) => BodyWriter::sized(transport, len),
            Framing::Chunked => {
                BodyWriter::chunked(transport, self.chunk_size, std::mem::take(&mut self.trailers))
            }
        });
        self.started = true;
        Ok(())
    }

    /// Write body bytes. Flushes the start-line and headers first if this
    /// is the first call. See [`BodyWriter::write`] for acceptance
    /// semantics.
    pub fn write_body(&mut self, data: &[u8]) -> Result<usize> {
        self.ensure_started()?;
        self.body.as_mut().expect("started").write(data)
    }

    /// Push any already-framed body bytes to the transport.
    pub fn flush(&mut self) -> Result<()> {
        self.ensure_started()?;
        self.body.as_mut().expect("started").flush()
    }

    /// Finalize the message: if no body was ever written, this is where
    /// the start-line and headers are flushed. Consumes the writer.
    pub fn close(mut self) -> Result<()> {
        self.ensure_started()?;
        self.body.take().expect("started").close()
    }
}

fn write_line<W: Write>(w: &mut W, line: &[u8]) -> Result<()> {
    w.write_all(line).map_err(Error::from)?;
    w.write_all(b"\r\n").map_err(Error::from)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::message::{Method, Version};

    #[test]
    fn sized_request_round_trip_bytes() {
        let mut out = Vec::new();
        let mut w = MessageWriter::request(&mut out, &Method::Post, "/submit", Version::Http11)
            .unwrap();
        w.headers_mut().append("Host", "example.com").unwrap();
        w.declare_sized(5).unwrap();
        w.write_body(b"hello").unwrap();
        w.close().unwrap();
        assert_eq!(
            out,
            b"POST /submit HTTP/1.1\r\nHost: example.com\r\nContent-Length: 5\r\n\r\nhello"
                .to_vec()
        );
    }

    #[test]
    fn bodyless_response_flushes_on_close() {
        let mut out = Vec::new();
        let mut w =
            MessageWriter::response(&mut out, Version::Http11, StatusCode(204), "No Content")
                .unwrap();
        w.headers_mut().append("Host", "example.com").unwrap();
        w.close().unwrap();
        assert_eq!(
            out,
            b"HTTP/1.1 204 No Content\r\nHost: example.com\r\n\r\n".to_vec()
        );
    }

    #[test]
    fn chunked_response_emits_trailers_declared_before_start() {
        let mut out = Vec::new();
        let mut w =
            MessageWriter::response(&mut out, Version::Http11, StatusCode(200), "OK").unwrap();
        w.declare_chunked_with_size(5).unwrap();
        w.trailers_mut().unwrap().append("Test", "123").unwrap();
        w.write_body(b"hello").unwrap();
        w.close().unwrap();
        assert_eq!(
            out,
            b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n5\r\nhello\r\n0\r\nTest: 123\r\n\r\n"
                .to_vec()
        );
    }

    #[test]
    fn chunked_response_emits_trailers_declared_after_write_body() {
        // The header/trailer list is handed off to the BodyWriter on the
        // first write_body call; trailers_mut() must keep reaching the
        // live list afterwards, not the now-disconnected staging one.
        let mut out = Vec::new();
        let mut w =
            MessageWriter::response(&mut out, Version::Http11, StatusCode(200), "OK").unwrap();
        w.declare_chunked_with_size(5).unwrap();
        w.write_body(b"hello").unwrap();
        w.trailers_mut().unwrap().append("Test", "123").unwrap();
        w.close().unwrap();
        assert_eq!(
            out,
            b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n5\r\nhello\r\n0\r\nTest: 123\r\n\r\n"
                .to_vec()
        );
    }

    #[test]
    fn invalid_header_rejected_before_any_bytes_are_emitted() {
        // Scenario S6.
        let mut out = Vec::new();
        let mut w =
            MessageWriter::request(&mut out, &Method::Get, "/", Version::Http11).unwrap();
        let result = w.headers_mut().append("X\r\nInjected", "v");
        assert!(result.is_err());
        assert!(out.is_empty());
    }
}
