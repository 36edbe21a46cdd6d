//! A connection over one transport, bound to exactly one in-flight
//! message at a time.
//!
//! A [`Connection`] wraps a `Read + Write` transport in a [`BufReader`]
//! and hands out one streaming message (request or response) per call to
//! [`Connection::receive_request`], [`Connection::send_response`],
//! [`Connection::send_request`] or [`Connection::receive_response`]. The
//! returned handle borrows the connection for as long as its body stream
//! is in flight, so the borrow checker rules out starting a second
//! message while the first's body hasn't been read or written yet.
//!
//! The one case the borrow checker cannot see is a handle simply being
//! dropped instead of explicitly closed — the connection would then be
//! left mid-body, unusable for a next message without first resyncing
//! the stream. `open` tracks that: it is set when a handle is issued and
//! cleared only by the handle's `close`, so a stray drop leaves the
//! connection refusing further messages with [`Error::PriorMessageOpen`]
//! rather than silently parsing garbage as a fresh start-line.

use std::cell::Cell;
use std::io::{BufReader, Read, Write};

use crate::body::{BodyReader, BodyWriter};
use crate::error::{Error, Result};
use crate::headers::HeaderList;
use crate::message::{Method, RequestLine, StatusCode, StatusLine, Version};
use crate::reader::{
    body_reader_for, read_headers, read_request_line, read_status_line, resolve_request_framing,
    resolve_response_framing, ReadLimits,
};
use crate::writer::MessageWriter;

/// One request/response connection over a `Read + Write` transport.
pub struct Connection<T> {
    transport: BufReader<T>,
    limits: ReadLimits,
    open: Cell<bool>,
    closed: bool,
}

impl<T: Read + Write> Connection<T> {
    pub fn new(transport: T) -> Self {
        Self::with_limits(transport, ReadLimits::default())
    }

    pub fn with_limits(transport: T, limits: ReadLimits) -> Self {
        Connection {
            transport: BufReader::new(transport),
            limits,
            open: Cell::new(false),
            closed: false,
        }
    }

    fn check_idle(&self) -> Result<()> {
        if self.closed {
            return Err(Error::ConnectionClosed);
        }
        if self.open.get() {
            return Err(Error::PriorMessageOpen);
        }
        Ok(())
    }

    /// Server side: read the next request's start-line and headers, and
    /// hand back a streaming body reader for it.
    pub fn receive_request(&mut self) -> Result<IncomingRequest<'_, T>> {
        self.check_idle()?;
        let request_line = read_request_line(&mut self.transport, self.limits)?;
        let mut headers = read_headers(&mut self.transport, self.limits)?;
        let framing = resolve_request_framing(&mut headers)?;
        trace!(
            "Read request: {} {} {:?}, framing {:?}",
            request_line.method,
            request_line.target,
            request_line.version,
            framing
        );
        self.open.set(true);
        let body = body_reader_for(&mut self.transport, framing, self.limits);
        Ok(IncomingRequest {
            request_line,
            headers,
            body: Some(body),
            open: &self.open,
        })
    }

    /// Server side: begin writing the response to a request previously
    /// obtained from [`Connection::receive_request`] (and already
    /// `close`d, so `open` has been cleared).
    pub fn send_response(
        &mut self,
        version: Version,
        status: StatusCode,
        reason: &str,
    ) -> Result<OutgoingMessage<'_, T>> {
        self.check_idle()?;
        self.open.set(true);
        let writer = MessageWriter::response(self.transport.get_mut(), version, status, reason)?;
        Ok(OutgoingMessage {
            writer,
            open: &self.open,
        })
    }

    /// Client side: begin writing a request.
    pub fn send_request(
        &mut self,
        method: &Method,
        target: &str,
        version: Version,
    ) -> Result<OutgoingMessage<'_, T>> {
        self.check_idle()?;
        self.open.set(true);
        let writer = MessageWriter::request(self.transport.get_mut(), method, target, version)?;
        Ok(OutgoingMessage {
            writer,
            open: &self.open,
        })
    }

    /// Client side: read the response to a request previously sent via
    /// [`Connection::send_request`] (and already `close`d).
    pub fn receive_response(&mut self, method: &Method) -> Result<IncomingResponse<'_, T>> {
        self.check_idle()?;
        let status_line = read_status_line(&mut self.transport, self.limits)?;
        let mut headers = read_headers(&mut self.transport, self.limits)?;
        let framing =
            resolve_response_framing(method, status_line.status, &mut headers)?;
        trace!(
            "Read response: {} {}, framing {:?}",
            status_line.status,
            status_line.reason,
            framing
        );
        self.open.set(true);
        let body = body_reader_for(&mut self.transport, framing, self.limits);
        Ok(IncomingResponse {
            status_line,
            headers,
            body: Some(body),
            open: &self.open,
        })
    }

    /// Whether a message handle is currently outstanding (issued but not
    /// yet `close`d).
    pub fn is_busy(&self) -> bool {
        self.open.get()
    }

    /// Shut the connection down; any further call returns
    /// [`Error::ConnectionClosed`].
    pub fn close(mut self) -> Result<T> {
        debug!("Close connection");
        self.closed = true;
        Ok(self.transport.into_inner())
    }
}

/// A request being read: start-line and headers are already parsed; the
/// body is read incrementally through [`IncomingRequest::body_mut`].
pub struct IncomingRequest<'a, T: Read> {
    pub request_line: RequestLine,
    headers: HeaderList,
    body: Option<BodyReader<'a, BufReader<T>>>,
    open: &'a Cell<bool>,
}

impl<'a, T: Read> IncomingRequest<'a, T> {
    pub fn headers(&self) -> &HeaderList {
        &self.headers
    }

    pub fn body_mut(&mut self) -> &mut BodyReader<'a, BufReader<T>> {
        self.body.as_mut().expect("body already closed")
    }

    /// Drain any unread body bytes and trailers, and mark the connection
    /// idle again.
    pub fn close(mut self) -> Result<()> {
        if let Some(mut body) = self.body.take() {
            body.close()?;
        }
        self.open.set(false);
        Ok(())
    }
}

impl<'a, T: Read> Drop for IncomingRequest<'a, T> {
    fn drop(&mut self) {
        // Best-effort: a caller that drops the handle without calling
        // `close` still gets its unread bytes drained so the stream
        // stays aligned, but `open` is left set, so the connection
        // refuses a next message until that's noticed. A no-op if
        // `close` already ran.
        if let Some(mut body) = self.body.take() {
            let _ = body.close();
        }
    }
}

/// A response being read, client side: mirrors [`IncomingRequest`].
pub struct IncomingResponse<'a, T: Read> {
    pub status_line: StatusLine,
    headers: HeaderList,
    body: Option<BodyReader<'a, BufReader<T>>>,
    open: &'a Cell<bool>,
}

impl<'a, T: Read> IncomingResponse<'a, T> {
    pub fn headers(&self) -> &HeaderList {
        &self.headers
    }

    pub fn body_mut(&mut self) -> &mut BodyReader<'a, BufReader<T>> {
        self.body.as_mut().expect("body already closed")
    }

    pub fn close(mut self) -> Result<()> {
        if let Some(mut body) = self.body.take() {
            body.close()?;
        }
        self.open.set(false);
        Ok(())
    }
}

impl<'a, T: Read> Drop for IncomingResponse<'a, T> {
    fn drop(&mut self) {
        if let Some(mut body) = self.body.take() {
            let _ = body.close();
        }
    }
}

/// A request or response being written: start-line and headers are
/// flushed lazily, on the first body write or on `close`.
pub struct OutgoingMessage<'a, T: Write> {
    writer: MessageWriter<'a, T>,
    open: &'a Cell<bool>,
}

impl<'a, T: Write> OutgoingMessage<'a, T> {
    pub fn headers_mut(&mut self) -> &mut HeaderList {
        self.writer.headers_mut()
    }

    pub fn declare_sized(&mut self, len: u64) -> Result<()> {
        self.writer.declare_sized(len)
    }

    pub fn declare_chunked(&mut self) -> Result<()> {
        self.writer.declare_chunked()
    }

    pub fn trailers_mut(&mut self) -> Option<&mut HeaderList> {
        self.writer.trailers_mut()
    }

    pub fn write_body(&mut self, data: &[u8]) -> Result<usize> {
        self.writer.write_body(data)
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()
    }

    pub fn close(self) -> Result<()> {
        self.writer.close()?;
        self.open.set(false);
        Ok(())
    }
}
