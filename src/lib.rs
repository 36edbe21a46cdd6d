//! A blocking HTTP/1.1 message codec, a streaming body abstraction, and
//! an RFC 3986 URI reference resolver, layered under a thin
//! request/response client.
//!
//! The crate is organized bottom-up:
//!
//! - [`field`] — lexical validation of header names/values (RFC 7230 §3.2).
//! - [`headers`] — an ordered, case-insensitive field list.
//! - [`line`] — CRLF line framing over a buffered reader.
//! - [`message`] — method, version, status-code and start-line types.
//! - [`chunk`] — chunk-size line framing, shared by reader and writer.
//! - [`body`] — [`body::BodyReader`]/[`body::BodyWriter`], the streaming
//!   body abstraction chosen once per message by its framing.
//! - [`reader`]/[`writer`] — parsing and rendering a full request or
//!   response (start-line, headers, framing decision).
//! - [`uri`] — RFC 3986 §5 reference resolution.
//! - [`connection`] — one connection bound to one in-flight message at a
//!   time.
//! - [`client`] — a redirect-following request/response client over a
//!   pluggable [`client::Connector`].
//!
//! None of this performs any I/O on its own beyond what's handed to it
//! through a `Read`/`Write`/`BufRead` transport supplied by the caller;
//! there is no bundled networking or TLS stack.

#[macro_use]
extern crate log;

pub mod body;
pub mod chunk;
pub mod client;
pub mod connection;
pub mod error;
pub mod field;
pub mod headers;
pub mod line;
pub mod message;
pub mod reader;
pub mod uri;
pub mod writer;

pub use body::{BodyReader, BodyWriter, Framing};
pub use client::{Client, Connector, Request, Response, Transport};
pub use connection::{Connection, IncomingRequest, IncomingResponse, OutgoingMessage};
pub use error::{Error, Result};
pub use headers::{Field, HeaderList};
pub use message::{Method, RequestLine, StatusCode, StatusLine, Version};
pub use uri::{remove_dot_segments, transform_reference, Uri};
