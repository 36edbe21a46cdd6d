//! A thin client over [`Connection`]: opens a transport per request via a
//! pluggable [`Connector`], and optionally follows redirects.
//!
//! Grounded on the Python `httpy` client's `_do`/`send` methods: redirect
//! status codes `{301, 302, 303, 307, 308}`, a method swap to `GET` (with
//! the body dropped) on `303`, and a bounded hop counter rather than a
//! visited-URI set for loop detection — `httpy` never builds such a set
//! either, it just counts.

use std::io::{Read, Write};

use crate::connection::Connection;
use crate::error::{Error, Result};
use crate::headers::HeaderList;
use crate::message::{Method, StatusCode, Version};
use crate::reader::ReadLimits;
use crate::uri::{transform_reference, Uri};

/// Anything a [`Connection`] can be built on.
pub trait Transport: Read + Write {}
impl<T: Read + Write> Transport for T {}

/// Opens a transport connection to `(scheme, host, port)`. Implementors
/// own TCP/TLS setup and connection pooling; this crate only defines the
/// seam.
pub trait Connector {
    type Stream: Transport;

    fn connect(&mut self, scheme: &str, host: &str, port: u16) -> Result<Self::Stream>;
}

/// Default port for a scheme this client understands. Unknown schemes
/// have no default and must carry an explicit port in the authority.
pub fn default_port(scheme: &str) -> Option<u16> {
    match scheme {
        "http" => Some(80),
        "https" => Some(443),
        _ => None,
    }
}

fn split_authority(authority: &str) -> (&str, Option<u16>) {
    match authority.rsplit_once(':') {
        Some((host, port)) => match port.parse() {
            Ok(p) => (host, Some(p)),
            Err(_) => (authority, None),
        },
        None => (authority, None),
    }
}

/// A fully-prepared, already-absolute request. `uri` must carry a scheme
/// and authority; relative targets are not accepted here — resolve them
/// with [`transform_reference`] before calling in.
pub struct Request {
    pub method: Method,
    pub uri: String,
    pub version: Version,
    pub headers: HeaderList,
    pub body: Vec<u8>,
}

impl Request {
    pub fn new(method: Method, uri: impl Into<String>) -> Self {
        Request {
            method,
            uri: uri.into(),
            version: Version::Http11,
            headers: HeaderList::new(),
            body: Vec::new(),
        }
    }
}

/// A fully-read response, its body collected into memory. Streaming
/// responses for arbitrarily large bodies belongs to the caller driving
/// [`Connection`] directly; `Client` is the convenience layer for
/// bounded-size request/response exchanges, including the redirect loop.
pub struct Response {
    pub status: StatusCode,
    pub version: Version,
    pub headers: HeaderList,
    pub body: Vec<u8>,
}

/// Redirect status codes this client follows (RFC 7231 §6.4, minus the
/// deprecated 300 and 305).
fn is_followable_redirect(status: StatusCode) -> bool {
    status.is_redirection()
}

/// Maximum redirect hops before giving up with [`Error::RedirectLoop`].
pub const DEFAULT_MAX_REDIRECTS: u32 = 10;

/// A request/response client built on a [`Connector`].
pub struct Client<C: Connector> {
    connector: C,
    max_redirects: u32,
    limits: ReadLimits,
}

impl<C: Connector> Client<C> {
    pub fn new(connector: C) -> Self {
        Client {
            connector,
            max_redirects: DEFAULT_MAX_REDIRECTS,
            limits: ReadLimits::default(),
        }
    }

    pub fn with_max_redirects(mut self, max_redirects: u32) -> Self {
        self.max_redirects = max_redirects;
        self
    }

    /// Issue `request`, following redirects up to `max_redirects` hops.
    pub fn execute(&mut self, mut request: Request) -> Result<Response> {
        let mut hops = 0;
        loop {
            let response = self.do_request(&request)?;

            if !is_followable_redirect(response.status) || hops >= self.max_redirects {
                if is_followable_redirect(response.status) && hops >= self.max_redirects {
                    return Err(Error::RedirectLoop);
                }
                return Ok(response);
            }

            let location = response
                .headers
                .first("Location")
                .ok_or(Error::MissingLocation)?;
            let next_uri = transform_reference(&request.uri, location)?;
            debug!(
                "Following {} redirect to {} (hop {})",
                response.status, next_uri, hops
            );

            let next_method = if response.status.0 == 303 {
                Method::Get
            } else {
                request.method.clone()
            };
            let next_body = if matches!(next_method, Method::Get) && !matches!(request.method, Method::Get)
            {
                Vec::new()
            } else {
                request.body.clone()
            };

            request = Request {
                method: next_method,
                uri: next_uri,
                version: request.version,
                headers: request.headers.clone(),
                body: next_body,
            };
            hops += 1;
        }
    }

    fn do_request(&mut self, request: &Request) -> Result<Response> {
        let uri = Uri::parse(&request.uri)?;
        let scheme = uri.scheme.as_deref().ok_or(Error::InvalidUri)?;
        let authority = uri.authority.as_deref().ok_or(Error::InvalidUri)?;
        let (host, port) = split_authority(authority);
        let port = port
            .or_else(|| default_port(scheme))
            .ok_or(Error::InvalidUri)?;

        let stream = self.connector.connect(scheme, host, port)?;
        let mut conn = Connection::with_limits(stream, self.limits);

        let mut target = uri.path.clone();
        if target.is_empty() {
            target.push('/');
        }
        if let Some(query) = &uri.query {
            target.push('?');
            target.push_str(query);
        }

        let mut outgoing = conn.send_request(&request.method, &target, request.version)?;
        for field in request.headers.iter() {
            outgoing.headers_mut().append(field.name(), field.value())?;
        }
        if !outgoing.headers_mut().contains("Host") {
            outgoing.headers_mut().append("Host", host)?;
        }
        if !request.body.is_empty() {
            outgoing.declare_sized(request.body.len() as u64)?;
            outgoing.write_body(&request.body)?;
        }
        outgoing.close()?;

        let mut incoming = conn.receive_response(&request.method)?;
        let status = incoming.status_line.status;
        let version = incoming.status_line.version;
        let headers = incoming.headers().clone();
        let body = incoming.body_mut().read_all()?;
        incoming.close()?;

        Ok(Response {
            status,
            version,
            headers,
            body,
        })
    }
}
