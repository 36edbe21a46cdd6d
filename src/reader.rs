//! Reading a request or response: start-line, header block, and the
//! framing decision that picks the matching [`BodyReader`].

use std::io::BufRead;

use crate::body::{BodyLimits, BodyReader, Framing};
use crate::error::{Error, Result};
use crate::field::{validate_name, validate_value};
use crate::headers::HeaderList;
use crate::line::read_line;
use crate::message::{Method, RequestLine, StatusCode, StatusLine, Version};

/// Default bound on a single line (start-line, header line or chunk-size
/// line), including its CRLF terminator.
pub const DEFAULT_MAX_LINE_SIZE: usize = 1024;

/// Default bound on the number of header (or trailer) fields a single
/// message may carry.
pub const DEFAULT_MAX_FIELD_COUNT: usize = 100;

/// Bounds applied while reading a message's start-line and header block.
#[derive(Debug, Clone, Copy)]
pub struct ReadLimits {
    pub max_line_size: usize,
    pub max_field_count: usize,
}

impl Default for ReadLimits {
    fn default() -> Self {
        ReadLimits {
            max_line_size: DEFAULT_MAX_LINE_SIZE,
            max_field_count: DEFAULT_MAX_FIELD_COUNT,
        }
    }
}

impl From<ReadLimits> for BodyLimits {
    fn from(l: ReadLimits) -> Self {
        BodyLimits {
            max_line_size: l.max_line_size,
            max_field_count: l.max_field_count,
        }
    }
}

fn split_start_line(line: &[u8]) -> Result<(&[u8], &[u8], &[u8])> {
    let mut parts = line.splitn(3, |&b| b == b' ');
    let a = parts.next().ok_or(Error::MalformedStartLine)?;
    let b = parts.next().ok_or(Error::MalformedStartLine)?;
    let c = parts.next().ok_or(Error::MalformedStartLine)?;
    if a.is_empty() || b.is_empty() || c.is_empty() {
        return Err(Error::MalformedStartLine);
    }
    Ok((a, b, c))
}

fn parse_version(bytes: &[u8]) -> Result<Version> {
    match bytes {
        b"HTTP/1.1" => Ok(Version::Http11),
        b"HTTP/1.0" => Ok(Version::Http10),
        _ => Err(Error::MalformedStartLine),
    }
}

/// Read a `method SP request-target SP HTTP-version` line.
pub fn read_request_line<R: BufRead>(source: &mut R, limits: ReadLimits) -> Result<RequestLine> {
    let line = read_line(source, limits.max_line_size)?;
    let (method, target, version) = split_start_line(&line)?;
    let method_str = std::str::from_utf8(method).map_err(|_| Error::MalformedStartLine)?;
    let target = std::str::from_utf8(target)
        .map_err(|_| Error::MalformedStartLine)?
        .to_string();
    Ok(RequestLine {
        method: Method::from(method_str),
        target,
        version: parse_version(version)?,
    })
}

/// Read an `HTTP-version SP status-code SP reason-phrase` line.
pub fn read_status_line<R: BufRead>(source: &mut R, limits: ReadLimits) -> Result<StatusLine> {
    let line = read_line(source, limits.max_line_size)?;
    let (version, status, reason) = split_start_line(&line)?;
    let version = parse_version(version)?;
    let status_str = std::str::from_utf8(status).map_err(|_| Error::MalformedStartLine)?;
    let status: u16 = status_str
        .parse()
        .map_err(|_| Error::MalformedStartLine)?;
    let reason = std::str::from_utf8(reason)
        .map_err(|_| Error::MalformedStartLine)?
        .to_string();
    Ok(StatusLine {
        version,
        status: StatusCode(status),
        reason,
    })
}

/// Read header fields until the terminating empty line, bounded by
/// `limits.max_field_count`.
pub fn read_headers<R: BufRead>(source: &mut R, limits: ReadLimits) -> Result<HeaderList> {
    let mut headers = HeaderList::new();
    loop {
        let line = read_line(source, limits.max_line_size)?;
        if line.is_empty() {
            return Ok(headers);
        }
        if headers.len() >= limits.max_field_count {
            return Err(Error::TooManyFields);
        }

        let colon = line
            .iter()
            .position(|&b| b == b':')
            .ok_or(Error::MalformedHeader)?;
        let name = rtrim(&line[..colon]);
        let value = trim(&line[colon + 1..]);

        validate_name(name)?;
        validate_value(value)?;

        let name = std::str::from_utf8(name).map_err(|_| Error::InvalidFieldName)?;
        let value = std::str::from_utf8(value).map_err(|_| Error::InvalidFieldValue)?;
        headers.append(name, value)?;
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

fn trim(bytes: &[u8]) -> &[u8] {
    ltrim(rtrim(bytes))
}

/// The framing discriminant per RFC 7230 §3.3.3: `Transfer-Encoding:
/// chunked` always wins over `Content-Length`; if both are present the
/// `Content-Length` field is stripped to avoid request smuggling via a
/// conflicting pair being forwarded downstream.
pub fn resolve_framing(headers: &mut HeaderList) -> Result<Framing> {
    if headers.has_chunked_transfer_encoding() {
        headers.remove("Content-Length");
        return Ok(Framing::Chunked);
    }

    match headers.first("Content-Length") {
        Some(value) => {
            let len: u64 = value
                .trim()
                .parse()
                .map_err(|_| Error::InvalidContentLength)?;
            Ok(Framing::Sized(len))
        }
        None => Ok(Framing::NoBody),
    }
}

/// RFC 7230 §3.3: whether a response to `method` with this `status` is
/// defined to never carry a body, regardless of any Content-Length or
/// Transfer-Encoding header present on the wire.
pub fn response_is_always_bodyless(method: &Method, status: StatusCode) -> bool {
    method.is_head()
        || (method.is_connect() && status.is_success())
        || status.is_informational()
        || status.is_no_content_class()
}

/// Determine response framing, applying the RFC 7230 §3.3 rules that
/// override any Content-Length/Transfer-Encoding present on the wire.
pub fn resolve_response_framing(
    method: &Method,
    status: StatusCode,
    headers: &mut HeaderList,
) -> Result<Framing> {
    if response_is_always_bodyless(method, status) {
        return Ok(Framing::NoBody);
    }
    resolve_framing(headers)
}

/// Determine request framing. A bodyless method with no framing headers
/// present is `NoBody`; one that declares Content-Length or
/// Transfer-Encoding anyway is still honored (a client is allowed to send
/// a body on e.g. DELETE).
pub fn resolve_request_framing(headers: &mut HeaderList) -> Result<Framing> {
    resolve_framing(headers)
}

/// Build the [`BodyReader`] matching a resolved [`Framing`].
pub fn body_reader_for<'a, R: BufRead>(
    source: &'a mut R,
    framing: Framing,
    limits: ReadLimits,
) -> BodyReader<'a, R> {
    match framing {
        Framing::NoBody => BodyReader::no_body(source),
        Framing::Sized(len) => BodyReader::sized(source, len, limits.into()),
        Framing::Chunked => BodyReader::chunked(source, limits.into()),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::{BufReader, Cursor};

    fn reader(bytes: &'static [u8]) -> BufReader<Cursor<&'static [u8]>> {
        BufReader::new(Cursor::new(bytes))
    }

    #[test]
    fn reads_request_line() {
        let mut r = reader(b"GET /index.html HTTP/1.1\r\n");
        let rl = read_request_line(&mut r, ReadLimits::default()).unwrap();
        assert_eq!(rl.method, Method::Get);
        assert_eq!(rl.target, "/index.html");
        assert_eq!(rl.version, Version::Http11);
    }

    #[test]
    fn rejects_start_line_missing_tokens() {
        let mut r = reader(b"GET /index.html\r\n");
        assert!(matches!(
            read_request_line(&mut r, ReadLimits::default()),
            Err(Error::MalformedStartLine)
        ));
    }

    #[test]
    fn reads_status_line() {
        let mut r = reader(b"HTTP/1.1 404 Not Found\r\n");
        let sl = read_status_line(&mut r, ReadLimits::default()).unwrap();
        assert_eq!(sl.status, StatusCode(404));
        assert_eq!(sl.reason, "Not Found");
    }

    #[test]
    fn reads_headers_until_empty_line() {
        let mut r = reader(b"Host: example.com\r\nX-Test:  value \r\n\r\nBODY");
        let headers = read_headers(&mut r, ReadLimits::default()).unwrap();
        assert_eq!(headers.first("Host"), Some("example.com"));
        // Leading/trailing OWS around the value is stripped.
        assert_eq!(headers.first("X-Test"), Some("value"));
    }

    #[test]
    fn chunked_transfer_encoding_wins_and_strips_content_length() {
        let mut headers = HeaderList::new();
        headers.append("Content-Length", "10").unwrap();
        headers.append("Transfer-Encoding", "chunked").unwrap();
        let framing = resolve_framing(&mut headers).unwrap();
        assert_eq!(framing, Framing::Chunked);
        assert!(!headers.contains("Content-Length"));
    }

    #[test]
    fn sized_framing_from_content_length() {
        let mut headers = HeaderList::new();
        headers.append("Content-Length", "42").unwrap();
        assert_eq!(resolve_framing(&mut headers).unwrap(), Framing::Sized(42));
    }

    #[test]
    fn absent_framing_headers_means_no_body() {
        let mut headers = HeaderList::new();
        assert_eq!(resolve_framing(&mut headers).unwrap(), Framing::NoBody);
    }

    #[test]
    fn head_response_is_always_bodyless_even_with_content_length() {
        let mut headers = HeaderList::new();
        headers.append("Content-Length", "500").unwrap();
        let framing = resolve_response_framing(&Method::Head, StatusCode(200), &mut headers)
            .unwrap();
        assert_eq!(framing, Framing::NoBody);
    }

    #[test]
    fn no_content_and_not_modified_are_bodyless() {
        let mut h1 = HeaderList::new();
        assert_eq!(
            resolve_response_framing(&Method::Get, StatusCode(204), &mut h1).unwrap(),
            Framing::NoBody
        );
        let mut h2 = HeaderList::new();
        assert_eq!(
            resolve_response_framing(&Method::Get, StatusCode(304), &mut h2).unwrap(),
            Framing::NoBody
        );
    }

    #[test]
    fn successful_connect_response_is_bodyless() {
        let mut headers = HeaderList::new();
        let framing =
            resolve_response_framing(&Method::Connect, StatusCode(200), &mut headers).unwrap();
        assert_eq!(framing, Framing::NoBody);
    }
}
