use std::fmt;
use std::io;

/// Errors produced by the codec, the body streams and the connection facade.
///
/// All parse errors are fatal for the message being processed: the caller
/// should close the connection rather than attempt to resync the stream.
#[derive(Debug)]
#[non_exhaustive]
pub enum Error {
    /// A header or trailer field name contained an octet outside the
    /// accepted `token` alphabet.
    InvalidFieldName,

    /// A header or trailer field value contained an octet outside the
    /// accepted visible-ASCII/SP/HTAB alphabet.
    InvalidFieldValue,

    /// A header line had no `:` separator.
    MalformedHeader,

    /// A line did not end in CRLF within the configured bound.
    UnterminatedLine,

    /// A header or trailer block exceeded `max_field_count`.
    TooManyFields,

    /// `Content-Length` was present but not a valid non-negative integer.
    InvalidContentLength,

    /// A chunk-size line was not a valid hexadecimal integer.
    InvalidChunkSize,

    /// The request-line or status-line did not have three tokens.
    MalformedStartLine,

    /// The transport accepted fewer bytes than were offered.
    ShortWrite,

    /// An operation was attempted on a connection after `close`.
    ConnectionClosed,

    /// `send_request`/`receive_request` was called while the previous
    /// message's reader or writer was still open.
    PriorMessageOpen,

    /// A non-blocking transport would have blocked; the caller owns
    /// retrying.
    BlockingWouldBlock,

    /// The redirect follower exceeded its configured hop budget.
    RedirectLoop,

    /// A redirect status was received without a `Location` header.
    MissingLocation,

    /// A URI reference could not be resolved against a base.
    InvalidUri,

    /// The underlying transport reported an I/O error.
    Io(io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        if e.kind() == io::ErrorKind::WouldBlock {
            Error::BlockingWouldBlock
        } else {
            Error::Io(e)
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Error::*;
        match self {
            InvalidFieldName => write!(f, "invalid header field name"),
            InvalidFieldValue => write!(f, "invalid header field value"),
            MalformedHeader => write!(f, "header line missing ':' separator"),
            UnterminatedLine => write!(f, "line did not end in CRLF within bounds"),
            TooManyFields => write!(f, "too many header or trailer fields"),
            InvalidContentLength => write!(f, "invalid Content-Length value"),
            InvalidChunkSize => write!(f, "invalid chunk size"),
            MalformedStartLine => write!(f, "malformed request-line or status-line"),
            ShortWrite => write!(f, "transport accepted fewer bytes than offered"),
            ConnectionClosed => write!(f, "operation invoked after connection close"),
            PriorMessageOpen => write!(f, "previous message on this connection was not closed"),
            BlockingWouldBlock => write!(f, "transport would block"),
            RedirectLoop => write!(f, "exceeded maximum number of redirects"),
            MissingLocation => write!(f, "redirect response had no Location header"),
            InvalidUri => write!(f, "invalid URI reference"),
            Io(e) => write!(f, "io error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}
