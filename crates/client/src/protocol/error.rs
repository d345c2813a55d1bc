use bytes::{Bytes, BytesMut};
use std::io;
use thiserror::Error;

/// Top-level error returned by every public operation of the client.
#[derive(Debug, Error)]
pub enum HttpError {
    #[error("state error: {source}")]
    State {
        #[from]
        source: StateError,
    },

    #[error("response error: {source}")]
    Parse {
        #[from]
        source: ParseError,
    },

    #[error("request error: {source}")]
    Send {
        #[from]
        source: SendError,
    },

    #[error("invalid url: {reason}")]
    InvalidUrl { reason: String },

    #[error("tunnel connection failed: {status} {message}")]
    TunnelFailed { status: u16, message: String },

    #[error("connect error: {source}")]
    Connect { source: io::Error },
}

impl HttpError {
    pub fn invalid_url<S: ToString>(str: S) -> Self {
        Self::InvalidUrl { reason: str.to_string() }
    }

    pub fn tunnel_failed<S: ToString>(status: u16, message: S) -> Self {
        Self::TunnelFailed { status, message: message.to_string() }
    }

    pub fn connect<E: Into<io::Error>>(e: E) -> Self {
        Self::Connect { source: e.into() }
    }

    /// Returns the parse error, if this is one.
    pub fn as_parse_error(&self) -> Option<&ParseError> {
        match self {
            Self::Parse { source } => Some(source),
            _ => None,
        }
    }

    /// Returns the sequencing error, if this is one.
    pub fn as_state_error(&self) -> Option<&StateError> {
        match self {
            Self::State { source } => Some(source),
            _ => None,
        }
    }
}

/// Calls made in an order the connection state machine does not allow.
///
/// These are always caller bugs and are never retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    #[error("cannot send request in state {state}")]
    CannotSendRequest { state: &'static str },

    #[error("cannot send header in state {state}")]
    CannotSendHeader { state: &'static str },

    #[error("response not ready in state {state}")]
    ResponseNotReady { state: &'static str },

    #[error("can't set up tunnel for established connection")]
    TunnelAfterConnect,
}

/// Errors raised while reading a response off the transport.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("bad status line: {line}")]
    BadStatusLine { line: String },

    #[error("unknown protocol: {version}")]
    UnknownProtocol { version: String },

    #[error("got more than {max} bytes when reading {line_type}")]
    LineTooLong { line_type: &'static str, max: usize },

    #[error("got more than {max_num} headers")]
    TooManyHeaders { max_num: usize },

    #[error(
        "IncompleteRead({} bytes read{})",
        .partial.len(),
        .expected.map(|n| format!(", {n} more expected")).unwrap_or_default()
    )]
    IncompleteRead { partial: Bytes, expected: Option<u64> },

    #[error("invalid chunk size line: {line:?}")]
    InvalidChunkSize { line: String },

    #[error("read timed out")]
    Timeout,

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl ParseError {
    pub fn bad_status_line<S: ToString>(line: S) -> Self {
        Self::BadStatusLine { line: line.to_string() }
    }

    pub fn unknown_protocol<S: ToString>(version: S) -> Self {
        Self::UnknownProtocol { version: version.to_string() }
    }

    pub fn line_too_long(line_type: &'static str, max: usize) -> Self {
        Self::LineTooLong { line_type, max }
    }

    pub fn too_many_headers(max_num: usize) -> Self {
        Self::TooManyHeaders { max_num }
    }

    pub fn incomplete_read(partial: Bytes, expected: Option<u64>) -> Self {
        Self::IncompleteRead { partial, expected }
    }

    pub fn invalid_chunk_size<S: ToString>(line: S) -> Self {
        Self::InvalidChunkSize { line: line.to_string() }
    }

    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }

    pub fn is_incomplete_read(&self) -> bool {
        matches!(self, Self::IncompleteRead { .. })
    }

    /// Prefixes the partial bytes of an incomplete read with data read earlier in the same call.
    pub(crate) fn prepend_partial(self, prefix: &[u8]) -> Self {
        match self {
            Self::IncompleteRead { partial, expected } if !prefix.is_empty() => {
                let mut joined = BytesMut::with_capacity(prefix.len() + partial.len());
                joined.extend_from_slice(prefix);
                joined.extend_from_slice(&partial);
                Self::IncompleteRead { partial: joined.freeze(), expected }
            }
            other => other,
        }
    }
}

/// Errors raised while writing a request to the transport.
#[derive(Error, Debug)]
pub enum SendError {
    #[error("not connected")]
    NotConnected,

    #[error("invalid body: {reason}")]
    InvalidBody { reason: String },

    #[error("invalid header name: {name:?}")]
    InvalidHeader { name: String },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl SendError {
    pub fn invalid_body<S: ToString>(str: S) -> Self {
        Self::InvalidBody { reason: str.to_string() }
    }

    pub fn invalid_header<S: ToString>(name: S) -> Self {
        Self::InvalidHeader { name: name.to_string() }
    }

    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }
}
