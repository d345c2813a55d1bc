//! Response body framing.
//!
//! The framing of a response body is decided once, right after its header
//! block has been parsed, from the status code, the request method, the
//! protocol version and the `Transfer-Encoding`/`Content-Length`/`Connection`
//! fields. See [`BodyFraming::from_head`].

use http::{Method, StatusCode, Version};

use crate::protocol::Headers;

/// How the end of a response body is determined.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BodyFraming {
    /// The body is empty whatever the headers say (204, 304, 1xx, or a HEAD request).
    Empty,
    /// A `Content-Length` body; holds the bytes still to be read.
    Length(u64),
    /// A chunked body.
    ///
    /// `chunk_left` is `None` when the next chunk-size line must be read,
    /// `Some(0)` at the end of a chunk whose CRLF has not been consumed yet,
    /// and `Some(n)` while `n` data bytes of the current chunk remain.
    Chunked { chunk_left: Option<u64> },
    /// No length information; the body ends when the peer closes the transport.
    CloseDelimited,
}

impl BodyFraming {
    /// Decides the framing and the will-close flag for a response.
    ///
    /// Rules, applied in order:
    /// 1. `Transfer-Encoding` containing `chunked` selects chunked framing and
    ///    makes any `Content-Length` irrelevant.
    /// 2. Otherwise a non-negative integer `Content-Length` selects length framing;
    ///    a malformed or negative one is ignored.
    /// 3. 204, 304, any 1xx status and HEAD requests always have an empty body.
    /// 4. will-close follows the per-version policy of [`will_close`].
    /// 5. A body with no length and no chunking can only end at connection close,
    ///    so will-close is forced on.
    pub fn from_head(status: StatusCode, version: Version, method: &Method, headers: &Headers) -> (Self, bool) {
        let chunked = headers.contains_token("transfer-encoding", "chunked");

        let length = if chunked {
            None
        } else {
            headers
                .get("content-length")
                .and_then(|value| value.trim().parse::<i64>().ok())
                .and_then(|length| u64::try_from(length).ok())
        };

        let empty = status == StatusCode::NO_CONTENT
            || status == StatusCode::NOT_MODIFIED
            || status.is_informational()
            || *method == Method::HEAD;

        let framing = match (empty, chunked, length) {
            (true, _, _) => BodyFraming::Empty,
            (false, true, _) => BodyFraming::Chunked { chunk_left: None },
            (false, false, Some(length)) => BodyFraming::Length(length),
            (false, false, None) => BodyFraming::CloseDelimited,
        };

        let will_close = will_close(version, headers) || framing == BodyFraming::CloseDelimited;

        (framing, will_close)
    }

    #[inline]
    pub fn is_chunked(&self) -> bool {
        matches!(self, BodyFraming::Chunked { .. })
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        matches!(self, BodyFraming::Empty)
    }
}

/// Whether the peer will close the transport once the response is complete.
///
/// HTTP/1.1 stays open unless `Connection` says `close`. HTTP/1.0 closes
/// unless the server opted into persistence through `Keep-Alive` or a
/// `keep-alive` token in `Connection` or the non-standard `Proxy-Connection`.
pub fn will_close(version: Version, headers: &Headers) -> bool {
    if version == Version::HTTP_11 {
        return headers.contains_token("connection", "close");
    }

    if headers.get("keep-alive").is_some_and(|value| !value.is_empty()) {
        return false;
    }

    !(headers.contains_token("connection", "keep-alive") || headers.contains_token("proxy-connection", "keep-alive"))
}
