//! The response side of an exchange.
//!
//! [`PendingResponse`] is bound to a transport right after a request was sent.
//! Its [`begin`](PendingResponse::begin) reads the status line and header
//! block, skipping `100 Continue` interim responses, and decides the body
//! framing once. The resulting [`Response`] then serves body reads that honour
//! that framing:
//!
//! - `Content-Length` bodies stop at the declared length, a premature end is
//!   an [`IncompleteRead`](ParseError::IncompleteRead)
//! - chunked bodies are decoded transparently, trailers are discarded
//! - bodies without length information run until the peer closes or stalls
//!
//! Once the body is complete, or on any error, the response gives up its
//! share of the transport.

use std::fmt;

use bytes::{Bytes, BytesMut};
use http::{Method, StatusCode, Version};
use tracing::{debug, trace};

use crate::codec::{ChunkSizeDecoder, HeaderDecoder, LineDecoder, StatusLineDecoder};
use crate::config::ClientConfig;
use crate::protocol::{BodyFraming, Headers, ParseError, ResponseTracker, StatusLine, reason_phrase};
use crate::transport::{Io, OnTimeout, Transport, TransportHandle};

/// A response whose head has not been read yet.
pub struct PendingResponse<I> {
    transport: TransportHandle<I>,
    method: Method,
    config: ClientConfig,
    debug_level: u32,
}

impl<I: Io> PendingResponse<I> {
    pub(crate) fn new(transport: TransportHandle<I>, method: Method, config: ClientConfig, debug_level: u32) -> Self {
        Self { transport, method, config, debug_level }
    }

    /// Reads the status line and headers and decides the body framing.
    ///
    /// On error the transport share is released.
    pub async fn begin(self) -> Result<Response<I>, ParseError> {
        let head = {
            let mut transport = self.transport.lock().await;
            read_head(&mut *transport, &self.config, self.debug_level > 0).await
        };

        let (status_line, version, headers) = match head {
            Ok(head) => head,
            Err(e) => {
                debug!(cause = %e, "failed to read response head");
                release(self.transport).await;
                return Err(e);
            }
        };

        let Ok(status) = StatusCode::from_u16(status_line.status) else {
            release(self.transport).await;
            return Err(ParseError::bad_status_line(status_line.status));
        };

        let (framing, will_close) = BodyFraming::from_head(status, version, &self.method, &headers);
        trace!(%status, ?version, ?framing, will_close, "response head parsed");

        let mut response = Response {
            transport: Some(self.transport),
            status,
            reason: status_line.reason,
            version,
            headers,
            framing,
            will_close,
            body_done: false,
            method: self.method,
            tracker: ResponseTracker::new(),
            config: self.config,
        };

        if response.framing.is_empty() {
            response.body_done = true;
        }

        Ok(response)
    }
}

async fn read_head<I: Io>(
    transport: &mut Transport<I>,
    config: &ClientConfig,
    trace_wire: bool,
) -> Result<(StatusLine, Version, Headers), ParseError> {
    let status_line = loop {
        let status_line = transport.decode(&mut StatusLineDecoder::new(config.max_line), OnTimeout::Fail).await?;
        if trace_wire {
            debug!(version = %status_line.version, status = status_line.status, reason = %status_line.reason, "reply");
        }

        if status_line.status != StatusCode::CONTINUE.as_u16() {
            break status_line;
        }

        let interim = transport
            .decode(&mut HeaderDecoder::new(config.max_line, config.max_headers), OnTimeout::Fail)
            .await?;
        if trace_wire {
            for (name, value) in interim.iter() {
                debug!(field = name, value, "header");
            }
        }
    };

    let version = status_line.http_version()?;

    let headers = transport
        .decode(&mut HeaderDecoder::new(config.max_line, config.max_headers), OnTimeout::Fail)
        .await?;
    if trace_wire {
        for (name, value) in headers.iter() {
            debug!(field = name, value, "header");
        }
    }

    Ok((status_line, version, headers))
}

async fn release<I: Io>(transport: TransportHandle<I>) {
    if let Err(e) = transport.release().await {
        debug!(cause = %e, "failed to shutdown transport");
    }
}

/// A response whose head has been read; serves the body.
pub struct Response<I> {
    /// `None` once the response is closed.
    transport: Option<TransportHandle<I>>,
    status: StatusCode,
    reason: String,
    version: Version,
    headers: Headers,
    framing: BodyFraming,
    will_close: bool,
    body_done: bool,
    method: Method,
    tracker: ResponseTracker,
    config: ClientConfig,
}

impl<I: Io> Response<I> {
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// The reason phrase as sent, or the standard one when the server sent none.
    pub fn reason(&self) -> &str {
        if self.reason.is_empty() {
            reason_phrase(self.status.as_u16()).unwrap_or_default()
        } else {
            &self.reason
        }
    }

    /// `HTTP_10` for HTTP/1.0 and HTTP/0.9 servers, `HTTP_11` for any HTTP/1.x above.
    pub fn version(&self) -> Version {
        self.version
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// All values of a field joined with `", "`.
    pub fn header(&self, name: &str) -> Option<String> {
        self.headers.get_joined(name)
    }

    pub fn header_or(&self, name: &str, default: &str) -> String {
        self.header(name).unwrap_or_else(|| default.to_string())
    }

    pub fn framing(&self) -> BodyFraming {
        self.framing
    }

    pub fn will_close(&self) -> bool {
        self.will_close
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Whether the body is finished or the response was closed.
    pub fn is_closed(&self) -> bool {
        self.transport.is_none()
    }

    pub(crate) fn tracker(&self) -> ResponseTracker {
        self.tracker.clone()
    }

    /// Reads `amount` bytes of body, or the whole remaining body when `None`.
    ///
    /// Returns an empty result once the body is complete.
    pub async fn read(&mut self, amount: Option<usize>) -> Result<Bytes, ParseError> {
        if !self.prepare().await {
            return Ok(Bytes::new());
        }
        let Some(handle) = self.transport.as_ref() else {
            return Ok(Bytes::new());
        };

        let result = {
            let mut transport = handle.lock().await;
            let mut body = BodyReader::new(&mut *transport, &mut self.framing, &mut self.body_done, &self.config);
            match amount {
                Some(amount) => body.read_some(amount).await,
                None => body.read_all().await,
            }
        };
        self.settle(result).await
    }

    /// Reads body bytes into `buf`, returning how many were read; 0 once the body is complete.
    pub async fn read_into(&mut self, buf: &mut [u8]) -> Result<usize, ParseError> {
        let data = self.read(Some(buf.len())).await?;
        buf[..data.len()].copy_from_slice(&data);
        Ok(data.len())
    }

    /// Reads one line of body, terminator included.
    pub async fn read_line(&mut self) -> Result<Bytes, ParseError> {
        if !self.prepare().await {
            return Ok(Bytes::new());
        }
        let Some(handle) = self.transport.as_ref() else {
            return Ok(Bytes::new());
        };

        let result = {
            let mut transport = handle.lock().await;
            BodyReader::new(&mut *transport, &mut self.framing, &mut self.body_done, &self.config)
                .read_line()
                .await
        };
        self.settle(result).await
    }

    /// Reads `count` lines; lines past the end of the body are empty.
    pub async fn read_lines(&mut self, count: usize) -> Result<Vec<Bytes>, ParseError> {
        let mut lines = Vec::with_capacity(count);
        if !self.prepare().await {
            return Ok(lines);
        }
        for _ in 0..count {
            lines.push(self.read_line().await?);
        }
        Ok(lines)
    }

    /// Stops reading and gives up the transport; calling it again does nothing.
    pub async fn close(&mut self) {
        self.tracker.mark_closed();
        if let Some(transport) = self.transport.take() {
            trace!("response closed");
            release(transport).await;
        }
    }

    /// Whether a body read may touch the transport.
    ///
    /// A HEAD response never has a body, and a response closed through its
    /// connection must not read any further.
    async fn prepare(&mut self) -> bool {
        if self.transport.is_some() && (self.method == Method::HEAD || self.tracker.is_closed()) {
            self.close().await;
        }
        self.transport.is_some()
    }

    async fn settle<T>(&mut self, result: Result<T, ParseError>) -> Result<T, ParseError> {
        if result.is_err() || self.body_done {
            self.close().await;
        }
        result
    }
}

impl<I> Drop for Response<I> {
    fn drop(&mut self) {
        self.tracker.mark_closed();
    }
}

impl<I> fmt::Debug for Response<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Response")
            .field("status", &self.status)
            .field("version", &self.version)
            .field("headers", &self.headers)
            .field("framing", &self.framing)
            .field("will_close", &self.will_close)
            .field("closed", &self.transport.is_none())
            .finish_non_exhaustive()
    }
}

impl<I> fmt::Debug for PendingResponse<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingResponse").field("method", &self.method).finish_non_exhaustive()
    }
}

#[inline]
fn clamp_to_usize(n: u64) -> usize {
    usize::try_from(n).unwrap_or(usize::MAX)
}

/// Body reading over a locked transport.
struct BodyReader<'a, I> {
    transport: &'a mut Transport<I>,
    framing: &'a mut BodyFraming,
    done: &'a mut bool,
    config: &'a ClientConfig,
}

impl<'a, I: Io> BodyReader<'a, I> {
    fn new(
        transport: &'a mut Transport<I>,
        framing: &'a mut BodyFraming,
        done: &'a mut bool,
        config: &'a ClientConfig,
    ) -> Self {
        Self { transport, framing, done, config }
    }

    async fn read_all(&mut self) -> Result<Bytes, ParseError> {
        match *self.framing {
            BodyFraming::Empty => {
                *self.done = true;
                Ok(Bytes::new())
            }
            BodyFraming::Length(remaining) => {
                let data = self.transport.read_exact(clamp_to_usize(remaining)).await?;
                *self.framing = BodyFraming::Length(0);
                *self.done = true;
                Ok(data)
            }
            BodyFraming::Chunked { .. } => self.read_all_chunked().await,
            BodyFraming::CloseDelimited => {
                let mut body = BytesMut::new();
                loop {
                    let data = self.transport.read(self.config.max_amount).await?;
                    if data.is_empty() {
                        break;
                    }
                    body.extend_from_slice(&data);
                }
                *self.done = true;
                Ok(body.freeze())
            }
        }
    }

    async fn read_some(&mut self, amount: usize) -> Result<Bytes, ParseError> {
        if amount == 0 {
            return Ok(Bytes::new());
        }

        match *self.framing {
            BodyFraming::Empty | BodyFraming::Length(0) => {
                *self.done = true;
                Ok(Bytes::new())
            }
            BodyFraming::Length(remaining) => {
                let data = self.transport.read(amount.min(clamp_to_usize(remaining))).await?;
                if data.is_empty() {
                    return Err(ParseError::incomplete_read(Bytes::new(), Some(remaining)));
                }
                let remaining = remaining - data.len() as u64;
                *self.framing = BodyFraming::Length(remaining);
                *self.done = remaining == 0;
                Ok(data)
            }
            BodyFraming::Chunked { .. } => self.read_some_chunked(amount).await,
            BodyFraming::CloseDelimited => {
                let data = self.transport.read(amount).await?;
                *self.done = data.is_empty();
                Ok(data)
            }
        }
    }

    async fn read_line(&mut self) -> Result<Bytes, ParseError> {
        let max_line = self.config.max_line;
        match *self.framing {
            BodyFraming::Empty | BodyFraming::Length(0) => {
                *self.done = true;
                Ok(Bytes::new())
            }
            BodyFraming::Length(remaining) => {
                let mut decoder = LineDecoder::new(max_line, "readline").with_limit(clamp_to_usize(remaining));
                let line = self.transport.decode(&mut decoder, OnTimeout::TakeBuffered).await?;
                if line.is_empty() {
                    return Err(ParseError::incomplete_read(Bytes::new(), Some(remaining)));
                }
                let remaining = remaining - line.len() as u64;
                *self.framing = BodyFraming::Length(remaining);
                *self.done = remaining == 0;
                Ok(line)
            }
            BodyFraming::Chunked { .. } => self.read_line_chunked().await,
            BodyFraming::CloseDelimited => {
                let mut decoder = LineDecoder::new(max_line, "readline");
                let line = self.transport.decode(&mut decoder, OnTimeout::TakeBuffered).await?;
                *self.done = line.is_empty();
                Ok(line)
            }
        }
    }

    /// Bytes left in the current chunk, reading the next size line when needed.
    ///
    /// `None` once the last chunk and the trailers have been read.
    async fn chunk_left(&mut self) -> Result<Option<u64>, ParseError> {
        if *self.done {
            return Ok(None);
        }
        let BodyFraming::Chunked { chunk_left } = *self.framing else {
            return Ok(None);
        };

        match chunk_left {
            Some(left) if left > 0 => return Ok(Some(left)),
            // end of a chunk, drop its CRLF
            Some(_) => {
                self.transport.read_exact(2).await?;
            }
            None => {}
        }

        let mut decoder = ChunkSizeDecoder::new(self.config.max_line);
        let size = match self.transport.decode(&mut decoder, OnTimeout::TakeBuffered).await {
            Ok(size) => size,
            Err(ParseError::InvalidChunkSize { line }) => {
                debug!(line = %line, "invalid chunk size, chunked stream out of sync");
                return Err(ParseError::incomplete_read(Bytes::new(), None));
            }
            Err(e) => return Err(e),
        };

        if size == 0 {
            let mut trailers = HeaderDecoder::trailers(self.config.max_line);
            let trailers = self.transport.decode(&mut trailers, OnTimeout::TakeBuffered).await?;
            trace!(trailers = trailers.len(), "last chunk read");
            *self.framing = BodyFraming::Chunked { chunk_left: None };
            *self.done = true;
            return Ok(None);
        }

        *self.framing = BodyFraming::Chunked { chunk_left: Some(size) };
        Ok(Some(size))
    }

    fn consume_chunk(&mut self, left: u64, read: usize) {
        *self.framing = BodyFraming::Chunked { chunk_left: Some(left - read as u64) };
    }

    async fn read_all_chunked(&mut self) -> Result<Bytes, ParseError> {
        let mut body = BytesMut::new();
        loop {
            let left = match self.chunk_left().await {
                Ok(Some(left)) => left,
                Ok(None) => return Ok(body.freeze()),
                Err(e) => return Err(e.prepend_partial(&body)),
            };

            let data = self.transport.read_exact(clamp_to_usize(left)).await.map_err(|e| e.prepend_partial(&body))?;
            self.consume_chunk(left, data.len());
            body.extend_from_slice(&data);
        }
    }

    async fn read_some_chunked(&mut self, amount: usize) -> Result<Bytes, ParseError> {
        let mut out = BytesMut::new();
        while out.len() < amount {
            let left = match self.chunk_left().await {
                Ok(Some(left)) => left,
                Ok(None) => break,
                Err(e) => return Err(e.prepend_partial(&out)),
            };

            let want = clamp_to_usize(left).min(amount - out.len());
            let data = self.transport.read_exact(want).await.map_err(|e| e.prepend_partial(&out))?;
            self.consume_chunk(left, data.len());
            out.extend_from_slice(&data);
        }
        Ok(out.freeze())
    }

    async fn read_line_chunked(&mut self) -> Result<Bytes, ParseError> {
        let max_line = self.config.max_line;
        let mut line = BytesMut::new();
        loop {
            let left = match self.chunk_left().await {
                Ok(Some(left)) => left,
                Ok(None) => return Ok(line.freeze()),
                Err(e) => return Err(e.prepend_partial(&line)),
            };

            let limit = clamp_to_usize(left).min(max_line + 1 - line.len());
            let mut decoder = LineDecoder::new(usize::MAX, "readline").with_limit(limit);
            let part = match self.transport.decode(&mut decoder, OnTimeout::TakeBuffered).await {
                Ok(part) => part,
                Err(e) => return Err(e.prepend_partial(&line)),
            };
            self.consume_chunk(left, part.len());
            line.extend_from_slice(&part);

            if line.ends_with(b"\n") {
                return Ok(line.freeze());
            }
            if line.len() > max_line {
                return Err(ParseError::line_too_long("readline", max_line));
            }
            if part.len() < limit {
                let missing = left - part.len() as u64;
                return Err(ParseError::incomplete_read(line.freeze(), Some(missing)));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use std::time::Duration;
    use tokio::io::{AsyncWriteExt, DuplexStream, duplex};

    fn config() -> ClientConfig {
        ClientConfig::builder().read_timeout(Duration::from_millis(100)).build()
    }

    /// Serves `wire` (with `\n` turned into CRLF) and returns the pending response reading it.
    async fn pending(wire: &str, method: Method, close: bool) -> (PendingResponse<DuplexStream>, DuplexStream) {
        pending_raw(wire.replace('\n', "\r\n").as_bytes(), method, close).await
    }

    async fn pending_raw(wire: &[u8], method: Method, close: bool) -> (PendingResponse<DuplexStream>, DuplexStream) {
        let (client, mut server) = duplex(64 * 1024);
        server.write_all(wire).await.unwrap();
        if close {
            server.shutdown().await.unwrap();
        }
        let config = config();
        let transport = TransportHandle::new(Transport::new(client, config.read_timeout, config.max_amount));
        (PendingResponse::new(transport, method, config, 0), server)
    }

    #[tokio::test]
    async fn content_length_body() {
        let wire = indoc! {"
        HTTP/1.1 200 OK
        Content-Length: 10

        0123456789"};
        let (pending, _server) = pending(wire, Method::GET, false).await;
        let mut response = pending.begin().await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.framing(), BodyFraming::Length(10));
        assert!(!response.will_close());

        let mut total = Vec::new();
        total.extend_from_slice(&response.read(Some(3)).await.unwrap());
        let mut buf = [0u8; 4];
        let n = response.read_into(&mut buf).await.unwrap();
        total.extend_from_slice(&buf[..n]);
        total.extend_from_slice(&response.read(Some(100)).await.unwrap());

        assert_eq!(total, b"0123456789");
        assert!(response.is_closed());
        assert!(response.read(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn chunked_body() {
        let wire = "HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n4\r\nWiki\r\n5\r\npedia\r\n0\r\n\r\n";
        let (pending, _server) = pending_raw(wire.as_bytes(), Method::GET, false).await;
        let mut response = pending.begin().await.unwrap();

        assert!(response.framing().is_chunked());
        assert_eq!(&response.read(None).await.unwrap()[..], b"Wikipedia");
        assert!(response.is_closed());
    }

    #[tokio::test]
    async fn chunked_reads_cross_chunk_boundaries() {
        let wire = "HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n4;ext=1\r\nWiki\r\n5\r\npedia\r\n0\r\nExpires: never\r\n\r\n";
        let (pending, _server) = pending_raw(wire.as_bytes(), Method::GET, false).await;
        let mut response = pending.begin().await.unwrap();

        assert_eq!(&response.read(Some(6)).await.unwrap()[..], b"Wikipe");
        assert_eq!(&response.read(Some(6)).await.unwrap()[..], b"dia");
        assert!(response.is_closed());
    }

    #[tokio::test]
    async fn invalid_chunk_size_is_incomplete_read() {
        let wire = "HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n4\r\nWiki\r\nzz\r\npedia\r\n0\r\n\r\n";
        let (pending, _server) = pending_raw(wire.as_bytes(), Method::GET, false).await;
        let mut response = pending.begin().await.unwrap();

        let err = response.read(None).await.unwrap_err();
        match err {
            ParseError::IncompleteRead { partial, .. } => assert_eq!(&partial[..], b"Wiki"),
            other => panic!("unexpected error {other}"),
        }
        assert!(response.is_closed());
    }

    #[tokio::test]
    async fn chunked_read_line() {
        let wire = "HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n6\r\nfirst\n\r\n3\r\nsec\r\n5\r\nond\r\n\r\n0\r\n\r\n";
        let (pending, _server) = pending_raw(wire.as_bytes(), Method::GET, false).await;
        let mut response = pending.begin().await.unwrap();

        let lines = response.read_lines(3).await.unwrap();
        assert_eq!(&lines[0][..], b"first\n");
        assert_eq!(&lines[1][..], b"second\r\n");
        assert!(lines[2].is_empty());
        assert!(response.is_closed());
    }

    #[tokio::test]
    async fn chunked_read_line_too_long() {
        let wire = "HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n10\r\n0123456789abcdef\r\n0\r\n\r\n";
        let (pending, _server) = pending_raw(wire.as_bytes(), Method::GET, false).await;
        let mut response = pending.begin().await.unwrap();
        response.config.max_line = 8;

        let err = response.read_line().await.unwrap_err();
        assert!(matches!(err, ParseError::LineTooLong { line_type: "readline", max: 8 }));
        assert!(response.is_closed());
    }

    #[tokio::test]
    async fn chunked_read_line_keeps_partial_line_across_chunks() {
        let wire = "HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n3\r\nabc\r\n5\r\nde";
        let (pending, _server) = pending_raw(wire.as_bytes(), Method::GET, true).await;
        let mut response = pending.begin().await.unwrap();

        match response.read_line().await.unwrap_err() {
            ParseError::IncompleteRead { partial, expected } => {
                assert_eq!(&partial[..], b"abcde");
                assert_eq!(expected, Some(3));
            }
            other => panic!("unexpected error {other}"),
        }
        assert!(response.is_closed());
    }

    #[tokio::test]
    async fn slow_header_lines_within_read_timeout() {
        let (client, mut server) = duplex(64 * 1024);
        let config = config();
        let transport = TransportHandle::new(Transport::new(client, config.read_timeout, config.max_amount));
        let pending = PendingResponse::new(transport, Method::GET, config, 0);

        let writer = tokio::spawn(async move {
            let lines = ["HTTP/1.1 200 OK\r\n", "A: 1\r\n", "B: 2\r\n", "C: 3\r\n", "Content-Length: 2\r\n", "\r\nok"];
            for line in lines {
                server.write_all(line.as_bytes()).await.unwrap();
                tokio::time::sleep(Duration::from_millis(60)).await;
            }
            server
        });

        // 100ms read timeout, 300ms for the whole head
        let mut response = pending.begin().await.unwrap();
        assert_eq!(response.header("c").as_deref(), Some("3"));
        assert_eq!(&response.read(None).await.unwrap()[..], b"ok");
        drop(writer.await.unwrap());
    }

    #[tokio::test]
    async fn length_read_line_stays_inside_body() {
        let wire = indoc! {"
        HTTP/1.1 200 OK
        Content-Length: 8

        one
        two
        HTTP/1.1 200 OK"};
        let (pending, _server) = pending(wire, Method::GET, false).await;
        let mut response = pending.begin().await.unwrap();

        assert_eq!(&response.read_line().await.unwrap()[..], b"one\r\n");
        assert_eq!(&response.read_line().await.unwrap()[..], b"two");
        assert!(response.is_closed());
    }

    #[tokio::test]
    async fn skips_continue_responses() {
        let wire = indoc! {"
        HTTP/1.1 100 Continue

        HTTP/1.1 100 Continue
        X-Interim: yes

        HTTP/1.1 200 OK
        Content-Length: 2

        ok"};
        let (pending, _server) = pending(wire, Method::POST, false).await;
        let mut response = pending.begin().await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(!response.headers().contains("x-interim"));
        assert_eq!(&response.read(None).await.unwrap()[..], b"ok");
    }

    #[tokio::test]
    async fn head_response_has_no_body() {
        let wire = indoc! {"
        HTTP/1.1 200 OK
        Content-Length: 1000

        "};
        let (pending, _server) = pending(wire, Method::HEAD, false).await;
        let mut response = pending.begin().await.unwrap();

        assert!(!response.is_closed());
        assert!(response.read(None).await.unwrap().is_empty());
        assert!(response.is_closed());
    }

    #[tokio::test]
    async fn http10_without_length_reads_until_close() {
        let wire = indoc! {"
        HTTP/1.0 200 OK
        Server: old

        hello world"};
        let (pending, _server) = pending(wire, Method::GET, true).await;
        let mut response = pending.begin().await.unwrap();

        assert_eq!(response.version(), Version::HTTP_10);
        assert!(response.will_close());
        assert_eq!(response.framing(), BodyFraming::CloseDelimited);
        assert_eq!(&response.read(None).await.unwrap()[..], b"hello world");
        assert!(response.is_closed());
    }

    #[tokio::test]
    async fn stalled_close_delimited_body_settles_for_buffered_bytes() {
        let wire = indoc! {"
        HTTP/1.0 200 OK

        partial body"};
        let (pending, server) = pending(wire, Method::GET, false).await;
        let mut response = pending.begin().await.unwrap();

        // the server neither sends more nor closes
        assert_eq!(&response.read(None).await.unwrap()[..], b"partial body");
        assert!(response.is_closed());
        drop(server);
    }

    #[tokio::test]
    async fn truncated_length_body_is_incomplete_read() {
        let wire = indoc! {"
        HTTP/1.1 200 OK
        Content-Length: 10

        short"};
        let (pending, _server) = pending(wire, Method::GET, true).await;
        let mut response = pending.begin().await.unwrap();

        match response.read(None).await.unwrap_err() {
            ParseError::IncompleteRead { partial, expected } => {
                assert_eq!(&partial[..], b"short");
                assert_eq!(expected, Some(5));
            }
            other => panic!("unexpected error {other}"),
        }
        assert!(response.is_closed());
    }

    #[tokio::test]
    async fn bad_status_lines() {
        let (pending, _server) = pending_raw(b"", Method::GET, true).await;
        assert!(matches!(pending.begin().await, Err(ParseError::BadStatusLine { .. })));

        let (pending, _server) = pending_raw(b"SSH-2.0-OpenSSH\r\n\r\n", Method::GET, true).await;
        assert!(matches!(pending.begin().await, Err(ParseError::BadStatusLine { .. })));

        let (pending, _server) = pending_raw(b"HTTP/2.0 200 OK\r\n\r\n", Method::GET, true).await;
        assert!(matches!(pending.begin().await, Err(ParseError::UnknownProtocol { .. })));
    }

    #[tokio::test]
    async fn empty_reason_uses_standard_phrase() {
        let (pending, _server) = pending_raw(b"HTTP/1.1 404\r\nContent-Length: 0\r\n\r\n", Method::GET, false).await;
        let response = pending.begin().await.unwrap();
        assert_eq!(response.reason(), "Not Found");
        assert_eq!(response.header_or("x-missing", "none"), "none");
    }

    #[tokio::test]
    async fn close_is_idempotent() {
        let (pending, _server) = pending_raw(b"HTTP/1.1 200 OK\r\nContent-Length: 5\r\n\r\nhello", Method::GET, false).await;
        let mut response = pending.begin().await.unwrap();
        let tracker = response.tracker();

        response.close().await;
        response.close().await;
        assert!(response.is_closed());
        assert!(tracker.is_closed());
        assert!(response.read(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn closed_tracker_stops_reads() {
        let (pending, _server) = pending_raw(b"HTTP/1.1 200 OK\r\nContent-Length: 5\r\n\r\nhello", Method::GET, false).await;
        let mut response = pending.begin().await.unwrap();

        response.tracker().mark_closed();
        assert!(response.read(None).await.unwrap().is_empty());
        assert!(response.is_closed());
    }
}
