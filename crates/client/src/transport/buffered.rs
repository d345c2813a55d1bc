//! Buffered transport with deadline-aware reads.
//!
//! Every read the client performs is wrapped in the configured read timeout.
//! What a timeout means depends on the caller:
//!
//! - parsing the status line or a header block treats it as a failure
//!   ([`OnTimeout::Fail`])
//! - body reads and chunk-size lines treat it as "nothing more arrived in
//!   time" and settle for the bytes already buffered ([`OnTimeout::TakeBuffered`]);
//!   a server that stalls without closing thereby ends a close-delimited body
//!   early instead of failing it

use std::fmt;
use std::io;
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::time::{Instant, timeout, timeout_at};
use tokio_util::codec::Decoder;
use tracing::trace;

use crate::protocol::ParseError;
use crate::transport::{Io, PeerIdentity};

const INIT_BUFFER_SIZE: usize = 8 * 1024;

/// What a read deadline expiring means for a decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnTimeout {
    /// Fail with [`ParseError::Timeout`].
    Fail,
    /// Decode whatever is buffered as if the stream had ended.
    TakeBuffered,
}

/// An [`Io`] with a read buffer.
pub struct Transport<I> {
    io: I,
    read_buf: BytesMut,
    eof: bool,
    shut_down: bool,
    read_timeout: Duration,
    max_amount: usize,
}

impl<I: Io> Transport<I> {
    /// Wraps `io`; reads wait at most `read_timeout` and return at most `max_amount` bytes.
    pub fn new(io: I, read_timeout: Duration, max_amount: usize) -> Self {
        Self { io, read_buf: BytesMut::with_capacity(INIT_BUFFER_SIZE), eof: false, shut_down: false, read_timeout, max_amount }
    }

    /// Bytes received but not consumed yet.
    pub fn buffered(&self) -> &[u8] {
        &self.read_buf
    }

    /// Whether the peer has closed its sending side.
    pub fn is_eof(&self) -> bool {
        self.eof
    }

    pub fn peer_identity(&self) -> PeerIdentity {
        self.io.peer_identity()
    }

    /// Reads once from the peer into the buffer; 0 means end-of-stream.
    async fn fill(&mut self) -> io::Result<usize> {
        if self.eof {
            return Ok(0);
        }

        self.read_buf.reserve(INIT_BUFFER_SIZE);
        let n = self.io.read_buf(&mut self.read_buf).await?;
        if n == 0 {
            trace!("transport reached end of stream");
            self.eof = true;
        }
        Ok(n)
    }

    /// Runs `decoder` over the stream until it yields an item.
    ///
    /// The read timeout bounds the gap between two reads that make progress,
    /// not the whole decode. At end-of-stream, and on timeout with
    /// [`OnTimeout::TakeBuffered`], the decoder's `decode_eof` decides the
    /// outcome.
    pub async fn decode<D>(&mut self, decoder: &mut D, on_timeout: OnTimeout) -> Result<D::Item, ParseError>
    where
        D: Decoder<Error = ParseError>,
    {
        let mut deadline = Instant::now() + self.read_timeout;
        loop {
            if let Some(item) = decoder.decode(&mut self.read_buf)? {
                return Ok(item);
            }

            if self.eof {
                return self.decode_eof(decoder);
            }

            match timeout_at(deadline, self.fill()).await {
                Ok(filled) => {
                    if filled? > 0 {
                        deadline = Instant::now() + self.read_timeout;
                    }
                }
                Err(_elapsed) if on_timeout == OnTimeout::TakeBuffered => {
                    trace!(buffered = self.read_buf.len(), "read timed out, settle for buffered bytes");
                    return self.decode_eof(decoder);
                }
                Err(_elapsed) => return Err(ParseError::Timeout),
            }
        }
    }

    fn decode_eof<D>(&mut self, decoder: &mut D) -> Result<D::Item, ParseError>
    where
        D: Decoder<Error = ParseError>,
    {
        decoder
            .decode_eof(&mut self.read_buf)?
            .ok_or_else(|| ParseError::incomplete_read(Bytes::new(), None))
    }

    /// Reads up to `max` bytes.
    ///
    /// Buffered bytes are returned first; otherwise this waits for the peer.
    /// The result is empty at end-of-stream and when nothing arrived before
    /// the deadline.
    pub async fn read(&mut self, max: usize) -> Result<Bytes, ParseError> {
        let max = max.min(self.max_amount);
        if max == 0 {
            return Ok(Bytes::new());
        }

        if self.read_buf.is_empty() && !self.eof {
            match timeout(self.read_timeout, self.fill()).await {
                Ok(filled) => {
                    filled?;
                }
                Err(_elapsed) => trace!("read timed out with nothing buffered"),
            }
        }

        Ok(self.take_buffered(max))
    }

    /// Reads exactly `n` bytes.
    ///
    /// Running out of data first, by end-of-stream or by timeout, fails with
    /// [`ParseError::IncompleteRead`] carrying the bytes read and the count
    /// still missing.
    pub async fn read_exact(&mut self, n: usize) -> Result<Bytes, ParseError> {
        if self.read_buf.len() >= n {
            return Ok(self.read_buf.split_to(n).freeze());
        }

        let mut out = BytesMut::with_capacity(n.min(self.max_amount));
        while out.len() < n {
            let chunk = self.read(n - out.len()).await?;
            if chunk.is_empty() {
                let missing = (n - out.len()) as u64;
                return Err(ParseError::incomplete_read(out.freeze(), Some(missing)));
            }
            out.extend_from_slice(&chunk);
        }
        Ok(out.freeze())
    }

    /// Takes up to `max` buffered bytes without touching the peer.
    pub fn take_buffered(&mut self, max: usize) -> Bytes {
        let n = max.min(self.read_buf.len());
        self.read_buf.split_to(n).freeze()
    }

    pub async fn write_all_and_flush(&mut self, data: &[u8]) -> io::Result<()> {
        self.io.write_all(data).await?;
        self.io.flush().await
    }

    /// Shuts down the sending side; later calls do nothing.
    pub async fn shutdown(&mut self) -> io::Result<()> {
        if self.shut_down {
            return Ok(());
        }
        self.shut_down = true;
        self.io.shutdown().await
    }
}

impl<I> fmt::Debug for Transport<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transport")
            .field("buffered", &self.read_buf.len())
            .field("eof", &self.eof)
            .field("read_timeout", &self.read_timeout)
            .finish_non_exhaustive()
    }
}
