//! Request bodies.
//!
//! A body is either fully in memory or produced while it is being sent:
//!
//! - [`RequestBody::Bytes`] and [`RequestBody::Text`] are written in one go;
//!   text is encoded as ISO-8859-1
//! - [`RequestBody::Reader`] is any `AsyncRead`, copied in blocks of the
//!   configured block size; a text reader is re-encoded block by block
//! - [`RequestBody::Stream`] is any [`http_body::Body`] of `Bytes`, written one
//!   data frame at a time

use std::fmt;
use std::pin::Pin;

use bytes::{Bytes, BytesMut};
use http_body::{Body, Frame};
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, StreamBody};
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::debug;

use crate::protocol::SendError;
use crate::transport::{Io, Transport};
use crate::utils::string_to_latin1;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The body of a request.
pub enum RequestBody {
    Bytes(Bytes),
    Text(String),
    Reader {
        reader: Pin<Box<dyn AsyncRead + Send>>,
        /// Decode the reader as UTF-8 and send it as ISO-8859-1.
        text: bool,
        len: Option<u64>,
    },
    Stream(UnsyncBoxBody<Bytes, BoxError>),
}

impl RequestBody {
    pub fn empty() -> Self {
        Self::Bytes(Bytes::new())
    }

    /// A binary reader; `len` becomes the `Content-Length` when known.
    pub fn reader<R>(reader: R, len: Option<u64>) -> Self
    where
        R: AsyncRead + Send + 'static,
    {
        Self::Reader { reader: Box::pin(reader), text: false, len }
    }

    /// A reader of UTF-8 text, re-encoded as ISO-8859-1 while it is sent.
    pub fn text_reader<R>(reader: R) -> Self
    where
        R: AsyncRead + Send + 'static,
    {
        Self::Reader { reader: Box::pin(reader), text: true, len: None }
    }

    /// A file, sized from its metadata.
    pub async fn file(file: tokio::fs::File) -> std::io::Result<Self> {
        let len = file.metadata().await?.len();
        Ok(Self::reader(file, Some(len)))
    }

    pub fn stream<B>(body: B) -> Self
    where
        B: Body<Data = Bytes> + Send + 'static,
        B::Error: Into<BoxError>,
    {
        Self::Stream(UnsyncBoxBody::new(body.map_err(Into::<BoxError>::into)))
    }

    /// A body made of the given chunks, sent in order.
    pub fn chunks<I>(chunks: I) -> Self
    where
        I: IntoIterator + 'static,
        I::Item: Into<Bytes> + 'static,
        I::IntoIter: Send + 'static,
    {
        let frames = chunks.into_iter().map(|chunk| Ok::<_, BoxError>(Frame::data(chunk.into())));
        Self::Stream(UnsyncBoxBody::new(StreamBody::new(futures::stream::iter(frames))))
    }

    /// The body length, when it can be known before sending.
    ///
    /// Text counts one byte per character, as it is sent in ISO-8859-1.
    pub fn content_length(&self) -> Option<u64> {
        match self {
            Self::Bytes(bytes) => Some(bytes.len() as u64),
            Self::Text(text) => Some(text.chars().count() as u64),
            Self::Reader { len, .. } => *len,
            Self::Stream(body) => body.size_hint().exact(),
        }
    }

    /// Turns text into its ISO-8859-1 bytes; other bodies are left alone.
    pub(crate) fn encode_text(self) -> Result<Self, SendError> {
        match self {
            Self::Text(text) => Ok(Self::Bytes(encode_latin1(&text)?.into())),
            other => Ok(other),
        }
    }

    /// Writes the whole body, flushing after every write.
    pub(crate) async fn write_to<I: Io>(
        self,
        transport: &mut Transport<I>,
        block_size: usize,
        trace_wire: bool,
    ) -> Result<(), SendError> {
        match self {
            Self::Bytes(bytes) => write_block(transport, &bytes, trace_wire).await,
            Self::Text(text) => write_block(transport, &encode_latin1(&text)?, trace_wire).await,
            Self::Reader { mut reader, text, .. } => {
                if trace_wire {
                    debug!(text, "send a reader body");
                }
                let mut block = BytesMut::with_capacity(block_size);
                // incomplete UTF-8 sequence left over from the previous block
                let mut pending = Vec::new();
                loop {
                    block.clear();
                    let n = (&mut reader).take(block_size as u64).read_buf(&mut block).await?;
                    if n == 0 {
                        if !pending.is_empty() {
                            return Err(SendError::invalid_body("text reader ended inside a UTF-8 sequence"));
                        }
                        return Ok(());
                    }

                    if text {
                        pending.extend_from_slice(&block);
                        let encoded = decode_utf8_prefix(&mut pending)?;
                        write_block(transport, &encoded, trace_wire).await?;
                    } else {
                        write_block(transport, &block, trace_wire).await?;
                    }
                }
            }
            Self::Stream(mut body) => {
                while let Some(frame) = body.frame().await {
                    let frame = frame.map_err(|e| SendError::invalid_body(format!("resolve request body error: {e}")))?;
                    // trailers have no place in a non-chunked request
                    if let Ok(data) = frame.into_data() {
                        write_block(transport, &data, trace_wire).await?;
                    }
                }
                Ok(())
            }
        }
    }
}

async fn write_block<I: Io>(transport: &mut Transport<I>, data: &[u8], trace_wire: bool) -> Result<(), SendError> {
    if trace_wire {
        debug!(len = data.len(), data = ?Bytes::copy_from_slice(data), "send");
    }
    transport.write_all_and_flush(data).await?;
    Ok(())
}

fn encode_latin1(text: &str) -> Result<Vec<u8>, SendError> {
    string_to_latin1(text)
        .map_err(|c| SendError::invalid_body(format!("character {c:?} can not be encoded as ISO-8859-1")))
}

/// Encodes the longest valid UTF-8 prefix of `pending` as ISO-8859-1, keeping the incomplete tail.
fn decode_utf8_prefix(pending: &mut Vec<u8>) -> Result<Vec<u8>, SendError> {
    let valid_up_to = match std::str::from_utf8(pending) {
        Ok(_) => pending.len(),
        Err(e) if e.error_len().is_none() => e.valid_up_to(),
        Err(e) => return Err(SendError::invalid_body(format!("text reader is not UTF-8: {e}"))),
    };

    let tail = pending.split_off(valid_up_to);
    let text = String::from_utf8(std::mem::replace(pending, tail))
        .map_err(|e| SendError::invalid_body(format!("text reader is not UTF-8: {e}")))?;
    encode_latin1(&text)
}

impl From<Bytes> for RequestBody {
    fn from(bytes: Bytes) -> Self {
        Self::Bytes(bytes)
    }
}

impl From<Vec<u8>> for RequestBody {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes.into())
    }
}

impl From<&'static [u8]> for RequestBody {
    fn from(bytes: &'static [u8]) -> Self {
        Self::Bytes(Bytes::from_static(bytes))
    }
}

impl From<String> for RequestBody {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for RequestBody {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

impl fmt::Debug for RequestBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bytes(bytes) => f.debug_tuple("Bytes").field(&bytes.len()).finish(),
            Self::Text(text) => f.debug_tuple("Text").field(&text.len()).finish(),
            Self::Reader { text, len, .. } => f.debug_struct("Reader").field("text", text).field("len", len).finish(),
            Self::Stream(body) => f.debug_tuple("Stream").field(&body.size_hint()).finish(),
        }
    }
}
