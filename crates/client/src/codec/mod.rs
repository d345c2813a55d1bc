//! HTTP/1.1 client codecs.
//!
//! This module turns bytes into protocol elements and back, using the
//! [`Decoder`](tokio_util::codec::Decoder) and [`Encoder`](tokio_util::codec::Encoder)
//! traits over [`BytesMut`](bytes::BytesMut).
//!
//! # Architecture
//!
//! - Response side:
//!   - [`LineDecoder`]: splits the stream into length-capped lines
//!   - [`StatusLineDecoder`]: parses the status line
//!   - [`HeaderDecoder`]: parses a header block or chunked trailers
//!   - [`ChunkSizeDecoder`]: parses chunk-size lines of a chunked body
//!
//! - Request side:
//!   - [`HeadEncoder`]: writes the request line, header fields and the closing blank line
//!
//! Decoders return `Ok(None)` while more bytes are needed. Their `decode_eof`
//! variants define what a truncated stream means for each element, which is
//! also what the transport falls back to when a lenient read times out.
//!
//! # Example
//!
//! ```
//! use bytes::BytesMut;
//! use micro_http_client::codec::{HeaderDecoder, StatusLineDecoder};
//! use tokio_util::codec::Decoder;
//!
//! let mut buf = BytesMut::from(&b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\n\r\nhi"[..]);
//!
//! let status = StatusLineDecoder::new(65536).decode(&mut buf).unwrap().unwrap();
//! assert_eq!(status.status, 200);
//!
//! let headers = HeaderDecoder::new(65536, 100).decode(&mut buf).unwrap().unwrap();
//! assert_eq!(headers.get("content-length"), Some("2"));
//! assert_eq!(&buf[..], b"hi");
//! ```

mod body;
mod header;
mod line_decoder;
mod status_decoder;

pub use body::ChunkSizeDecoder;
pub use body::parse_chunk_size;
pub use header::HeadEncoder;
pub use header::HeadLine;
pub use header::HeaderDecoder;
pub use line_decoder::LineDecoder;
pub use status_decoder::StatusLineDecoder;
pub use status_decoder::parse_status_line;
