//! Decoder for the size line of a chunk in chunked transfer encoding.
//!
//! A chunked body is a sequence of `<hex-size>[;extension]\r\n<data>\r\n`
//! segments closed by a zero-size chunk, see
//! [RFC 9112 Section 7.1](https://www.rfc-editor.org/rfc/rfc9112#section-7.1).
//!
//! Only the size line is decoded here; the response reads the chunk data and
//! its terminator directly so that reads can stop anywhere inside a chunk.
//! Extensions are accepted and discarded.

use bytes::{Bytes, BytesMut};
use tokio_util::codec::Decoder;
use tracing::trace;

use crate::codec::LineDecoder;
use crate::protocol::ParseError;
use crate::utils::latin1_to_string;

/// Reads one chunk-size line and yields the size.
#[derive(Debug, Clone)]
pub struct ChunkSizeDecoder {
    lines: LineDecoder,
}

impl ChunkSizeDecoder {
    pub fn new(max_line: usize) -> Self {
        Self { lines: LineDecoder::new(max_line, "chunk size") }
    }
}

impl Decoder for ChunkSizeDecoder {
    type Item = u64;
    type Error = ParseError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        self.lines.decode(src)?.map(|line| parse_chunk_size(&line)).transpose()
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        self.lines.decode_eof(src)?.map(|line| parse_chunk_size(&line)).transpose()
    }
}

/// Parses `<hex-size>[;extension]` with surrounding whitespace and line terminator.
pub fn parse_chunk_size(line: &Bytes) -> Result<u64, ParseError> {
    macro_rules! or_invalid {
        ($e:expr) => {
            match $e {
                Some(val) => val,
                None => return Err(ParseError::invalid_chunk_size(latin1_to_string(line))),
            }
        };
    }

    let size_part = match line.iter().position(|b| *b == b';') {
        Some(index) => &line[..index],
        None => &line[..],
    };
    let digits = size_part.trim_ascii();

    if digits.is_empty() {
        return Err(ParseError::invalid_chunk_size(latin1_to_string(line)));
    }

    let radix = 16;
    let mut size: u64 = 0;
    for b in digits {
        let digit = or_invalid!(char::from(*b).to_digit(radix));
        size = or_invalid!(size.checked_mul(u64::from(radix)));
        size = or_invalid!(size.checked_add(u64::from(digit)));
    }

    trace!(size, "read chunk size");
    Ok(size)
}
