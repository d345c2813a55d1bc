//! Decoder for a block of header lines (the HeaderParser).
//!
//! A block is a sequence of `Name: value` lines closed by an empty line. The
//! decoder is tolerant in the way HTTP/1.1 clients have to be:
//!
//! - a line starting with a space or tab continues the previous field (obsolete
//!   line folding), its content is joined to the previous value with one space
//! - lines without a `:` are skipped
//! - bytes are decoded as ISO-8859-1, so no input is rejected for its encoding
//!
//! The same decoder reads chunked trailers via [`HeaderDecoder::trailers`].

use std::mem;

use bytes::{Bytes, BytesMut};
use tokio_util::codec::Decoder;
use tracing::{trace, warn};

use crate::codec::LineDecoder;
use crate::ensure;
use crate::protocol::{Headers, ParseError};
use crate::utils::latin1_to_string;

/// Decodes one header block into [`Headers`].
#[derive(Debug, Clone)]
pub struct HeaderDecoder {
    lines: LineDecoder,
    max_headers: usize,
    count: usize,
    headers: Headers,
}

impl HeaderDecoder {
    /// A decoder for a response header block.
    pub fn new(max_line: usize, max_headers: usize) -> Self {
        Self { lines: LineDecoder::new(max_line, "header line"), max_headers, count: 0, headers: Headers::new() }
    }

    /// A decoder for the trailer section after the last chunk; the number of lines is not capped.
    pub fn trailers(max_line: usize) -> Self {
        Self { lines: LineDecoder::new(max_line, "trailer line"), max_headers: usize::MAX, count: 0, headers: Headers::new() }
    }

    /// Consumes one line; returns true once the terminating blank line was seen.
    fn push_line(&mut self, line: &Bytes) -> Result<bool, ParseError> {
        if is_blank(line) {
            return Ok(true);
        }

        self.count += 1;
        ensure!(self.count <= self.max_headers, ParseError::too_many_headers(self.max_headers));

        let text = latin1_to_string(strip_terminator(line));

        if text.starts_with([' ', '\t']) {
            if !self.headers.continue_last(text.trim()) {
                trace!(line = %text.trim(), "skip continuation line without a preceding field");
            }
            return Ok(false);
        }

        match text.split_once(':') {
            Some((name, value)) => self.headers.push(name.trim_end().to_string(), value.trim().to_string()),
            None => warn!(line = %text, "skip malformed header line"),
        }
        Ok(false)
    }

    fn finish(&mut self) -> Headers {
        self.count = 0;
        mem::take(&mut self.headers)
    }
}

impl Decoder for HeaderDecoder {
    type Item = Headers;
    type Error = ParseError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        while let Some(line) = self.lines.decode(src)? {
            if self.push_line(&line)? {
                return Ok(Some(self.finish()));
            }
        }
        Ok(None)
    }

    /// A peer closing mid-block ends the block; what was parsed so far is kept.
    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            match self.lines.decode_eof(src)? {
                Some(line) if !line.is_empty() => {
                    if self.push_line(&line)? {
                        return Ok(Some(self.finish()));
                    }
                }
                _ => return Ok(Some(self.finish())),
            }
        }
    }
}

#[inline]
fn is_blank(line: &[u8]) -> bool {
    matches!(line, b"\r\n" | b"\n" | b"")
}

#[inline]
fn strip_terminator(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}
