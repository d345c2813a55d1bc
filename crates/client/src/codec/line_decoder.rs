//! Decoder for `\n`-terminated lines.
//!
//! Every line-oriented element of a response (status line, header lines, chunk
//! size lines, trailers and body lines read through `read_line`) goes through
//! [`LineDecoder`]. The decoded line keeps its terminator so callers can tell a
//! complete line from the tail of the stream.

use bytes::{Bytes, BytesMut};
use tokio_util::codec::Decoder;

use crate::ensure;
use crate::protocol::ParseError;

/// Splits a byte stream into lines, enforcing a maximum line length.
#[derive(Debug, Clone)]
pub struct LineDecoder {
    max_length: usize,
    line_type: &'static str,
    limit: Option<usize>,
    /// Where to resume scanning for `\n`, so partial lines are not rescanned.
    next_index: usize,
}

impl LineDecoder {
    /// Creates a decoder whose lines, terminator included, may not exceed `max_length` bytes.
    ///
    /// `line_type` names the line in [`ParseError::LineTooLong`].
    pub fn new(max_length: usize, line_type: &'static str) -> Self {
        Self { max_length, line_type, limit: None, next_index: 0 }
    }

    /// Yields at most `limit` bytes, even when no terminator was found within them.
    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

impl Decoder for LineDecoder {
    type Item = Bytes;
    type Error = ParseError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let scan_end = match self.limit {
            Some(limit) => src.len().min(limit),
            None => src.len(),
        };

        let found = src[self.next_index.min(scan_end)..scan_end]
            .iter()
            .position(|b| *b == b'\n')
            .map(|offset| self.next_index + offset);

        if let Some(index) = found {
            self.next_index = 0;
            ensure!(index < self.max_length, ParseError::line_too_long(self.line_type, self.max_length));
            return Ok(Some(src.split_to(index + 1).freeze()));
        }

        if let Some(limit) = self.limit
            && src.len() >= limit
        {
            self.next_index = 0;
            return Ok(Some(src.split_to(limit).freeze()));
        }

        ensure!(src.len() <= self.max_length, ParseError::line_too_long(self.line_type, self.max_length));
        self.next_index = scan_end;
        Ok(None)
    }

    /// At end-of-stream the unterminated tail, possibly empty, is the last line.
    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode(src)? {
            Some(line) => Ok(Some(line)),
            None => {
                self.next_index = 0;
                Ok(Some(src.split().freeze()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_lines_keeping_terminator() {
        let mut decoder = LineDecoder::new(64, "header line");
        let mut buf = BytesMut::from(&b"first\r\nsecond\nthi"[..]);

        assert_eq!(&decoder.decode(&mut buf).unwrap().unwrap()[..], b"first\r\n");
        assert_eq!(&decoder.decode(&mut buf).unwrap().unwrap()[..], b"second\n");
        assert!(decoder.decode(&mut buf).unwrap().is_none());

        buf.extend_from_slice(b"rd\n");
        assert_eq!(&decoder.decode(&mut buf).unwrap().unwrap()[..], b"third\n");
        assert!(buf.is_empty());
    }

    #[test]
    fn eof_returns_tail_then_empty() {
        let mut decoder = LineDecoder::new(64, "header line");
        let mut buf = BytesMut::from(&b"tail"[..]);
        assert_eq!(&decoder.decode_eof(&mut buf).unwrap().unwrap()[..], b"tail");
        assert_eq!(decoder.decode_eof(&mut buf).unwrap().unwrap().len(), 0);
    }

    #[test]
    fn rejects_long_lines() {
        let mut decoder = LineDecoder::new(8, "status line");
        let mut buf = BytesMut::from(&b"123456789"[..]);
        let err = decoder.decode(&mut buf).unwrap_err();
        assert!(matches!(err, ParseError::LineTooLong { line_type: "status line", max: 8 }));

        let mut decoder = LineDecoder::new(8, "status line");
        let mut buf = BytesMut::from(&b"1234567\n"[..]);
        assert_eq!(decoder.decode(&mut buf).unwrap().unwrap().len(), 8);
    }

    #[test]
    fn limit_cuts_unterminated_lines() {
        let mut decoder = LineDecoder::new(64, "readline").with_limit(4);
        let mut buf = BytesMut::from(&b"abcdef\n"[..]);
        assert_eq!(&decoder.decode(&mut buf).unwrap().unwrap()[..], b"abcd");

        let mut decoder = LineDecoder::new(64, "readline").with_limit(4);
        let mut buf = BytesMut::from(&b"ab\ncd"[..]);
        assert_eq!(&decoder.decode(&mut buf).unwrap().unwrap()[..], b"ab\n");
    }
}
