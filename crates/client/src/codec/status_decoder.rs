//! Decoder for the `HTTP/<major>.<minor> <code> <reason>` status line.

use bytes::BytesMut;
use tokio_util::codec::Decoder;

use crate::codec::LineDecoder;
use crate::ensure;
use crate::protocol::{ParseError, StatusLine};
use crate::utils::latin1_to_string;

/// Reads and parses a single status line.
#[derive(Debug, Clone)]
pub struct StatusLineDecoder {
    lines: LineDecoder,
}

impl StatusLineDecoder {
    pub fn new(max_line: usize) -> Self {
        Self { lines: LineDecoder::new(max_line, "status line") }
    }
}

impl Decoder for StatusLineDecoder {
    type Item = StatusLine;
    type Error = ParseError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        self.lines.decode(src)?.map(|line| parse_status_line(&line)).transpose()
    }

    /// A peer that closes before sending a full status line produced a bad one.
    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        self.lines.decode_eof(src)?.map(|line| parse_status_line(&line)).transpose()
    }
}

/// Parses a status line; whitespace runs separate the three parts and the reason may be empty.
pub fn parse_status_line(line: &[u8]) -> Result<StatusLine, ParseError> {
    let text = latin1_to_string(line);
    let bad_status_line = || ParseError::bad_status_line(format!("{text:?}"));

    let mut rest = text.as_str();
    let version = next_token(&mut rest);
    let status = next_token(&mut rest);

    ensure!(version.starts_with("HTTP/"), bad_status_line());

    let status = status
        .parse::<u16>()
        .ok()
        .filter(|status| (100..=999).contains(status))
        .ok_or_else(bad_status_line)?;

    Ok(StatusLine { version: version.to_string(), status, reason: rest.trim().to_string() })
}

fn next_token<'a>(rest: &mut &'a str) -> &'a str {
    let trimmed = rest.trim_start();
    let end = trimmed.find(char::is_whitespace).unwrap_or(trimmed.len());
    let (token, tail) = trimmed.split_at(end);
    *rest = tail.trim_start();
    token
}
