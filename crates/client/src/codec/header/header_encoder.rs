//! Encoder for the request head.
//!
//! The head is assembled line by line in the connection's outgoing buffer and
//! only flushed once the caller ends the headers:
//!
//! ```text
//! GET /index.html HTTP/1.1\r\n
//! Host: example.com\r\n
//! Accept: text/html\r\n
//!     \tapplication/xhtml+xml\r\n
//! \r\n
//! ```
//!
//! Several values given for one field are folded onto continuation lines.

use std::io;
use std::io::Write;

use bytes::{BufMut, BytesMut};
use http::Method;
use tokio_util::codec::Encoder;

use crate::protocol::SendError;

/// Initial buffer size reserved for a request head.
const INIT_HEAD_SIZE: usize = 1024;

/// One line of a request head.
#[derive(Debug, Clone, Copy)]
pub enum HeadLine<'a> {
    /// `METHOD target HTTP/1.1`
    Request { method: &'a Method, target: &'a str },
    /// `CONNECT host:port HTTP/1.0`, the opening line of a tunnel
    Connect { host: &'a str, port: u16 },
    /// `Name: value1`, further values folded onto `\t`-prefixed lines
    Header { name: &'a [u8], values: &'a [&'a [u8]] },
    /// The blank line closing the head.
    End,
}

/// Encodes [`HeadLine`]s, each terminated by CRLF.
#[derive(Debug, Clone, Copy)]
pub struct HeadEncoder;

impl Encoder<HeadLine<'_>> for HeadEncoder {
    type Error = SendError;

    fn encode(&mut self, item: HeadLine<'_>, dst: &mut BytesMut) -> Result<(), Self::Error> {
        if dst.is_empty() {
            dst.reserve(INIT_HEAD_SIZE);
        }

        match item {
            HeadLine::Request { method, target } => {
                write!(FastWrite(dst), "{} {} HTTP/1.1", method.as_str(), target)?;
            }
            HeadLine::Connect { host, port } => {
                write!(FastWrite(dst), "CONNECT {host}:{port} HTTP/1.0")?;
            }
            HeadLine::Header { name, values } => {
                dst.put_slice(name);
                dst.put_slice(b": ");
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        dst.put_slice(b"\r\n\t");
                    }
                    dst.put_slice(value);
                }
            }
            HeadLine::End => {}
        }

        dst.put_slice(b"\r\n");
        Ok(())
    }
}

/// Fast writer implementation for writing to BytesMut.
///
/// Formatting goes straight into the buffer without an intermediate `String`.
struct FastWrite<'a>(&'a mut BytesMut);

impl Write for FastWrite<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.put_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    fn encode_all(lines: &[HeadLine<'_>]) -> String {
        let mut dst = BytesMut::new();
        for line in lines {
            HeadEncoder.encode(*line, &mut dst).unwrap();
        }
        String::from_utf8(dst.to_vec()).unwrap()
    }

    #[test]
    fn request_head() {
        let head = encode_all(&[
            HeadLine::Request { method: &Method::GET, target: "/index.html" },
            HeadLine::Header { name: b"Host", values: &[b"example.com"] },
            HeadLine::Header { name: b"Accept", values: &[b"text/html", b"application/xhtml+xml"] },
            HeadLine::End,
        ]);

        let expected = indoc! {"
        GET /index.html HTTP/1.1
        Host: example.com
        Accept: text/html
        \tapplication/xhtml+xml

        "};
        assert_eq!(head, expected.replace('\n', "\r\n"));
    }

    #[test]
    fn connect_line() {
        let head = encode_all(&[HeadLine::Connect { host: "example.com", port: 443 }, HeadLine::End]);
        assert_eq!(head, "CONNECT example.com:443 HTTP/1.0\r\n\r\n");
    }

    #[test]
    fn header_without_values() {
        let head = encode_all(&[HeadLine::Header { name: b"X-Empty", values: &[] }]);
        assert_eq!(head, "X-Empty: \r\n");
    }
}
