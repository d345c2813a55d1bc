//! Header block codecs.
//!
//! - [`HeaderDecoder`]: parses a response header block (or chunked trailers)
//!   into [`Headers`](crate::protocol::Headers), folding continuation lines
//!   and enforcing the line length and field count limits
//! - [`HeadEncoder`]: writes request lines, header fields and the closing
//!   blank line of a request head

mod header_decoder;
mod header_encoder;

pub use header_decoder::HeaderDecoder;
pub use header_encoder::HeadEncoder;
pub use header_encoder::HeadLine;
