//! Body framing codecs.
//!
//! Length-framed and close-delimited bodies need no decoding beyond counting
//! bytes, which the response does itself. Chunked bodies need their size
//! lines decoded: [`ChunkSizeDecoder`].

mod chunked_decoder;

pub use chunked_decoder::ChunkSizeDecoder;
pub use chunked_decoder::parse_chunk_size;
