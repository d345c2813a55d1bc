//! Core HTTP/1.1 client protocol abstractions.
//!
//! This module holds the vocabulary shared by the codecs, the transport layer
//! and the connection state machine.
//!
//! # Architecture
//!
//! - **Headers** ([`header`]): the ordered, case-insensitive [`Headers`] collection
//!   produced by the header parser
//! - **Status** ([`status`]): [`StatusLine`] and the [`reason_phrase`] table
//! - **Framing** ([`framing`]): [`BodyFraming`], decided once per response
//! - **State** ([`state`]): [`ConnectionState`], the legal request/response
//!   sequencing of a connection, and the [`ResponseTracker`] linking a
//!   connection to its pending response
//! - **Error Handling** ([`error`]): the error taxonomy
//!   - [`HttpError`]: Top-level error type
//!   - [`StateError`]: Call sequencing errors
//!   - [`ParseError`]: Response parsing and body framing errors
//!   - [`SendError`]: Request sending errors

mod error;
pub use error::HttpError;
pub use error::ParseError;
pub use error::SendError;
pub use error::StateError;

pub mod framing;
pub use framing::BodyFraming;

pub mod header;
pub use header::Headers;

pub mod state;
pub use state::ConnectionState;
pub use state::ResponseTracker;

pub mod status;
pub use status::StatusLine;
pub use status::reason_phrase;
