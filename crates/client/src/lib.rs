//! An asynchronous micro HTTP/1.1 client protocol engine
//!
//! This crate drives HTTP/1.1 request/response exchanges over any async byte
//! stream. It does not hide the protocol behind a single `fetch` call: the
//! caller steps through the exchange and keeps control of connection reuse,
//! body framing and proxy tunnels.
//!
//! # Features
//!
//! - Request heads assembled step by step, with call-order checking
//! - `Content-Length`, chunked and close-delimited response bodies
//! - Interim `100 Continue` responses skipped transparently
//! - `CONNECT` tunnels through HTTP proxies
//! - Read deadlines on every transport read, lenient for close-delimited bodies
//! - Pluggable transports through the [`Connector`](transport::Connector) trait
//!
//! # Example
//!
//! ```no_run
//! use http::Method;
//! use micro_http_client::connection::HttpConnection;
//! use tracing::{Level, error, info};
//! use tracing_subscriber::FmtSubscriber;
//!
//! #[tokio::main]
//! async fn main() {
//!     // Initialize logging
//!     let subscriber = FmtSubscriber::builder()
//!         .with_max_level(Level::INFO)
//!         .finish();
//!     tracing::subscriber::set_global_default(subscriber)
//!         .expect("setting default subscriber failed");
//!
//!     let mut connection = match HttpConnection::new("example.com", None) {
//!         Ok(connection) => connection,
//!         Err(e) => {
//!             error!(cause = %e, "invalid host");
//!             return;
//!         }
//!     };
//!
//!     if let Err(e) = connection.request(&Method::GET, "/", None, &[("Accept", "text/html")]).await {
//!         error!(cause = %e, "failed to send request");
//!         return;
//!     }
//!
//!     let mut response = match connection.get_response().await {
//!         Ok(response) => response,
//!         Err(e) => {
//!             error!(cause = %e, "failed to read response");
//!             return;
//!         }
//!     };
//!
//!     info!(status = %response.status(), reason = response.reason(), "got response");
//!     match response.read(None).await {
//!         Ok(body) => info!(len = body.len(), "read body"),
//!         Err(e) => error!(cause = %e, "failed to read body"),
//!     }
//! }
//! ```
//!
//! # Architecture
//!
//! The crate is organized into several key modules:
//!
//! - [`connection`]: the connection state machine and the response body reader
//! - [`protocol`]: error taxonomy, headers, status table, body framing and connection states
//! - [`codec`]: line, status line, header and chunk-size decoders, the request head encoder
//! - [`transport`]: connectors, the buffered deadline-aware transport and its shared handle
//! - [`config`]: timeouts and limits
//!
//! # Body framing
//!
//! The framing of a response body is decided once, from its head:
//!
//! - `Transfer-Encoding: chunked` wins over `Content-Length`
//! - `204`, `304`, `1xx` responses and responses to `HEAD` have no body
//! - a body with neither length nor chunking ends when the server closes
//!
//! # Error Handling
//!
//! Every public operation returns [`HttpError`](protocol::HttpError), which
//! wraps:
//!
//! - [`StateError`](protocol::StateError) for calls made out of order
//! - [`ParseError`](protocol::ParseError) for malformed or truncated responses
//! - [`SendError`](protocol::SendError) for request side failures
//!
//! Protocol errors close the response or connection they happened on, a
//! stream that lost sync is never reused.

pub mod codec;
pub mod config;
pub mod connection;
pub mod protocol;
pub mod transport;

mod utils;
pub(crate) use utils::ensure;
