//! Client connections and the responses they produce.
//!
//! # Components
//!
//! - [`HttpConnection`]: the request side, a state machine that
//!   - buffers the request line and headers
//!   - flushes them together with the body, coalescing small bodies
//!   - opens the transport lazily and sets up proxy tunnels
//!   - refuses calls made out of order
//! - [`PendingResponse`] / [`Response`]: the response side, reading the head
//!   once and then serving the body according to its framing
//! - [`RequestBody`]: what can be sent after the head

mod http_connection;
mod request_body;
mod response;

pub use http_connection::HttpConnection;
pub use request_body::BoxError;
pub use request_body::RequestBody;
pub use response::PendingResponse;
pub use response::Response;
