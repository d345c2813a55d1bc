//! The byte-stream side of the client.
//!
//! - [`Connector`]: opens a fresh [`Io`] for a [`ConnectTarget`]
//!   ([`TcpConnector`] by default, [`PipeConnector`] for in-memory pipes)
//! - [`Transport`]: buffers reads and applies the read deadline
//! - [`TransportHandle`]: reference-counted ownership shared by a connection
//!   and its pending response

mod buffered;
mod connector;
mod handle;
mod io;

pub use buffered::OnTimeout;
pub use buffered::Transport;
pub use connector::ConnectTarget;
pub use connector::Connector;
pub use connector::LocalConnector;
pub use connector::PipeConnector;
pub use connector::TcpConnector;
pub use handle::TransportHandle;
pub use handle::WeakTransportHandle;
pub use io::Io;
pub use io::PeerIdentity;
