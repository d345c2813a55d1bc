use std::net::SocketAddr;

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncWrite, DuplexStream};
use tokio::net::TcpStream;

/// Who is on the other end of a transport.
///
/// Exposed so callers layering TLS under the client can verify the peer's
/// hostname against its certificate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PeerIdentity {
    pub peer_addr: Option<SocketAddr>,
    /// The peer certificate in DER form, when the stream is TLS.
    pub certificate: Option<Bytes>,
}

/// A bidirectional byte stream the client can speak HTTP/1.1 over.
pub trait Io: AsyncRead + AsyncWrite + Unpin + Send + 'static {
    fn peer_identity(&self) -> PeerIdentity {
        PeerIdentity::default()
    }
}

impl Io for TcpStream {
    fn peer_identity(&self) -> PeerIdentity {
        PeerIdentity { peer_addr: self.peer_addr().ok(), certificate: None }
    }
}

impl Io for DuplexStream {}
