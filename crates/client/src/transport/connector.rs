//! Transport factories.
//!
//! A connection never opens sockets itself; it asks its [`Connector`] for a
//! fresh [`Io`] whenever it needs one. [`TcpConnector`] is the default,
//! [`PipeConnector`] hands out in-memory pipes.

use std::collections::VecDeque;
use std::io;
use std::io::ErrorKind;
use std::net::SocketAddr;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio::io::DuplexStream;
use tokio::net::{TcpSocket, TcpStream, lookup_host};
use tokio::time::timeout;
use tracing::{debug, trace};
use triomphe::Arc;

use crate::transport::Io;

/// Where and how to connect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectTarget {
    pub host: String,
    pub port: u16,
    pub timeout: Duration,
    /// Local address to bind before connecting.
    pub source_address: Option<SocketAddr>,
}

/// Opens transports for a connection.
#[trait_variant::make(Connector: Send)]
pub trait LocalConnector {
    type Io: Io;

    async fn connect(&self, target: &ConnectTarget) -> io::Result<Self::Io>;
}

/// Connects over TCP, trying every resolved address in turn.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpConnector;

impl Connector for TcpConnector {
    type Io = TcpStream;

    async fn connect(&self, target: &ConnectTarget) -> io::Result<Self::Io> {
        let connecting = async {
            let mut last_error = None;
            for addr in lookup_host((target.host.as_str(), target.port)).await? {
                match connect_addr(addr, target.source_address).await {
                    Ok(stream) => {
                        trace!(%addr, "tcp connected");
                        return Ok(stream);
                    }
                    Err(e) => {
                        debug!(%addr, cause = %e, "failed to connect, trying next address");
                        last_error = Some(e);
                    }
                }
            }
            Err(last_error.unwrap_or_else(|| io::Error::new(ErrorKind::NotFound, "host resolved to no addresses")))
        };

        timeout(target.timeout, connecting).await.map_err(io::Error::from)?
    }
}

async fn connect_addr(addr: SocketAddr, source_address: Option<SocketAddr>) -> io::Result<TcpStream> {
    let socket = if addr.is_ipv4() { TcpSocket::new_v4()? } else { TcpSocket::new_v6()? };
    if let Some(source_address) = source_address {
        socket.bind(source_address)?;
    }
    socket.connect(addr).await
}

/// Serves queued in-memory pipes, one per `connect()`.
///
/// Each call to [`PipeConnector::pipe`] creates a `tokio::io::duplex` pair,
/// queues the client end and returns the server end to the caller. Connecting
/// with an empty queue fails with `ConnectionRefused`.
#[derive(Debug, Clone, Default)]
pub struct PipeConnector {
    pipes: Arc<Mutex<VecDeque<DuplexStream>>>,
    targets: Arc<Mutex<Vec<ConnectTarget>>>,
}

impl PipeConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a new pipe and returns its server end.
    pub fn pipe(&self, max_buf_size: usize) -> DuplexStream {
        let (client, server) = tokio::io::duplex(max_buf_size);
        self.pipes.lock().unwrap_or_else(PoisonError::into_inner).push_back(client);
        server
    }

    /// Every target connected to so far, oldest first.
    pub fn targets(&self) -> Vec<ConnectTarget> {
        self.targets.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl Connector for PipeConnector {
    type Io = DuplexStream;

    async fn connect(&self, target: &ConnectTarget) -> io::Result<Self::Io> {
        self.targets.lock().unwrap_or_else(PoisonError::into_inner).push(target.clone());
        self.pipes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .ok_or_else(|| io::Error::new(ErrorKind::ConnectionRefused, "no pipe queued"))
    }
}

#[cfg(test)]
mod tests {
    use std::io::ErrorKind;
    use std::time::Duration;

    use super::{ConnectTarget, Connector, PipeConnector, TcpConnector};
    use crate::transport::Io;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn target(host: &str, port: u16) -> ConnectTarget {
        ConnectTarget { host: host.into(), port, timeout: Duration::from_secs(5), source_address: None }
    }

    #[tokio::test]
    async fn pipe_connector_hands_out_queued_pipes() {
        let connector = PipeConnector::new();
        let mut server = connector.pipe(64);

        let mut client = connector.connect(&target("example.com", 80)).await.unwrap();
        client.write_all(b"ping").await.unwrap();

        let mut buf = [0u8; 4];
        server.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"ping");
        assert_eq!(connector.targets(), vec![target("example.com", 80)]);

        let err = connector.connect(&target("example.com", 80)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConnectionRefused);
    }

    #[tokio::test]
    async fn tcp_connector_connects_to_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let stream = TcpConnector.connect(&target("127.0.0.1", port)).await.unwrap();
        let (_accepted, remote) = listener.accept().await.unwrap();

        assert_eq!(stream.peer_identity().peer_addr, Some(listener.local_addr().unwrap()));
        assert_eq!(stream.local_addr().unwrap(), remote);
    }
}
