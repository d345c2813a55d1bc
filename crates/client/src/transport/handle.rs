use std::fmt;
use std::io;
use std::sync::{Arc, Weak};

use tokio::sync::{Mutex, MutexGuard};
use tracing::trace;

use crate::transport::{Io, Transport};

/// Shared ownership of one [`Transport`].
///
/// A connection and the response it produced may both hold the transport.
/// Each [`clone`](Clone::clone) adds an owner and each [`release`](Self::release)
/// removes one; the transport is shut down when the last owner releases it.
pub struct TransportHandle<I> {
    inner: Arc<Mutex<Transport<I>>>,
}

impl<I: Io> TransportHandle<I> {
    pub fn new(transport: Transport<I>) -> Self {
        Self { inner: Arc::new(Mutex::new(transport)) }
    }

    pub async fn lock(&self) -> MutexGuard<'_, Transport<I>> {
        self.inner.lock().await
    }

    /// Current number of owners.
    pub fn owners(&self) -> usize {
        Arc::strong_count(&self.inner)
    }

    /// A reference that does not count as an owner.
    pub fn downgrade(&self) -> WeakTransportHandle<I> {
        WeakTransportHandle { inner: Arc::downgrade(&self.inner) }
    }

    /// Gives up this owner's share; shuts the transport down if it was the last one.
    pub async fn release(self) -> io::Result<()> {
        match Arc::try_unwrap(self.inner) {
            Ok(transport) => {
                trace!("last owner released the transport, shutting it down");
                transport.into_inner().shutdown().await
            }
            Err(_shared) => Ok(()),
        }
    }
}

/// Reaches a transport owned by someone else, e.g. the response a connection handed out.
pub struct WeakTransportHandle<I> {
    inner: Weak<Mutex<Transport<I>>>,
}

impl<I: Io> WeakTransportHandle<I> {
    /// Shuts the transport down if any owner still holds it.
    ///
    /// The owners keep their shares; their later reads see a closed transport.
    pub async fn shutdown(&self) -> io::Result<()> {
        match self.inner.upgrade() {
            Some(transport) => transport.lock().await.shutdown().await,
            None => Ok(()),
        }
    }
}

impl<I> fmt::Debug for WeakTransportHandle<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakTransportHandle").field("owners", &self.inner.strong_count()).finish()
    }
}

impl<I> Clone for TransportHandle<I> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<I> fmt::Debug for TransportHandle<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportHandle").field("owners", &Arc::strong_count(&self.inner)).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, duplex};

    #[tokio::test]
    async fn shuts_down_on_last_release() {
        let (client, mut server) = duplex(64);
        let handle = TransportHandle::new(Transport::new(client, Duration::from_secs(1), 1024));
        let response_side = handle.clone();
        assert_eq!(handle.owners(), 2);

        handle.release().await.unwrap();
        assert_eq!(response_side.owners(), 1);

        let mut buf = [0u8; 1];
        let pending = tokio::time::timeout(Duration::from_millis(50), server.read(&mut buf)).await;
        assert!(matches!(pending, Err(_)), "transport must stay open while an owner remains");

        response_side.release().await.unwrap();
        assert_eq!(server.read(&mut buf).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn weak_handle_shuts_down_while_owned() {
        let (client, mut server) = duplex(64);
        let handle = TransportHandle::new(Transport::new(client, Duration::from_secs(1), 1024));
        let weak = handle.downgrade();

        weak.shutdown().await.unwrap();
        let mut buf = [0u8; 1];
        assert_eq!(server.read(&mut buf).await.unwrap(), 0);
        assert_eq!(handle.owners(), 1);

        // the last owner's release does not shut down twice
        handle.release().await.unwrap();
        weak.shutdown().await.unwrap();
    }
}
