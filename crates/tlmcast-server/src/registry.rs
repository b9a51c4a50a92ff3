//! Shared client registry and the per-client delivery sink.
//!
//! The registry is the one piece of state touched by more than one task:
//! the acceptor inserts, the broadcaster removes. Snapshots are taken
//! under the read lock and the lock is released before any network write,
//! so a slow client cannot stall new connections.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::sync::{Mutex, RwLock};

/// Key addressing one live client connection.
pub type ClientId = SocketAddr;

/// A writable destination for replayed payloads.
///
/// The delivery seam: production clients wrap a TCP write half, tests
/// inject sinks that record or fail on demand.
#[async_trait]
pub trait ClientSink: Send + Sync {
    /// The identity this sink is registered under.
    fn id(&self) -> ClientId;

    /// Write the whole payload, or report the first I/O failure.
    async fn send_all(&self, payload: &[u8]) -> std::io::Result<()>;
}

/// Production sink wrapping the write half of an accepted connection.
pub struct TcpClient {
    id: ClientId,
    write: Mutex<OwnedWriteHalf>,
}

impl TcpClient {
    /// Wrap an accepted connection's write half.
    pub fn new(id: ClientId, write: OwnedWriteHalf) -> Self {
        Self {
            id,
            write: Mutex::new(write),
        }
    }
}

#[async_trait]
impl ClientSink for TcpClient {
    fn id(&self) -> ClientId {
        self.id
    }

    async fn send_all(&self, payload: &[u8]) -> std::io::Result<()> {
        let mut write = self.write.lock().await;
        write.write_all(payload).await?;
        write.flush().await?;
        Ok(())
    }
}

/// Shared mapping of client identity to delivery sink.
///
/// Cheap to clone; all clones see the same entries. Constructed by the
/// server run and handed to the acceptor and broadcaster, never global.
#[derive(Clone, Default)]
pub struct ClientRegistry {
    clients: Arc<RwLock<HashMap<ClientId, Arc<dyn ClientSink>>>>,
}

impl ClientRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a client, replacing any stale entry under the same identity.
    pub async fn register(&self, sink: Arc<dyn ClientSink>) {
        let mut clients = self.clients.write().await;
        clients.insert(sink.id(), sink);
    }

    /// Remove a client if present. Idempotent; returns whether an entry
    /// was removed.
    pub async fn unregister(&self, id: &ClientId) -> bool {
        let mut clients = self.clients.write().await;
        clients.remove(id).is_some()
    }

    /// A consistent point-in-time view of the registered clients.
    ///
    /// Clients registered while a broadcast round is in flight may or may
    /// not appear in that round.
    pub async fn snapshot(&self) -> Vec<(ClientId, Arc<dyn ClientSink>)> {
        let clients = self.clients.read().await;
        clients
            .iter()
            .map(|(id, sink)| (*id, Arc::clone(sink)))
            .collect()
    }

    /// Number of registered clients.
    pub async fn len(&self) -> usize {
        let clients = self.clients.read().await;
        clients.len()
    }

    /// True when no clients are registered.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
