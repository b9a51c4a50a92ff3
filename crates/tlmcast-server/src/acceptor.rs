//! Inbound connection acceptor.
//!
//! Accepted clients are registered and never read from; the replay loop
//! is the sole source of outbound data. One failed accept is logged and
//! survived; only the initial bind is fatal.

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::watch;

use crate::config::BindAddr;
use crate::error::{Result, ServeError};
use crate::registry::{ClientRegistry, TcpClient};

/// Bind the telemetry listener. A bind failure aborts the whole server.
pub async fn bind(bind: &BindAddr) -> Result<TcpListener> {
    let addr = bind.to_socket_addr_string();
    TcpListener::bind(&addr)
        .await
        .map_err(|source| ServeError::Listen { addr, source })
}

/// Accept connections until shutdown, registering each client's write
/// half. The read half is discarded; clients are write-only peers.
pub async fn accept_loop(
    listener: TcpListener,
    registry: ClientRegistry,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    if let Err(e) = stream.set_nodelay(true) {
                        tracing::warn!(peer = %peer, error = %e, "failed to set TCP_NODELAY");
                    }
                    let (_read_half, write_half) = stream.into_split();
                    registry.register(Arc::new(TcpClient::new(peer, write_half))).await;
                    let clients = registry.len().await;
                    tracing::info!(peer = %peer, clients, "telemetry client connected");
                }
                Err(e) => {
                    tracing::warn!(error = %e, "failed to accept telemetry client");
                }
            },
            _ = shutdown.changed() => break,
        }
    }
}
