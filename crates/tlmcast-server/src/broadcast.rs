//! One-record fanout to every registered client.
//!
//! Sends run in parallel against a registry snapshot, each bounded by the
//! configured write timeout. A client that fails or times out is
//! unregistered and the round carries on; nothing here can abort the
//! replay loop.

use std::time::Duration;

use bytes::Bytes;

use crate::registry::{ClientId, ClientRegistry};

/// Outcome of delivering one payload to the registry's clients.
#[derive(Debug, Clone)]
pub struct BroadcastSummary {
    /// Clients present in the snapshot for this round.
    pub attempted: usize,
    /// Clients that accepted the full payload.
    pub delivered: usize,
    /// Clients dropped from the registry after a failed or timed-out send.
    pub dropped: Vec<ClientId>,
}

impl BroadcastSummary {
    /// True when every attempted client received the payload.
    pub fn all_delivered(&self) -> bool {
        self.dropped.is_empty()
    }

    /// True when at least one client was dropped this round.
    pub fn any_dropped(&self) -> bool {
        !self.dropped.is_empty()
    }
}

/// Deliver one payload to every client in the current registry snapshot.
///
/// Every snapshot entry is attempted exactly once. Failures are handled
/// locally: the offending client is unregistered and reported in the
/// summary.
pub async fn broadcast(
    registry: &ClientRegistry,
    payload: Bytes,
    write_timeout: Duration,
) -> BroadcastSummary {
    let snapshot = registry.snapshot().await;
    let attempted = snapshot.len();

    let mut handles = Vec::with_capacity(attempted);
    for (id, sink) in snapshot {
        let payload = payload.clone();
        handles.push(tokio::spawn(async move {
            let outcome = tokio::time::timeout(write_timeout, sink.send_all(&payload)).await;
            let failure = match outcome {
                Ok(Ok(())) => None,
                Ok(Err(e)) => Some(e.to_string()),
                Err(_) => Some(format!(
                    "write timed out after {}ms",
                    write_timeout.as_millis()
                )),
            };
            (id, failure)
        }));
    }

    let mut delivered = 0;
    let mut dropped = Vec::new();
    for handle in handles {
        if let Ok((id, failure)) = handle.await {
            match failure {
                None => delivered += 1,
                Some(reason) => {
                    registry.unregister(&id).await;
                    tracing::debug!(client = %id, reason = %reason, "dropping telemetry client");
                    dropped.push(id);
                }
            }
        }
    }

    BroadcastSummary {
        attempted,
        delivered,
        dropped,
    }
}
