//! Server orchestration: listener, acceptor task, and replay run.

use std::net::SocketAddr;
use std::path::Path;

use tokio::net::TcpListener;
use tokio::sync::watch;

use tlmcast_capture::PcapReader;

use crate::acceptor::{accept_loop, bind};
use crate::config::ServeConfig;
use crate::error::Result;
use crate::registry::ClientRegistry;
use crate::replay::{run_replay, ReplayOutcome};

/// A telemetry replay server, configured but not yet bound.
pub struct Server {
    config: ServeConfig,
}

impl Server {
    /// Build a server from a validated configuration.
    pub fn new(config: ServeConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The configuration this server runs with.
    pub fn config(&self) -> &ServeConfig {
        &self.config
    }

    /// Bind the telemetry listener. Fatal if the address is unavailable.
    pub async fn bind(&self) -> Result<BoundServer> {
        let listener = bind(&self.config.bind).await?;
        if let Ok(addr) = listener.local_addr() {
            tracing::info!(addr = %addr, "listening for telemetry clients");
        }
        Ok(BoundServer {
            config: self.config.clone(),
            listener,
        })
    }

    /// Bind, watch for an interrupt signal, and replay the capture.
    ///
    /// Both normal drain and an interrupt end with a success outcome;
    /// only a capture or listener failure is an error.
    pub async fn run(&self, capture_path: &Path) -> Result<ReplayOutcome> {
        let bound = self.bind().await?;
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("received interrupt signal");
                let _ = shutdown_tx.send(true);
            }
        });

        bound.replay(capture_path, shutdown_rx).await
    }
}

/// A server whose listener is bound, ready to replay one capture.
pub struct BoundServer {
    config: ServeConfig,
    listener: TcpListener,
}

impl BoundServer {
    /// The address the listener actually bound (useful with port 0).
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Open the capture and replay it until drained or shut down.
    ///
    /// The acceptor runs concurrently for the whole replay; the capture
    /// reader is released on every exit path, including errors.
    pub async fn replay(
        self,
        capture_path: &Path,
        shutdown: watch::Receiver<bool>,
    ) -> Result<ReplayOutcome> {
        let reader = PcapReader::open_path(capture_path)?;
        tracing::info!(
            capture = %capture_path.display(),
            linktype = reader.header().linktype,
            "opened telemetry capture"
        );

        let registry = ClientRegistry::new();
        let acceptor = tokio::spawn(accept_loop(
            self.listener,
            registry.clone(),
            shutdown.clone(),
        ));

        let mut shutdown = shutdown;
        let outcome = run_replay(reader, &registry, &self.config, &mut shutdown).await;

        acceptor.abort();
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BindAddr;

    #[test]
    fn test_new_rejects_invalid_config() {
        let mut config = ServeConfig::default();
        config.write_timeout_ms = 0;
        assert!(Server::new(config).is_err());
    }

    #[tokio::test]
    async fn test_bind_reports_local_addr() {
        let mut config = ServeConfig::default();
        config.bind = BindAddr::new("127.0.0.1", 0);
        let server = Server::new(config).unwrap();
        let bound = server.bind().await.unwrap();
        assert_ne!(bound.local_addr().unwrap().port(), 0);
    }
}
