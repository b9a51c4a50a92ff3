#![warn(missing_docs)]

//! tlmcast telemetry replay server

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use tlmcast_server::{Cli, ReplayOutcome, Server};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = cli.to_config();

    if !config.verbose {
        tracing::info!("will only report every 10 telemetry packets");
        tracing::info!("will only report long telemetry send delays");
    }

    let server = Server::new(config)?;
    match server.run(&cli.pcap_file).await {
        Ok(ReplayOutcome::Drained { packets_sent }) => {
            tracing::info!(packets = packets_sent, "replay complete");
            Ok(())
        }
        Ok(ReplayOutcome::Cancelled { packets_sent }) => {
            tracing::info!(packets = packets_sent, "replay stopped");
            Ok(())
        }
        Err(e) => {
            tracing::error!(error = %e, "telemetry send error");
            Err(e.into())
        }
    }
}
