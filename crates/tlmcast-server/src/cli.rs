//! Command-line interface for `tlm-serve`.

use std::path::PathBuf;

use clap::Parser;

use crate::config::{BindAddr, ServeConfig, DEFAULT_PORT, DEFAULT_WRITE_TIMEOUT_MS};

/// Serve captured telemetry to TCP clients, preserving capture timing.
///
/// The server should be started before any telemetry client: clients do
/// not receive records broadcast before they connected.
#[derive(Debug, Parser)]
#[command(name = "tlm-serve")]
#[command(about = "Replay a telemetry capture to connected TCP clients", long_about = None)]
pub struct Cli {
    /// Path to the pcap capture to replay.
    pub pcap_file: PathBuf,

    /// Port to serve telemetry on.
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Host to bind the telemetry listener to.
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Report every packet sent.
    #[arg(short, long)]
    pub verbose: bool,

    /// Bound on a single client write in milliseconds; slower clients
    /// are dropped.
    #[arg(long, default_value_t = DEFAULT_WRITE_TIMEOUT_MS)]
    pub write_timeout_ms: u64,
}

impl Cli {
    /// Server configuration from the parsed arguments.
    pub fn to_config(&self) -> ServeConfig {
        ServeConfig {
            bind: BindAddr::new(&self.host, self.port),
            verbose: self.verbose,
            write_timeout_ms: self.write_timeout_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["tlm-serve", "flight.pcap"]).unwrap();
        assert_eq!(cli.pcap_file, PathBuf::from("flight.pcap"));
        assert_eq!(cli.port, 3076);
        assert_eq!(cli.host, "127.0.0.1");
        assert!(!cli.verbose);
        assert_eq!(cli.write_timeout_ms, DEFAULT_WRITE_TIMEOUT_MS);
    }

    #[test]
    fn test_flags_map_to_config() {
        let cli = Cli::try_parse_from([
            "tlm-serve",
            "-p",
            "4000",
            "--host",
            "0.0.0.0",
            "-v",
            "--write-timeout-ms",
            "250",
            "flight.pcap",
        ])
        .unwrap();

        let config = cli.to_config();
        assert_eq!(config.bind.to_socket_addr_string(), "0.0.0.0:4000");
        assert!(config.verbose);
        assert_eq!(config.write_timeout_ms, 250);
    }

    #[test]
    fn test_capture_path_is_required() {
        assert!(Cli::try_parse_from(["tlm-serve"]).is_err());
    }
}
