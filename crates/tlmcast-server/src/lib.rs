#![warn(missing_docs)]

//! tlmcast server subsystem: timed replay loop, client registry, TCP fanout
//!
//! Replays a telemetry capture to every connected TCP client, preserving
//! the inter-record timing recorded in the capture. Clients may connect
//! at any time and receive the stream from that moment forward; a failed
//! client is dropped without disturbing the stream or its peers.

pub mod acceptor;
pub mod broadcast;
pub mod cli;
pub mod config;
pub mod error;
pub mod pacer;
pub mod registry;
pub mod replay;
pub mod server;

pub use broadcast::{broadcast, BroadcastSummary};
pub use cli::Cli;
pub use config::{BindAddr, ServeConfig, DEFAULT_PORT};
pub use error::{Result, ServeError};
pub use pacer::Pacer;
pub use registry::{ClientId, ClientRegistry, ClientSink, TcpClient};
pub use replay::{run_replay, ReplayCursor, ReplayOutcome};
pub use server::{BoundServer, Server};
