//! Server errors.
//!
//! Only whole-process failures are variants here. A write failure to one
//! client or a single failed accept is handled at its own boundary (the
//! client is dropped, the accept loop continues) and never propagates.

use thiserror::Error;
use tlmcast_capture::CaptureError;

/// Fatal server errors.
#[derive(Debug, Error)]
pub enum ServeError {
    /// The capture source could not be opened or decoded.
    #[error(transparent)]
    Capture(#[from] CaptureError),

    /// The telemetry listener could not bind its address.
    #[error("failed to listen on {addr}")]
    Listen {
        /// Address the listener attempted to bind.
        addr: String,
        /// Underlying bind failure.
        #[source]
        source: std::io::Error,
    },

    /// The supplied configuration is unusable.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// What made the configuration invalid.
        reason: String,
    },
}

/// Result alias for server operations.
pub type Result<T> = std::result::Result<T, ServeError>;
