//! The timed replay loop.
//!
//! Pulls records from an opened capture, waits out each inter-record gap,
//! fans the payload out to every registered client, and reports progress.
//! The pacer sleep is the loop's only suspension point and is preempted
//! by the shutdown channel, so an interrupt mid-wait stops the stream
//! without sending the pending record.

use std::io::Read;
use std::time::Duration;

use tokio::sync::watch;

use tlmcast_capture::PcapReader;

use crate::broadcast::broadcast;
use crate::config::ServeConfig;
use crate::error::Result;
use crate::pacer::Pacer;
use crate::registry::ClientRegistry;

/// How one sent record was reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendEvent {
    /// The first record of the whole replay.
    FirstPacket,
    /// Per-record report (verbose mode).
    PerPacket,
    /// Coarse every-tenth-packet heartbeat.
    Heartbeat,
    /// Nothing reported for this record.
    Quiet,
}

/// Progress state owned exclusively by the replay loop.
#[derive(Debug)]
pub struct ReplayCursor {
    first_packet_pending: bool,
    packets_sent: u64,
}

impl ReplayCursor {
    /// Cursor at the start of a replay.
    pub fn new() -> Self {
        Self {
            first_packet_pending: true,
            packets_sent: 0,
        }
    }

    /// Packets sent so far.
    pub fn packets_sent(&self) -> u64 {
        self.packets_sent
    }

    /// Account for one sent record and emit at most one progress event:
    /// the first packet always, every packet in verbose mode, otherwise a
    /// heartbeat every tenth packet.
    pub fn observe_sent(&mut self, nbytes: usize, verbose: bool) -> SendEvent {
        self.packets_sent += 1;
        if self.first_packet_pending {
            self.first_packet_pending = false;
            tracing::info!(bytes = nbytes, "sent first telemetry packet");
            SendEvent::FirstPacket
        } else if verbose {
            tracing::info!(bytes = nbytes, "sent telemetry");
            SendEvent::PerPacket
        } else if self.packets_sent % 10 == 0 {
            tracing::info!(packets = self.packets_sent, "sent 10 telemetry packets");
            SendEvent::Heartbeat
        } else {
            SendEvent::Quiet
        }
    }
}

impl Default for ReplayCursor {
    fn default() -> Self {
        Self::new()
    }
}

/// How a replay run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplayOutcome {
    /// The capture yielded no further records.
    Drained {
        /// Packets broadcast before the stream drained.
        packets_sent: u64,
    },
    /// Shutdown was requested before the capture drained.
    Cancelled {
        /// Packets broadcast before the stream stopped.
        packets_sent: u64,
    },
}

impl ReplayOutcome {
    /// Packets broadcast before the run ended, however it ended.
    pub fn packets_sent(&self) -> u64 {
        match self {
            ReplayOutcome::Drained { packets_sent } => *packets_sent,
            ReplayOutcome::Cancelled { packets_sent } => *packets_sent,
        }
    }
}

/// Drive an opened capture to completion or shutdown.
///
/// The reader is consumed and released on every exit path. Capture
/// decode errors are fatal; client failures are absorbed by the
/// broadcaster.
pub async fn run_replay<R: Read>(
    mut reader: PcapReader<R>,
    registry: &ClientRegistry,
    config: &ServeConfig,
    shutdown: &mut watch::Receiver<bool>,
) -> Result<ReplayOutcome> {
    let mut pacer = Pacer::new();
    let mut cursor = ReplayCursor::new();
    let write_timeout = Duration::from_millis(config.write_timeout_ms);

    loop {
        if *shutdown.borrow() {
            tracing::info!("stopping telemetry stream");
            return Ok(ReplayOutcome::Cancelled {
                packets_sent: cursor.packets_sent(),
            });
        }

        let record = match reader.next_record()? {
            Some(record) => record,
            None => break,
        };

        let delay = pacer.delay_for(record.timestamp);
        if pacer.is_long_wait(delay) {
            tracing::info!("next telemetry in {:.2} seconds", delay.as_secs_f64());
        }
        if !delay.is_zero() {
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = shutdown.changed() => {
                    tracing::info!("stopping telemetry stream");
                    return Ok(ReplayOutcome::Cancelled {
                        packets_sent: cursor.packets_sent(),
                    });
                }
            }
        }

        let nbytes = record.payload.len();
        broadcast(registry, record.payload, write_timeout).await;
        cursor.observe_sent(nbytes, config.verbose);
    }

    let packets_sent = cursor.packets_sent();
    tracing::info!(packets = packets_sent, "telemetry stream drained");
    Ok(ReplayOutcome::Drained { packets_sent })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_packet_reported_once() {
        let mut cursor = ReplayCursor::new();
        assert_eq!(cursor.observe_sent(42, false), SendEvent::FirstPacket);
        assert_eq!(cursor.observe_sent(42, false), SendEvent::Quiet);
        assert_eq!(cursor.packets_sent(), 2);
    }

    #[test]
    fn test_verbose_reports_every_packet_after_first() {
        let mut cursor = ReplayCursor::new();
        assert_eq!(cursor.observe_sent(8, true), SendEvent::FirstPacket);
        assert_eq!(cursor.observe_sent(8, true), SendEvent::PerPacket);
        assert_eq!(cursor.observe_sent(8, true), SendEvent::PerPacket);
    }

    #[test]
    fn test_heartbeat_cadence_over_25_packets() {
        let mut cursor = ReplayCursor::new();
        let events: Vec<SendEvent> = (0..25).map(|_| cursor.observe_sent(16, false)).collect();

        assert_eq!(events[0], SendEvent::FirstPacket);
        assert_eq!(events[9], SendEvent::Heartbeat);
        assert_eq!(events[19], SendEvent::Heartbeat);
        let quiet = events
            .iter()
            .filter(|e| **e == SendEvent::Quiet)
            .count();
        assert_eq!(quiet, 22);
    }

    #[test]
    fn test_verbose_suppresses_heartbeat() {
        let mut cursor = ReplayCursor::new();
        for _ in 0..9 {
            cursor.observe_sent(4, true);
        }
        assert_eq!(cursor.observe_sent(4, true), SendEvent::PerPacket);
    }

    #[test]
    fn test_outcome_packets_sent() {
        assert_eq!(ReplayOutcome::Drained { packets_sent: 7 }.packets_sent(), 7);
        assert_eq!(
            ReplayOutcome::Cancelled { packets_sent: 3 }.packets_sent(),
            3
        );
    }
}
