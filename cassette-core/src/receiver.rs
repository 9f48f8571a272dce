//! Frame receiver: a single-shot state machine over an unbounded byte
//! stream. Searches for the start marker, accumulates coded payload bytes
//! until the stop marker, then runs error-correction decode and payload
//! parse. Exactly one capture per invocation; the receiver never loops for
//! a second frame.

use std::io::Read;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::fec::{FecError, RsCodec};
use crate::frame::{MARKER_LEN, START_MARKER, STOP_MARKER};
use crate::marker::MarkerWindow;
use crate::payload::{self, Payload, PayloadError, HEADER_LEN};

/// Default interval between progress reports while capturing.
pub const DEFAULT_PROGRESS_INTERVAL: Duration = Duration::from_secs(10);

/// Periodic capture progress. `declared_total` is read speculatively from
/// the (still coded, possibly incomplete) payload header and may be bogus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub bytes_received: usize,
    pub declared_total: Option<u64>,
}

/// Result of a completed capture.
#[derive(Debug)]
pub enum FrameOutcome {
    /// Frame recovered and parsed; ready for dispatch.
    Payload {
        payload: Payload,
        stats: crate::fec::CorrectionStats,
    },
    /// Frame recovered but the action tag is not one of ours. The frame is
    /// consumed; nothing to dispatch.
    UnknownAction { tag: [u8; 4] },
}

#[derive(Debug, thiserror::Error)]
pub enum ReceiveError {
    /// Byte source closed before a complete frame was observed.
    #[error("byte source ended before a complete frame (state: {state})")]
    FramingTimeout { state: &'static str },
    #[error("error correction failed: {0}")]
    Uncorrectable(#[from] FecError),
    #[error("malformed payload: {0}")]
    Malformed(PayloadError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Receiver tuning knobs.
pub struct ReceiverConfig {
    pub progress_interval: Duration,
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self {
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }
}

enum State {
    /// Searching the stream for the start marker.
    Idle { window: MarkerWindow },
    /// Accumulating coded payload bytes, watching for the stop marker.
    Capturing {
        window: MarkerWindow,
        captured: Vec<u8>,
        last_report: Instant,
    },
}

/// One-frame receiver. Construct, optionally attach a progress callback,
/// then call [`FrameReceiver::run`] with the modem's output stream.
pub struct FrameReceiver {
    codec: RsCodec,
    config: ReceiverConfig,
    on_progress: Option<Box<dyn FnMut(Progress) + Send>>,
}

impl FrameReceiver {
    pub fn new(codec: RsCodec) -> Self {
        Self::with_config(codec, ReceiverConfig::default())
    }

    pub fn with_config(codec: RsCodec, config: ReceiverConfig) -> Self {
        Self {
            codec,
            config,
            on_progress: None,
        }
    }

    /// Attach a callback invoked on each periodic progress report.
    pub fn on_progress<F>(mut self, f: F) -> Self
    where
        F: FnMut(Progress) + Send + 'static,
    {
        self.on_progress = Some(Box::new(f));
        self
    }

    /// Consume the stream one byte at a time until a frame completes or the
    /// source is exhausted. Blocks for as long as the source blocks; pacing
    /// is entirely the modem's.
    pub fn run<R: Read>(mut self, reader: R) -> Result<FrameOutcome, ReceiveError> {
        let mut state = State::Idle {
            window: MarkerWindow::new(),
        };

        for byte in reader.bytes() {
            let byte = byte?;
            match &mut state {
                State::Idle { window } => {
                    window.push(byte);
                    if window.matches(START_MARKER) {
                        info!("start of message received");
                        state = State::Capturing {
                            window: MarkerWindow::new(),
                            captured: Vec::new(),
                            last_report: Instant::now(),
                        };
                    }
                }
                State::Capturing {
                    window,
                    captured,
                    last_report,
                } => {
                    captured.push(byte);
                    window.push(byte);

                    if window.matches(STOP_MARKER) {
                        info!("end of message received");
                        captured.truncate(captured.len() - MARKER_LEN);
                        let captured = std::mem::take(captured);
                        return self.finalize(captured);
                    }

                    if last_report.elapsed() >= self.config.progress_interval {
                        *last_report = Instant::now();
                        let progress = Progress {
                            bytes_received: captured.len(),
                            declared_total: payload::peek_declared_lengths(captured)
                                .map(|(_, total)| total),
                        };
                        match progress.declared_total {
                            Some(total) => {
                                info!("{}/{} bytes received", progress.bytes_received, total)
                            }
                            None => info!("{} bytes received", progress.bytes_received),
                        }
                        if let Some(f) = self.on_progress.as_mut() {
                            f(progress);
                        }
                    }
                }
            }
        }

        Err(ReceiveError::FramingTimeout {
            state: match state {
                State::Idle { .. } => "idle",
                State::Capturing { .. } => "capturing",
            },
        })
    }

    fn finalize(&self, captured: Vec<u8>) -> Result<FrameOutcome, ReceiveError> {
        if captured.len() <= self.codec.redundancy() {
            return Err(ReceiveError::Malformed(PayloadError::Truncated {
                need: self.codec.redundancy() + 1,
                have: captured.len(),
            }));
        }
        if let Some((filename_len, body_len)) = payload::peek_declared_lengths(&captured) {
            let implied = HEADER_LEN as u64 + filename_len as u64 + body_len;
            let recoverable = (captured.len() - self.codec.redundancy()) as u64;
            if implied > recoverable {
                // Advisory header disagrees with what we captured; the
                // error-correction code decides whether decode is possible.
                warn!(
                    "header declares {} payload bytes but only {} were captured",
                    implied, recoverable
                );
            }
        }

        let (recovered, stats) = self.codec.decode(&captured)?;
        if stats.corrected_symbols > 0 {
            info!("corrected {} symbols", stats.corrected_symbols);
        }
        match payload::decode_payload(&recovered) {
            Ok(payload) => Ok(FrameOutcome::Payload { payload, stats }),
            Err(PayloadError::UnknownAction(tag)) => {
                warn!("unhandled action {:?}", tag);
                Ok(FrameOutcome::UnknownAction { tag })
            }
            Err(e) => Err(ReceiveError::Malformed(e)),
        }
    }
}
