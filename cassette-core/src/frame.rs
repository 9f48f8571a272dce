//! Frame assembly: lead-in, start marker, coded payload, stop marker,
//! lead-out. The lead bytes give the modem time to lock onto the carrier
//! and are never interpreted.

use std::io::{self, Write};
use std::thread;

use crate::fec::RsCodec;

/// Marker length in bytes; the receiver's detection window is exactly this
/// wide.
pub const MARKER_LEN: usize = 9;

/// Marks the first byte after it as the start of the coded payload.
pub const START_MARKER: &[u8; MARKER_LEN] = b"STARTDATA";

/// Marks the end of the coded payload. Must stay distinct from
/// [`START_MARKER`].
pub const STOP_MARKER: &[u8; MARKER_LEN] = b"STOP DATA";

/// Synchronization padding before and after the markers.
pub const LEAD: &[u8; 10] = b"0000000000";

/// Builds transmittable frames around an error-correction codec.
pub struct FrameEncoder {
    codec: RsCodec,
}

impl FrameEncoder {
    pub fn new(codec: RsCodec) -> Self {
        Self { codec }
    }

    /// Wrap an encoded payload into a complete frame. Pure: identical input
    /// yields byte-identical output.
    pub fn build_frame(&self, payload: &[u8]) -> Vec<u8> {
        let coded_len = self.codec.coded_len(payload.len());
        let mut out =
            Vec::with_capacity(2 * LEAD.len() + 2 * MARKER_LEN + coded_len);
        out.extend_from_slice(LEAD);
        out.extend_from_slice(START_MARKER);
        out.extend_from_slice(&self.codec.encode(payload));
        out.extend_from_slice(STOP_MARKER);
        out.extend_from_slice(LEAD);
        out
    }
}

/// Hand a frame to the modem's input on a dedicated worker and wait for the
/// write to finish. The caller blocks until the sink has consumed the whole
/// frame or the write fails; success is never reported early.
pub fn transmit<W: Write + Send>(mut sink: W, frame: &[u8]) -> io::Result<()> {
    thread::scope(|scope| {
        scope
            .spawn(move || {
                sink.write_all(frame)?;
                sink.flush()
            })
            .join()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "transmit worker panicked"))?
    })
}
