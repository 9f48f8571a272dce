//! Fixed-capacity sliding window over the most recent marker-length bytes.

use crate::frame::MARKER_LEN;

/// Ring buffer holding the last [`MARKER_LEN`] bytes pushed. No allocation;
/// marker length is a protocol constant.
#[derive(Debug, Clone)]
pub struct MarkerWindow {
    buf: [u8; MARKER_LEN],
    next: usize,
    filled: usize,
}

impl MarkerWindow {
    pub fn new() -> Self {
        Self {
            buf: [0; MARKER_LEN],
            next: 0,
            filled: 0,
        }
    }

    /// Push one byte, evicting the oldest once the window is full.
    pub fn push(&mut self, byte: u8) {
        self.buf[self.next] = byte;
        self.next = (self.next + 1) % MARKER_LEN;
        if self.filled < MARKER_LEN {
            self.filled += 1;
        }
    }

    /// Exact comparison of the window contents, in arrival order, against a
    /// marker. Always false until the window has seen a full marker's worth
    /// of bytes.
    pub fn matches(&self, marker: &[u8; MARKER_LEN]) -> bool {
        if self.filled < MARKER_LEN {
            return false;
        }
        for (i, &expected) in marker.iter().enumerate() {
            if self.buf[(self.next + i) % MARKER_LEN] != expected {
                return false;
            }
        }
        true
    }
}

impl Default for MarkerWindow {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{START_MARKER, STOP_MARKER};

    #[test]
    fn matches_after_exact_marker() {
        let mut w = MarkerWindow::new();
        for &b in START_MARKER {
            assert!(!w.matches(START_MARKER));
            w.push(b);
        }
        assert!(w.matches(START_MARKER));
        assert!(!w.matches(STOP_MARKER));
    }

    #[test]
    fn matches_marker_after_noise() {
        let mut w = MarkerWindow::new();
        for &b in b"xxxSTARTDATxxx" {
            w.push(b);
        }
        assert!(!w.matches(START_MARKER));
        for &b in START_MARKER {
            w.push(b);
        }
        assert!(w.matches(START_MARKER));
    }

    #[test]
    fn near_miss_does_not_match() {
        let mut w = MarkerWindow::new();
        for &b in b"STARTDATB" {
            w.push(b);
        }
        assert!(!w.matches(START_MARKER));
    }

    #[test]
    fn partial_window_never_matches() {
        let mut w = MarkerWindow::new();
        for &b in &START_MARKER[..MARKER_LEN - 1] {
            w.push(b);
        }
        assert!(!w.matches(START_MARKER));
    }

    #[test]
    fn stale_bytes_evicted() {
        let mut w = MarkerWindow::new();
        for &b in START_MARKER {
            w.push(b);
        }
        w.push(b'!');
        assert!(!w.matches(START_MARKER));
    }
}
