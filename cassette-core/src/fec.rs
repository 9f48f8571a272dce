//! Error-correction envelope: systematic Reed-Solomon over GF(2^8).
//!
//! The payload is split into blocks of `255 - redundancy` bytes and each
//! block carries `redundancy` parity symbols. Encoder and decoder must be
//! built with the same redundancy; the coded stream does not describe it.

use reed_solomon::{Decoder, DecoderError, Encoder};

/// Parity symbols per block shared by both ends of the channel.
pub const DEFAULT_REDUNDANCY: usize = 20;

/// GF(2^8) code word length; blocks never exceed this.
const BLOCK_LEN: usize = 255;

/// Correction statistics reported by a successful decode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CorrectionStats {
    /// Symbols corrected across all blocks.
    pub corrected_symbols: usize,
    /// Caller-flagged erasures that were filled in (none in the receive
    /// path; the modem gives no erasure information).
    pub erasures: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum FecError {
    #[error("corruption exceeds correction capacity")]
    Uncorrectable,
    #[error("coded block of {0} bytes is shorter than the parity footer")]
    InputTooShort(usize),
    #[error("redundancy must be in 1..{BLOCK_LEN}, got {0}")]
    BadRedundancy(usize),
}

/// Reed-Solomon codec with a fixed per-block parity length.
pub struct RsCodec {
    encoder: Encoder,
    decoder: Decoder,
    redundancy: usize,
}

impl RsCodec {
    pub fn new(redundancy: usize) -> Result<Self, FecError> {
        if redundancy == 0 || redundancy >= BLOCK_LEN {
            return Err(FecError::BadRedundancy(redundancy));
        }
        Ok(Self {
            encoder: Encoder::new(redundancy),
            decoder: Decoder::new(redundancy),
            redundancy,
        })
    }

    pub fn redundancy(&self) -> usize {
        self.redundancy
    }

    /// Data bytes per coded block.
    fn block_data_len(&self) -> usize {
        BLOCK_LEN - self.redundancy
    }

    /// Coded length for a payload of `payload_len` bytes.
    pub fn coded_len(&self, payload_len: usize) -> usize {
        let blocks = payload_len.div_ceil(self.block_data_len());
        payload_len + blocks * self.redundancy
    }

    /// Append parity symbols block by block.
    pub fn encode(&self, payload: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.coded_len(payload.len()));
        for block in payload.chunks(self.block_data_len()) {
            out.extend_from_slice(&self.encoder.encode(block));
        }
        out
    }

    /// Recover the payload from a coded stream, correcting up to
    /// `redundancy / 2` symbol errors per block.
    pub fn decode(&self, coded: &[u8]) -> Result<(Vec<u8>, CorrectionStats), FecError> {
        let mut payload = Vec::with_capacity(coded.len());
        let mut stats = CorrectionStats::default();
        for block in coded.chunks(BLOCK_LEN) {
            if block.len() <= self.redundancy {
                return Err(FecError::InputTooShort(block.len()));
            }
            let (recovered, corrected) = self
                .decoder
                .correct_err_count(block, None)
                .map_err(|_: DecoderError| FecError::Uncorrectable)?;
            stats.corrected_symbols += corrected;
            payload.extend_from_slice(recovered.data());
        }
        Ok((payload, stats))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::RngCore;

    fn codec() -> RsCodec {
        RsCodec::new(DEFAULT_REDUNDANCY).unwrap()
    }

    #[test]
    fn clean_roundtrip() {
        let payload = b"the quick brown fox";
        let coded = codec().encode(payload);
        assert_eq!(coded.len(), payload.len() + DEFAULT_REDUNDANCY);
        let (recovered, stats) = codec().decode(&coded).unwrap();
        assert_eq!(recovered, payload);
        assert_eq!(stats.corrected_symbols, 0);
    }

    #[test]
    fn multi_block_roundtrip() {
        let mut payload = vec![0u8; 1000];
        rand::thread_rng().fill_bytes(&mut payload);
        let coded = codec().encode(&payload);
        // 1000 bytes -> ceil(1000/235) = 5 blocks, 20 parity each.
        assert_eq!(coded.len(), 1000 + 5 * DEFAULT_REDUNDANCY);
        let (recovered, _) = codec().decode(&coded).unwrap();
        assert_eq!(recovered, payload);
    }

    #[test]
    fn corrects_up_to_half_redundancy() {
        let payload = b"payload under one block";
        let mut coded = codec().encode(payload);
        for i in 0..DEFAULT_REDUNDANCY / 2 {
            coded[i * 2] ^= 0x5a;
        }
        let (recovered, stats) = codec().decode(&coded).unwrap();
        assert_eq!(recovered, payload);
        assert_eq!(stats.corrected_symbols, DEFAULT_REDUNDANCY / 2);
    }

    #[test]
    fn corrects_errors_in_every_block() {
        let mut payload = vec![0u8; 600];
        rand::thread_rng().fill_bytes(&mut payload);
        let mut coded = codec().encode(&payload);
        // Three errors near the front of each 255-byte block.
        let blocks = coded.len() / BLOCK_LEN + 1;
        for b in 0..blocks {
            for i in 0..3 {
                let idx = b * BLOCK_LEN + i * 7;
                if idx < coded.len() {
                    coded[idx] ^= 0xff;
                }
            }
        }
        let (recovered, stats) = codec().decode(&coded).unwrap();
        assert_eq!(recovered, payload);
        assert!(stats.corrected_symbols > 0);
    }

    #[test]
    fn uncorrectable_past_capacity() {
        let payload = b"a block with far too much damage to repair";
        let mut coded = codec().encode(payload);
        for i in 0..15 {
            coded[i] ^= 0xa5;
        }
        // 15 errors in one block exceeds the 10-error bound.
        match codec().decode(&coded) {
            Err(FecError::Uncorrectable) => {}
            Ok((recovered, _)) => panic!("decoded corrupt block to {:?}", recovered),
            Err(e) => panic!("unexpected error {e}"),
        }
    }

    #[test]
    fn rejects_short_input() {
        assert!(matches!(
            codec().decode(&[0u8; 10]),
            Err(FecError::InputTooShort(10))
        ));
    }

    #[test]
    fn rejects_bad_redundancy() {
        assert!(matches!(RsCodec::new(0), Err(FecError::BadRedundancy(0))));
        assert!(matches!(
            RsCodec::new(255),
            Err(FecError::BadRedundancy(255))
        ));
    }
}
