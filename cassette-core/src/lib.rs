//! Data Cassette protocol reference implementation.
//! Frames a file (or a URL-to-fetch instruction) as a marker-delimited,
//! Reed-Solomon-coded byte stream for an external audio modem; the host
//! passes byte channels and receives outcomes.

pub mod dispatch;
pub mod fec;
pub mod frame;
pub mod marker;
pub mod payload;
pub mod receiver;

pub use dispatch::{DispatchError, DispatchReport, Dispatcher, FetchError, Fetcher};
pub use fec::{CorrectionStats, FecError, RsCodec, DEFAULT_REDUNDANCY};
pub use frame::{transmit, FrameEncoder, MARKER_LEN, START_MARKER, STOP_MARKER};
pub use payload::{
    decode_payload, encode_file_payload, encode_http_payload, Payload, PayloadError,
};
pub use receiver::{
    FrameOutcome, FrameReceiver, Progress, ReceiveError, ReceiverConfig,
};
