//! Payload codec: action tag + length header + filename + body.
//!
//! Layout (little-endian): `tag[4] filename_len[2] body_len[8] filename body`,
//! where the body is the file data for `FILE` and the URL for `HTTP`.

/// Action tag length in bytes.
pub const TAG_LEN: usize = 4;

/// Fixed header length: tag (4) + filename length (2) + body length (8).
pub const HEADER_LEN: usize = 14;

const TAG_FILE: &[u8; TAG_LEN] = b"FILE";
const TAG_HTTP: &[u8; TAG_LEN] = b"HTTP";

/// Decoded logical message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// Embedded file content to write out as `filename`.
    File { filename: String, data: Vec<u8> },
    /// URL to fetch; the response body is written out as `filename`.
    Http { filename: String, url: String },
}

impl Payload {
    /// Filename the dispatcher will write to, whatever the action.
    pub fn filename(&self) -> &str {
        match self {
            Payload::File { filename, .. } => filename,
            Payload::Http { filename, .. } => filename,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PayloadError {
    #[error("filename longer than 65535 bytes")]
    FilenameTooLong,
    #[error("payload truncated: need {need} bytes, have {have}")]
    Truncated { need: usize, have: usize },
    #[error("action tag {0:?} not recognized")]
    UnknownAction([u8; TAG_LEN]),
    #[error("{field} is not valid UTF-8")]
    InvalidUtf8 { field: &'static str },
}

fn encode(tag: &[u8; TAG_LEN], filename: &str, body: &[u8]) -> Result<Vec<u8>, PayloadError> {
    let filename_len =
        u16::try_from(filename.len()).map_err(|_| PayloadError::FilenameTooLong)?;
    let mut out = Vec::with_capacity(HEADER_LEN + filename.len() + body.len());
    out.extend_from_slice(tag);
    out.extend_from_slice(&filename_len.to_le_bytes());
    out.extend_from_slice(&(body.len() as u64).to_le_bytes());
    out.extend_from_slice(filename.as_bytes());
    out.extend_from_slice(body);
    Ok(out)
}

/// Encode a `FILE` payload: the data travels in-band.
pub fn encode_file_payload(filename: &str, data: &[u8]) -> Result<Vec<u8>, PayloadError> {
    encode(TAG_FILE, filename, data)
}

/// Encode an `HTTP` payload: only the URL travels; the receiver fetches.
pub fn encode_http_payload(filename: &str, url: &str) -> Result<Vec<u8>, PayloadError> {
    encode(TAG_HTTP, filename, url.as_bytes())
}

/// Decode a recovered payload. The declared lengths must fit inside `bytes`;
/// trailing bytes beyond the declared body are ignored for `HTTP` (the body
/// is sliced by its declared length) and consumed whole for `FILE` (the stop
/// marker, not the header, bounds the frame).
pub fn decode_payload(bytes: &[u8]) -> Result<Payload, PayloadError> {
    let (filename_len, body_len) = header_lengths(bytes)?;
    let filename_end = HEADER_LEN + filename_len as usize;
    if bytes.len() < filename_end {
        return Err(PayloadError::Truncated {
            need: filename_end,
            have: bytes.len(),
        });
    }
    let filename = std::str::from_utf8(&bytes[HEADER_LEN..filename_end])
        .map_err(|_| PayloadError::InvalidUtf8 { field: "filename" })?
        .to_owned();

    let mut tag = [0u8; TAG_LEN];
    tag.copy_from_slice(&bytes[..TAG_LEN]);
    match &tag {
        TAG_FILE => Ok(Payload::File {
            filename,
            data: bytes[filename_end..].to_vec(),
        }),
        TAG_HTTP => {
            let url_end = filename_end + body_len as usize;
            if bytes.len() < url_end {
                return Err(PayloadError::Truncated {
                    need: url_end,
                    have: bytes.len(),
                });
            }
            let url = std::str::from_utf8(&bytes[filename_end..url_end])
                .map_err(|_| PayloadError::InvalidUtf8 { field: "url" })?
                .to_owned();
            Ok(Payload::Http { filename, url })
        }
        other => Err(PayloadError::UnknownAction(*other)),
    }
}

fn header_lengths(bytes: &[u8]) -> Result<(u16, u64), PayloadError> {
    if bytes.len() < HEADER_LEN {
        return Err(PayloadError::Truncated {
            need: HEADER_LEN,
            have: bytes.len(),
        });
    }
    let filename_len = u16::from_le_bytes([bytes[4], bytes[5]]);
    let mut body = [0u8; 8];
    body.copy_from_slice(&bytes[6..14]);
    Ok((filename_len, u64::from_le_bytes(body)))
}

/// Best-effort read of the header length fields from a buffer that may still
/// be incomplete or error-correction-coded. Used for progress estimates
/// only; the values are advisory and may be bogus.
pub fn peek_declared_lengths(buf: &[u8]) -> Option<(u16, u64)> {
    header_lengths(buf).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_roundtrip() {
        let encoded = encode_file_payload("note.txt", b"hello").unwrap();
        match decode_payload(&encoded).unwrap() {
            Payload::File { filename, data } => {
                assert_eq!(filename, "note.txt");
                assert_eq!(data, b"hello");
            }
            other => panic!("expected File, got {:?}", other),
        }
    }

    #[test]
    fn file_header_layout() {
        let encoded = encode_file_payload("note.txt", b"hello").unwrap();
        assert_eq!(&encoded[..4], b"FILE");
        assert_eq!(&encoded[4..6], &8u16.to_le_bytes());
        assert_eq!(&encoded[6..14], &5u64.to_le_bytes());
        assert_eq!(&encoded[14..22], b"note.txt");
        assert_eq!(&encoded[22..], b"hello");
    }

    #[test]
    fn http_roundtrip() {
        let encoded = encode_http_payload("google.html", "http://google.com").unwrap();
        match decode_payload(&encoded).unwrap() {
            Payload::Http { filename, url } => {
                assert_eq!(filename, "google.html");
                assert_eq!(url, "http://google.com");
            }
            other => panic!("expected Http, got {:?}", other),
        }
    }

    #[test]
    fn empty_data_file() {
        let encoded = encode_file_payload("empty.bin", b"").unwrap();
        match decode_payload(&encoded).unwrap() {
            Payload::File { filename, data } => {
                assert_eq!(filename, "empty.bin");
                assert!(data.is_empty());
            }
            other => panic!("expected File, got {:?}", other),
        }
    }

    #[test]
    fn unknown_tag() {
        let mut encoded = encode_file_payload("x", b"y").unwrap();
        encoded[..4].copy_from_slice(b"ZZZZ");
        assert!(matches!(
            decode_payload(&encoded),
            Err(PayloadError::UnknownAction(tag)) if &tag == b"ZZZZ"
        ));
    }

    #[test]
    fn truncated_header() {
        assert!(matches!(
            decode_payload(b"FILE\x08\x00"),
            Err(PayloadError::Truncated { .. })
        ));
    }

    #[test]
    fn truncated_filename() {
        let encoded = encode_file_payload("longname.txt", b"data").unwrap();
        assert!(matches!(
            decode_payload(&encoded[..HEADER_LEN + 3]),
            Err(PayloadError::Truncated { .. })
        ));
    }

    #[test]
    fn invalid_utf8_filename() {
        let mut encoded = encode_file_payload("ab", b"data").unwrap();
        encoded[HEADER_LEN] = 0xff;
        encoded[HEADER_LEN + 1] = 0xfe;
        assert!(matches!(
            decode_payload(&encoded),
            Err(PayloadError::InvalidUtf8 { field: "filename" })
        ));
    }

    #[test]
    fn filename_too_long() {
        let name = "a".repeat(1 << 16);
        assert!(matches!(
            encode_file_payload(&name, b""),
            Err(PayloadError::FilenameTooLong)
        ));
    }

    #[test]
    fn peek_lengths() {
        let encoded = encode_file_payload("note.txt", b"hello").unwrap();
        assert_eq!(peek_declared_lengths(&encoded), Some((8, 5)));
        assert_eq!(peek_declared_lengths(&encoded[..10]), None);
    }
}
