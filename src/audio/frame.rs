//! Binary frame decoding.
//!
//! Each inbound WebSocket message carries raw little-endian signed 16-bit
//! PCM. A message whose length is not a multiple of the sample width is
//! rejected; the caller logs it and skips the chunk without touching the
//! segment buffer.

use crate::error::{Result, UtterdError};

/// Width of one PCM sample in bytes.
pub const BYTES_PER_SAMPLE: usize = 2;

/// Decode a binary message into 16-bit PCM samples.
///
/// An empty message decodes to an empty chunk. An odd-length message is a
/// `MalformedFrame` error.
pub fn decode_frame(bytes: &[u8]) -> Result<Vec<i16>> {
    if bytes.len() % BYTES_PER_SAMPLE != 0 {
        return Err(UtterdError::MalformedFrame { len: bytes.len() });
    }

    Ok(bytes
        .chunks_exact(BYTES_PER_SAMPLE)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_little_endian_samples() {
        let bytes = [0x01, 0x00, 0xFF, 0xFF, 0x00, 0x80];
        let samples = decode_frame(&bytes).unwrap();
        assert_eq!(samples, vec![1, -1, i16::MIN]);
    }

    #[test]
    fn empty_message_decodes_to_empty_chunk() {
        let samples = decode_frame(&[]).unwrap();
        assert!(samples.is_empty());
    }

    #[test]
    fn odd_length_message_is_rejected() {
        let result = decode_frame(&[0x01, 0x00, 0x7F]);
        match result {
            Err(UtterdError::MalformedFrame { len }) => assert_eq!(len, 3),
            other => panic!("Expected MalformedFrame, got {:?}", other),
        }
    }

    #[test]
    fn single_byte_message_is_rejected() {
        assert!(decode_frame(&[0xAB]).is_err());
    }

    #[test]
    fn sample_count_is_half_byte_count() {
        let bytes = vec![0u8; 320];
        let samples = decode_frame(&bytes).unwrap();
        assert_eq!(samples.len(), 160);
    }
}
