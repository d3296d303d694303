//! Binary codec for encoding and decoding WireChat data frames.
//!
//! Wire format (inbound, client to server):
//! ```text
//! [0x81][mask_bit:1 + length_indicator:7][extended_length:0|2|8][mask:4][payload:N]
//! ```
//!
//! Wire format (outbound, server to client):
//! ```text
//! [0x81][length_indicator:7][extended_length:0|2|8][payload:N]
//! ```
//!
//! The 7-bit length indicator selects how the true payload length is read:
//! values up to 125 are the length itself, 126 means the next 2 bytes hold a
//! big-endian length, and 127 means the next 8 bytes do.  Client-to-server
//! frames always carry the mask bit and a 4-byte mask; server-to-client
//! frames are unmasked.  All multi-byte integers are big-endian.
//!
//! Only single, non-fragmented text frames (first byte `0x81`) and the
//! one-way ping control frame (`0x89 0x00`) exist in this protocol subset.
//! Fragmentation, binary opcodes, and close handshakes are not supported.

use thiserror::Error;

/// First byte of a final, non-fragmented text data frame.
pub const TEXT_FRAME: u8 = 0x81;

/// The complete one-way keepalive control frame: ping opcode, empty payload.
pub const PING_FRAME: [u8; 2] = [0x89, 0x00];

/// High bit of the second byte: set when the payload is masked.
pub const MASK_BIT: u8 = 0x80;

/// Number of mask bytes in a masked frame.
pub const MASK_LENGTH: usize = 4;

/// Largest payload length representable in the 7-bit indicator itself.
pub const MAX_INLINE_LENGTH: usize = 125;

/// Length indicator meaning "the next 2 bytes hold the payload length".
const LENGTH_U16: u8 = 126;

/// Length indicator meaning "the next 8 bytes hold the payload length".
const LENGTH_U64: u8 = 127;

/// Errors that can occur while decoding a frame.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    /// The buffer ends before the header, mask, or declared payload does.
    #[error("truncated frame: need at least {needed} bytes, got {available}")]
    Truncated { needed: usize, available: usize },
}

/// One decoded inbound frame.
///
/// The payload slice borrows from the input buffer and is still masked;
/// pass it through [`unmask`] to recover the logical message.  Never stored –
/// the lifecycle controller consumes it immediately.
#[derive(Debug, PartialEq, Eq)]
pub struct DecodedFrame<'a> {
    /// Declared payload length in bytes.
    pub payload_len: usize,
    /// The 4-byte mask that was applied by the peer.
    pub mask: [u8; 4],
    /// The masked payload bytes, exactly `payload_len` long.
    pub payload: &'a [u8],
}

// ── Decode ────────────────────────────────────────────────────────────────────

/// Decodes one masked text frame from the beginning of `buf`.
///
/// The caller must already have checked that `buf[0]` is [`TEXT_FRAME`];
/// buffers with any other first byte are dropped upstream without a decode
/// attempt.  The 7-bit length indicator always falls in `0..=127`, so exactly
/// one of the three length branches matches.
///
/// # Errors
///
/// Returns [`FrameError::Truncated`] if the buffer is shorter than the
/// header, mask, and declared payload require.  The connection that produced
/// a truncated frame can no longer be trusted to be at a frame boundary, so
/// callers terminate it.
///
/// # Examples
///
/// ```rust
/// use wirechat_core::{decode_frame, encode_client_frame, unmask};
///
/// let frame = encode_client_frame(b"hi", [0xA1, 0xB2, 0xC3, 0xD4]);
/// let decoded = decode_frame(&frame).unwrap();
/// assert_eq!(decoded.payload_len, 2);
/// assert_eq!(unmask(decoded.mask, decoded.payload), b"hi");
/// ```
pub fn decode_frame(buf: &[u8]) -> Result<DecodedFrame<'_>, FrameError> {
    require_len(buf, 2)?;

    // Clear the mask bit to obtain the 7-bit length indicator.
    let indicator = buf[1] & !MASK_BIT;

    let (payload_len, mask_offset) = match indicator as usize {
        len @ 0..=MAX_INLINE_LENGTH => (len, 2),
        126 => {
            require_len(buf, 4)?;
            (u16::from_be_bytes([buf[2], buf[3]]) as usize, 4)
        }
        // 127: the indicator is 7 bits, so this is the only remaining value.
        _ => {
            require_len(buf, 10)?;
            let len = u64::from_be_bytes([
                buf[2], buf[3], buf[4], buf[5], buf[6], buf[7], buf[8], buf[9],
            ]);
            (len as usize, 10)
        }
    };

    let payload_offset = mask_offset + MASK_LENGTH;
    require_len(buf, payload_offset + payload_len)?;

    let mask = [
        buf[mask_offset],
        buf[mask_offset + 1],
        buf[mask_offset + 2],
        buf[mask_offset + 3],
    ];

    Ok(DecodedFrame {
        payload_len,
        mask,
        payload: &buf[payload_offset..payload_offset + payload_len],
    })
}

/// Reverses the peer's masking: XORs each payload byte with `mask[i % 4]`.
///
/// XOR is its own inverse, so the same function masks and unmasks.  Pure and
/// total – there is no failure mode.
pub fn unmask(mask: [u8; 4], payload: &[u8]) -> Vec<u8> {
    payload
        .iter()
        .enumerate()
        .map(|(i, byte)| byte ^ mask[i % MASK_LENGTH])
        .collect()
}

// ── Encode ────────────────────────────────────────────────────────────────────

/// Encodes an unmasked server-to-client text frame for `payload`.
///
/// Server-to-client frames carry no mask, matching the protocol's asymmetry.
/// The length encoding is symmetric with [`decode_frame`]: payloads up to 125
/// bytes use the inline length byte, up to 65535 the 2-byte extended form,
/// and anything larger the 8-byte form.
pub fn encode_text_frame(payload: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(payload.len() + 10);
    buf.push(TEXT_FRAME);
    write_length(&mut buf, payload.len(), 0);
    buf.extend_from_slice(payload);
    buf
}

/// Encodes a masked client-to-server text frame for `payload` using `mask`.
///
/// The inverse of [`decode_frame`] + [`unmask`].  Used by tests and by any
/// peer implementation sending toward a WireChat server.
pub fn encode_client_frame(payload: &[u8], mask: [u8; 4]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(payload.len() + 14);
    buf.push(TEXT_FRAME);
    write_length(&mut buf, payload.len(), MASK_BIT);
    buf.extend_from_slice(&mask);
    buf.extend(
        payload
            .iter()
            .enumerate()
            .map(|(i, byte)| byte ^ mask[i % MASK_LENGTH]),
    );
    buf
}

/// Writes the length indicator byte (OR-ed with `mask_bit`) and any extended
/// length bytes for a payload of `len` bytes.
fn write_length(buf: &mut Vec<u8>, len: usize, mask_bit: u8) {
    if len <= MAX_INLINE_LENGTH {
        buf.push(mask_bit | len as u8);
    } else if len <= u16::MAX as usize {
        buf.push(mask_bit | LENGTH_U16);
        buf.extend_from_slice(&(len as u16).to_be_bytes());
    } else {
        buf.push(mask_bit | LENGTH_U64);
        buf.extend_from_slice(&(len as u64).to_be_bytes());
    }
}

// ── Utility helpers ───────────────────────────────────────────────────────────

fn require_len(buf: &[u8], needed: usize) -> Result<(), FrameError> {
    if buf.len() < needed {
        Err(FrameError::Truncated {
            needed,
            available: buf.len(),
        })
    } else {
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const MASK: [u8; 4] = [0x37, 0xFA, 0x21, 0x3D];

    /// Builds a masked client frame by hand with an explicit length indicator,
    /// so the tests control exactly which decode branch is exercised.
    fn synthetic_frame(indicator: u8, extended: &[u8], payload: &[u8]) -> Vec<u8> {
        let mut buf = vec![TEXT_FRAME, MASK_BIT | indicator];
        buf.extend_from_slice(extended);
        buf.extend_from_slice(&MASK);
        buf.extend(
            payload
                .iter()
                .enumerate()
                .map(|(i, b)| b ^ MASK[i % MASK_LENGTH]),
        );
        buf
    }

    // ── Length branch selection ──────────────────────────────────────────────

    #[test]
    fn test_decode_selects_inline_branch_at_124() {
        let payload = vec![0x42u8; 124];
        let frame = synthetic_frame(124, &[], &payload);
        let decoded = decode_frame(&frame).unwrap();
        assert_eq!(decoded.payload_len, 124);
        assert_eq!(decoded.mask, MASK);
        assert_eq!(unmask(decoded.mask, decoded.payload), payload);
    }

    #[test]
    fn test_decode_selects_inline_branch_at_125() {
        let payload = vec![0x42u8; 125];
        let frame = synthetic_frame(125, &[], &payload);
        let decoded = decode_frame(&frame).unwrap();
        assert_eq!(decoded.payload_len, 125);
        // Mask occupies bytes 2..6, payload starts at byte 6.
        assert_eq!(&frame[2..6], &MASK);
        assert_eq!(decoded.payload, &frame[6..]);
    }

    #[test]
    fn test_decode_selects_two_byte_branch_at_126() {
        let payload = vec![0x42u8; 300];
        let frame = synthetic_frame(126, &300u16.to_be_bytes(), &payload);
        let decoded = decode_frame(&frame).unwrap();
        assert_eq!(decoded.payload_len, 300);
        // Mask occupies bytes 4..8, payload starts at byte 8.
        assert_eq!(&frame[4..8], &MASK);
        assert_eq!(decoded.payload, &frame[8..]);
    }

    #[test]
    fn test_decode_selects_eight_byte_branch_at_127() {
        let payload = vec![0x42u8; 70_000];
        let frame = synthetic_frame(127, &70_000u64.to_be_bytes(), &payload);
        let decoded = decode_frame(&frame).unwrap();
        assert_eq!(decoded.payload_len, 70_000);
        // Mask occupies bytes 10..14, payload starts at byte 14.
        assert_eq!(&frame[10..14], &MASK);
        assert_eq!(decoded.payload, &frame[14..]);
    }

    // ── Unmasking ────────────────────────────────────────────────────────────

    #[test]
    fn test_unmask_cycles_through_all_four_mask_bytes() {
        let masked: Vec<u8> = b"abcdefgh"
            .iter()
            .enumerate()
            .map(|(i, b)| b ^ MASK[i % 4])
            .collect();
        assert_eq!(unmask(MASK, &masked), b"abcdefgh");
    }

    #[test]
    fn test_unmask_empty_payload() {
        assert_eq!(unmask(MASK, &[]), Vec::<u8>::new());
    }

    #[test]
    fn test_unmask_is_its_own_inverse() {
        let payload = b"the quick brown fox";
        let once = unmask(MASK, payload);
        let twice = unmask(MASK, &once);
        assert_eq!(twice, payload);
    }

    // ── Round trips through the client encoder ───────────────────────────────

    #[test]
    fn test_round_trip_short_text() {
        let frame = encode_client_frame(b"hello", MASK);
        let decoded = decode_frame(&frame).unwrap();
        assert_eq!(unmask(decoded.mask, decoded.payload), b"hello");
    }

    #[test]
    fn test_round_trip_empty_payload() {
        let frame = encode_client_frame(b"", MASK);
        let decoded = decode_frame(&frame).unwrap();
        assert_eq!(decoded.payload_len, 0);
        assert_eq!(decoded.payload, b"");
    }

    #[test]
    fn test_round_trip_all_zero_payload() {
        let payload = vec![0u8; 125];
        let frame = encode_client_frame(&payload, MASK);
        let decoded = decode_frame(&frame).unwrap();
        assert_eq!(unmask(decoded.mask, decoded.payload), payload);
    }

    #[test]
    fn test_round_trip_all_ff_payload() {
        let payload = vec![0xFFu8; 125];
        let frame = encode_client_frame(&payload, [0xFF; 4]);
        let decoded = decode_frame(&frame).unwrap();
        assert_eq!(unmask(decoded.mask, decoded.payload), payload);
    }

    #[test]
    fn test_round_trip_zero_mask_leaves_payload_unchanged() {
        let frame = encode_client_frame(b"plain", [0; 4]);
        let decoded = decode_frame(&frame).unwrap();
        assert_eq!(decoded.payload, b"plain");
    }

    // ── Server-to-client encoding ────────────────────────────────────────────

    #[test]
    fn test_encode_text_frame_short_message() {
        let frame = encode_text_frame(b"hey");
        assert_eq!(frame, [0x81, 0x03, b'h', b'e', b'y']);
    }

    #[test]
    fn test_encode_text_frame_is_unmasked() {
        let frame = encode_text_frame(b"x");
        assert_eq!(frame[1] & MASK_BIT, 0, "server frames carry no mask bit");
    }

    #[test]
    fn test_encode_length_boundary_125_uses_inline_byte() {
        let frame = encode_text_frame(&[0u8; 125]);
        assert_eq!(frame[1], 125);
        assert_eq!(frame.len(), 2 + 125);
    }

    #[test]
    fn test_encode_length_boundary_126_uses_two_byte_form() {
        let frame = encode_text_frame(&[0u8; 126]);
        assert_eq!(frame[1], 126);
        assert_eq!(u16::from_be_bytes([frame[2], frame[3]]), 126);
        assert_eq!(frame.len(), 4 + 126);
    }

    #[test]
    fn test_encode_length_boundary_65535_uses_two_byte_form() {
        let frame = encode_text_frame(&vec![0u8; 65_535]);
        assert_eq!(frame[1], 126);
        assert_eq!(u16::from_be_bytes([frame[2], frame[3]]), 65_535);
    }

    #[test]
    fn test_encode_length_boundary_65536_uses_eight_byte_form() {
        let frame = encode_text_frame(&vec![0u8; 65_536]);
        assert_eq!(frame[1], 127);
        let len = u64::from_be_bytes([
            frame[2], frame[3], frame[4], frame[5], frame[6], frame[7], frame[8], frame[9],
        ]);
        assert_eq!(len, 65_536);
    }

    // ── Truncation ───────────────────────────────────────────────────────────

    #[test]
    fn test_decode_empty_buffer_is_truncated() {
        assert_eq!(
            decode_frame(&[]),
            Err(FrameError::Truncated {
                needed: 2,
                available: 0
            })
        );
    }

    #[test]
    fn test_decode_missing_extended_length_is_truncated() {
        // Indicator 126 promises 2 length bytes that are absent.
        let result = decode_frame(&[TEXT_FRAME, MASK_BIT | 126]);
        assert!(matches!(result, Err(FrameError::Truncated { .. })));
    }

    #[test]
    fn test_decode_missing_mask_is_truncated() {
        // Declares a 5-byte payload but stops after the header.
        let result = decode_frame(&[TEXT_FRAME, MASK_BIT | 5]);
        assert!(matches!(result, Err(FrameError::Truncated { .. })));
    }

    #[test]
    fn test_decode_payload_shorter_than_declared_is_truncated() {
        let mut frame = encode_client_frame(b"hello", MASK);
        frame.truncate(frame.len() - 2);
        assert!(matches!(
            decode_frame(&frame),
            Err(FrameError::Truncated { .. })
        ));
    }

    // ── Control frame constant ───────────────────────────────────────────────

    #[test]
    fn test_ping_frame_is_two_fixed_bytes() {
        assert_eq!(PING_FRAME, [0x89, 0x00]);
    }
}
