//! Per-datagram header.
//!
//! Wire format:
//! ```text
//! ┌──────────────┬──────────────┬─────────────────┐
//! │ Magic (2B)   │ Handles      │ Payload          │
//! │ 0x43 0x4C    │ (2B LE)      │ (rest of packet) │
//! │ "CL"         │              │                  │
//! └──────────────┴──────────────┴─────────────────┘
//! ```
//!
//! The header keeps every datagram non-empty, so a zero-length receive always
//! means end-of-stream, and lets the reader cross-check the descriptor count
//! delivered in the control message.

use bytes::{Buf, BufMut};

use crate::error::{ChannelError, Result};

/// Header size: magic (2) + handle count (2).
pub const HEADER_SIZE: usize = 4;

/// Magic bytes: "CL" (0x43 0x4C).
pub const MAGIC: [u8; 2] = [0x43, 0x4C];

/// Encode the header for a message carrying `handle_count` handles.
pub fn encode_header(handle_count: u16) -> [u8; HEADER_SIZE] {
    let mut header = [0u8; HEADER_SIZE];
    let mut dst = &mut header[..];
    dst.put_slice(&MAGIC);
    dst.put_u16_le(handle_count);
    header
}

/// Decode a header from the front of a datagram and return its handle count.
pub fn decode_header(datagram: &[u8]) -> Result<u16> {
    let mut src = datagram;
    if src.remaining() < HEADER_SIZE {
        return Err(ChannelError::Malformed("datagram shorter than header"));
    }

    let mut magic = [0u8; 2];
    src.copy_to_slice(&mut magic);
    if magic != MAGIC {
        return Err(ChannelError::Malformed("invalid header magic"));
    }

    Ok(src.get_u16_le())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_layout() {
        assert_eq!(encode_header(0x0102), [0x43, 0x4C, 0x02, 0x01]);
    }

    #[test]
    fn decode_reads_handle_count() {
        let mut datagram = encode_header(3).to_vec();
        datagram.extend_from_slice(b"payload");
        assert_eq!(decode_header(&datagram).unwrap(), 3);
    }

    #[test]
    fn decode_rejects_short_datagram() {
        let err = decode_header(&[0x43, 0x4C, 0x00]).unwrap_err();
        assert!(matches!(err, ChannelError::Malformed(_)));
    }

    #[test]
    fn decode_rejects_bad_magic() {
        let err = decode_header(&[0xFF, 0xFF, 0x00, 0x00]).unwrap_err();
        assert!(matches!(err, ChannelError::Malformed(_)));
    }
}
