//! Frame header decoding
//!
//! Every record in the stream is `[u8 type][u16 LE size][size payload bytes]`.

use super::cursor::{ByteCursor, EndOfStream};
use tracing::trace;

/// Size of the frame header in bytes.
pub const FRAME_HEADER_SIZE: usize = 3;

/// Fixed prefix of every DATA payload: msg ID, multi ID, timestamp.
pub const DATA_HEADER_SIZE: usize = 10;

pub const MESSAGE_TYPE_FORMAT: u8 = b'F';
pub const MESSAGE_TYPE_DATA: u8 = b'D';
pub const MESSAGE_TYPE_INFO: u8 = b'I';
pub const MESSAGE_TYPE_PARAMETER: u8 = b'P';

/// Known record kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    Format,
    Data,
    Info,
    Parameter,
}

impl MessageType {
    pub const fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            MESSAGE_TYPE_FORMAT => Some(MessageType::Format),
            MESSAGE_TYPE_DATA => Some(MessageType::Data),
            MESSAGE_TYPE_INFO => Some(MessageType::Info),
            MESSAGE_TYPE_PARAMETER => Some(MessageType::Parameter),
            _ => None,
        }
    }

    pub const fn tag(&self) -> u8 {
        match self {
            MessageType::Format => MESSAGE_TYPE_FORMAT,
            MessageType::Data => MESSAGE_TYPE_DATA,
            MessageType::Info => MESSAGE_TYPE_INFO,
            MessageType::Parameter => MESSAGE_TYPE_PARAMETER,
        }
    }
}

/// Decoded frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// Offset of the first header byte
    pub offset: u64,
    /// Raw type tag (may be unknown)
    pub tag: u8,
    /// Payload length in bytes
    pub size: usize,
}

impl FrameHeader {
    /// Read a header at the cursor.
    ///
    /// Returns `Ok(None)` only when the cursor sits exactly at the end of the
    /// stream. One or two trailing bytes are a truncated header.
    pub fn read(cursor: &mut ByteCursor) -> Result<Option<Self>, EndOfStream> {
        if cursor.remaining() == 0 {
            return Ok(None);
        }
        cursor.fill(FRAME_HEADER_SIZE)?;

        let offset = cursor.position();
        let tag = cursor.read_u8()?;
        let size = cursor.read_u16_le()? as usize;
        trace!("Frame at {:#x}: type {:#04x}, size {}", offset, tag, size);

        Ok(Some(Self { offset, tag, size }))
    }

    pub fn message_type(&self) -> Option<MessageType> {
        MessageType::from_tag(self.tag)
    }

    pub fn payload_offset(&self) -> u64 {
        self.offset + FRAME_HEADER_SIZE as u64
    }

    /// Offset of the next frame boundary according to the declared size.
    pub fn end(&self) -> u64 {
        self.payload_offset() + self.size as u64
    }

    /// Header bytes for a frame of the given type and payload length.
    pub fn encode(tag: u8, size: u16) -> [u8; FRAME_HEADER_SIZE] {
        let [lo, hi] = size.to_le_bytes();
        [tag, lo, hi]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_is_little_endian() {
        let mut cursor = ByteCursor::new(vec![b'D', 0x2C, 0x01]);
        let header = FrameHeader::read(&mut cursor).unwrap().unwrap();
        assert_eq!(header.size, 0x2C + 256);
        assert_eq!(header.message_type(), Some(MessageType::Data));
        assert_eq!(header.end(), 3 + 300);
    }

    #[test]
    fn clean_end_versus_truncated_header() {
        let mut empty = ByteCursor::new(vec![]);
        assert_eq!(FrameHeader::read(&mut empty), Ok(None));

        let mut short = ByteCursor::new(vec![b'F', 0x01]);
        assert_eq!(
            FrameHeader::read(&mut short),
            Err(EndOfStream { needed: FRAME_HEADER_SIZE, available: 2 })
        );
    }

    #[test]
    fn tags_roundtrip_and_unknown_tags() {
        for ty in [MessageType::Format, MessageType::Data, MessageType::Info, MessageType::Parameter]
        {
            assert_eq!(MessageType::from_tag(ty.tag()), Some(ty));
        }
        assert_eq!(MessageType::from_tag(b'Z'), None);
        assert_eq!(FrameHeader::encode(b'I', 0x0102), [b'I', 0x02, 0x01]);
    }
}
