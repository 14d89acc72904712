//! In-memory byte cursor
//!
//! The whole log is held in memory so seeks are plain offset changes. Every
//! read is bounds-checked and fails with [`EndOfStream`] instead of panicking;
//! callers decide whether that is a clean end of file or truncation.

/// Not enough bytes left for the requested read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndOfStream {
    pub needed: usize,
    pub available: usize,
}

/// Seekable, forward-reading view over log bytes.
#[derive(Debug, Clone)]
pub struct ByteCursor {
    data: Vec<u8>,
    position: usize,
}

impl ByteCursor {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data, position: 0 }
    }

    /// Current absolute offset.
    pub fn position(&self) -> u64 {
        self.position as u64
    }

    /// Move to an absolute offset. Offsets past the end clamp to the end.
    pub fn set_position(&mut self, position: u64) {
        self.position = usize::try_from(position).map_or(self.data.len(), |p| p.min(self.data.len()));
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.position
    }

    /// Guarantee that `n` more bytes are available.
    pub fn fill(&self, n: usize) -> Result<(), EndOfStream> {
        let available = self.remaining();
        if available < n { Err(EndOfStream { needed: n, available }) } else { Ok(()) }
    }

    /// Everything from the current position to the end of the stream.
    pub fn rest(&self) -> &[u8] {
        &self.data[self.position..]
    }

    pub fn take(&mut self, n: usize) -> Result<&[u8], EndOfStream> {
        self.fill(n)?;
        let start = self.position;
        self.position += n;
        Ok(&self.data[start..start + n])
    }

    pub fn skip(&mut self, n: usize) -> Result<(), EndOfStream> {
        self.fill(n)?;
        self.position += n;
        Ok(())
    }

    pub fn read_u8(&mut self) -> Result<u8, EndOfStream> {
        Ok(self.take(1)?[0])
    }

    pub fn read_u16_le(&mut self) -> Result<u16, EndOfStream> {
        let bytes = self.take(2)?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    pub fn read_u64_le(&mut self) -> Result<u64, EndOfStream> {
        let bytes = self.take(8)?;
        let mut raw = [0u8; 8];
        raw.copy_from_slice(bytes);
        Ok(u64::from_le_bytes(raw))
    }
}
