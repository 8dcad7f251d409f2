use async_trait::async_trait;
use std::io;

use super::ReadAt;

/// Random access over an archive that is already in memory.
///
/// The reader owns the bytes; dropping it releases the buffer.
pub struct MemoryReader {
    data: Vec<u8>,
}

impl MemoryReader {
    /// Create a reader that takes ownership of `data`.
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self { data: data.into() }
    }
}

#[async_trait]
impl ReadAt for MemoryReader {
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        let len = self.data.len() as u64;
        if offset >= len {
            return Ok(0);
        }

        let start = offset as usize;
        let n = buf.len().min(self.data.len() - start);
        buf[..n].copy_from_slice(&self.data[start..start + n]);
        Ok(n)
    }

    fn size(&self) -> u64 {
        self.data.len() as u64
    }
}
