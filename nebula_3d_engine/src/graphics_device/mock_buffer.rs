/// Mock Buffer for unit tests (no GPU required)
///
/// Records every write into CPU memory so pose flushes and uniform
/// packing can be asserted on without a graphics device.

use std::sync::Mutex;
use crate::error::Result;
use crate::engine_bail;
use super::buffer::Buffer;

/// CPU-side stand-in for a GPU buffer.
pub struct MockBuffer {
    size: u64,
    contents: Mutex<Vec<u8>>,
}

impl MockBuffer {
    pub fn new(size: u64) -> Self {
        Self {
            size,
            contents: Mutex::new(vec![0u8; size as usize]),
        }
    }

    /// Snapshot of the buffer contents after all updates so far.
    pub fn contents(&self) -> Vec<u8> {
        self.contents.lock().unwrap().clone()
    }
}

impl Buffer for MockBuffer {
    fn update(&self, offset: u64, data: &[u8]) -> Result<()> {
        if offset + data.len() as u64 > self.size {
            engine_bail!("nebula3d::MockBuffer",
                "update out of bounds: offset {} + len {} > size {}",
                offset, data.len(), self.size);
        }
        let mut contents = self.contents.lock().unwrap();
        contents[offset as usize..offset as usize + data.len()].copy_from_slice(data);
        Ok(())
    }

    fn size(&self) -> u64 {
        self.size
    }
}
