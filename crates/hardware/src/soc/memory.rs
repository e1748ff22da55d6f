//! Main memory.
//!
//! A flat, byte-addressed, little-endian array starting at address 0. Every
//! access is bounds-checked; an access that runs past the end reports
//! [`ExecutionError::MemoryOutOfBounds`] instead of wrapping.

use crate::common::error::ExecutionError;
use crate::isa::opcode::MemWidth;

/// Byte-addressed main memory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Memory {
    bytes: Vec<u8>,
}

impl Memory {
    /// Creates `size` bytes of zeroed memory.
    pub fn new(size: usize) -> Self {
        Self {
            bytes: vec![0; size],
        }
    }

    /// Size in bytes.
    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    fn range(&self, addr: u64, size: usize) -> Result<std::ops::Range<usize>, ExecutionError> {
        let out_of_bounds = ExecutionError::MemoryOutOfBounds {
            address: addr,
            size,
        };
        let start = usize::try_from(addr).map_err(|_| out_of_bounds.clone())?;
        let end = start.checked_add(size).ok_or_else(|| out_of_bounds.clone())?;
        if end > self.bytes.len() {
            return Err(out_of_bounds);
        }
        Ok(start..end)
    }

    /// Checks that `width` bytes at `addr` are inside memory.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutionError::MemoryOutOfBounds`] otherwise.
    pub fn check(&self, addr: u64, width: MemWidth) -> Result<(), ExecutionError> {
        self.range(addr, width.bytes()).map(|_| ())
    }

    /// Reads `width` bytes at `addr`, zero-extended.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutionError::MemoryOutOfBounds`] if the access leaves memory.
    pub fn read(&self, addr: u64, width: MemWidth) -> Result<u64, ExecutionError> {
        let range = self.range(addr, width.bytes())?;
        let mut buf = [0u8; 8];
        buf[..width.bytes()].copy_from_slice(&self.bytes[range]);
        Ok(u64::from_le_bytes(buf))
    }

    /// Writes the low `width` bytes of `value` at `addr`.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutionError::MemoryOutOfBounds`] if the access leaves memory.
    pub fn write(&mut self, addr: u64, width: MemWidth, value: u64) -> Result<(), ExecutionError> {
        let range = self.range(addr, width.bytes())?;
        self.bytes[range].copy_from_slice(&value.to_le_bytes()[..width.bytes()]);
        Ok(())
    }

    /// Copies `data` into memory starting at `addr`.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutionError::MemoryOutOfBounds`] if the data does not fit.
    pub fn load(&mut self, addr: u64, data: &[u8]) -> Result<(), ExecutionError> {
        let range = self.range(addr, data.len())?;
        self.bytes[range].copy_from_slice(data);
        Ok(())
    }

    /// Zeroes every byte.
    pub fn clear(&mut self) {
        self.bytes.fill(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_little_endian_round_trip() {
        let mut mem = Memory::new(64);
        mem.write(8, MemWidth::Word, 0xDEAD_BEEF).unwrap();
        assert_eq!(mem.read(8, MemWidth::Byte).unwrap(), 0xEF);
        assert_eq!(mem.read(10, MemWidth::Half).unwrap(), 0xDEAD);
    }

    #[test]
    fn test_out_of_bounds() {
        let mut mem = Memory::new(16);
        assert_eq!(
            mem.read(14, MemWidth::Word),
            Err(ExecutionError::MemoryOutOfBounds {
                address: 14,
                size: 4
            })
        );
        assert!(mem.write(u64::MAX, MemWidth::Byte, 1).is_err());
        assert!(mem.read(15, MemWidth::Byte).is_ok());
    }
}
