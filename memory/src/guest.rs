use std::ops::Range;

use byteorder::ByteOrder;

use crate::{GuestAddr, MemoryError};

/// Flat, byte-addressable memory owned by one VM instance.
///
/// Every accessor goes through [`GuestMemory::span`], which is the single
/// place where guest addresses are checked against the live extent. An
/// access starting at or past the end of memory is always `OutOfBounds`,
/// including zero-length ones.
///
/// Multi-byte accessors behave like sequential single-byte accesses at
/// `addr, addr + 1, ...`, but the whole range is validated first, so a
/// failing write leaves memory untouched. There is no alignment requirement.
#[derive(Debug, Clone)]
pub struct GuestMemory {
    storage: Box<[u8]>,
}

impl GuestMemory {
    /// Allocate `size` zeroed bytes.
    pub fn new(size: usize) -> Self {
        Self {
            storage: vec![0; size].into_boxed_slice(),
        }
    }

    pub fn len(&self) -> usize {
        self.storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    /// Read-only view of the whole memory image.
    pub fn as_slice(&self) -> &[u8] {
        &self.storage
    }

    /// Validate `len` bytes starting at `addr` and return the host range.
    fn span(&self, addr: GuestAddr, len: usize) -> Result<Range<usize>, MemoryError> {
        let size = self.storage.len();
        let fault = MemoryError::OutOfBounds { addr, len, size };

        let start = addr.to_index().ok_or(fault.clone())?;
        if start >= size {
            return Err(fault);
        }
        let end = start.checked_add(len).ok_or(fault.clone())?;
        if end > size {
            return Err(fault);
        }
        Ok(start..end)
    }

    // --- Single bytes ---

    pub fn read_byte(&self, addr: GuestAddr) -> Result<u8, MemoryError> {
        let range = self.span(addr, 1)?;
        Ok(self.storage[range.start])
    }

    pub fn write_byte(&mut self, addr: GuestAddr, value: u8) -> Result<(), MemoryError> {
        let range = self.span(addr, 1)?;
        self.storage[range.start] = value;
        Ok(())
    }

    // --- Byte runs ---

    pub fn read_bytes(&self, addr: GuestAddr, len: usize) -> Result<&[u8], MemoryError> {
        let range = self.span(addr, len)?;
        Ok(&self.storage[range])
    }

    pub fn write_bytes(&mut self, addr: GuestAddr, bytes: &[u8]) -> Result<(), MemoryError> {
        let range = self.span(addr, bytes.len())?;
        self.storage[range].copy_from_slice(bytes);
        Ok(())
    }

    /// Mutable view of `len` bytes at `addr`, for host code that fills a
    /// guest buffer in place (e.g. a `read` binding).
    pub fn bytes_mut(&mut self, addr: GuestAddr, len: usize) -> Result<&mut [u8], MemoryError> {
        let range = self.span(addr, len)?;
        Ok(&mut self.storage[range])
    }

    pub fn fill(&mut self, addr: GuestAddr, len: usize, value: u8) -> Result<(), MemoryError> {
        let range = self.span(addr, len)?;
        self.storage[range].fill(value);
        Ok(())
    }

    /// Bytes from `addr` up to (not including) the next NUL.
    ///
    /// Scanning stops at the end of memory: a string that runs off the end is
    /// `UnterminatedString`, never a read past the buffer.
    pub fn read_cstring(&self, addr: GuestAddr) -> Result<&[u8], MemoryError> {
        let start = self.span(addr, 1)?.start;
        let tail = &self.storage[start..];
        match tail.iter().position(|&b| b == 0) {
            Some(nul) => Ok(&tail[..nul]),
            None => Err(MemoryError::UnterminatedString { addr }),
        }
    }

    /// Copy `bytes` followed by a NUL terminator to `addr`.
    pub fn write_cstring(&mut self, addr: GuestAddr, bytes: &[u8]) -> Result<(), MemoryError> {
        let range = self.span(addr, bytes.len() + 1)?;
        let (body, nul) = self.storage[range].split_at_mut(bytes.len());
        body.copy_from_slice(bytes);
        nul[0] = 0;
        Ok(())
    }

    // --- Multi-byte integers ---

    pub fn read_u16<E: ByteOrder>(&self, addr: GuestAddr) -> Result<u16, MemoryError> {
        let range = self.span(addr, 2)?;
        Ok(E::read_u16(&self.storage[range]))
    }

    pub fn read_u32<E: ByteOrder>(&self, addr: GuestAddr) -> Result<u32, MemoryError> {
        let range = self.span(addr, 4)?;
        Ok(E::read_u32(&self.storage[range]))
    }

    pub fn read_u64<E: ByteOrder>(&self, addr: GuestAddr) -> Result<u64, MemoryError> {
        let range = self.span(addr, 8)?;
        Ok(E::read_u64(&self.storage[range]))
    }

    pub fn write_u16<E: ByteOrder>(
        &mut self,
        addr: GuestAddr,
        value: u16,
    ) -> Result<(), MemoryError> {
        let range = self.span(addr, 2)?;
        E::write_u16(&mut self.storage[range], value);
        Ok(())
    }

    pub fn write_u32<E: ByteOrder>(
        &mut self,
        addr: GuestAddr,
        value: u32,
    ) -> Result<(), MemoryError> {
        let range = self.span(addr, 4)?;
        E::write_u32(&mut self.storage[range], value);
        Ok(())
    }

    pub fn write_u64<E: ByteOrder>(
        &mut self,
        addr: GuestAddr,
        value: u64,
    ) -> Result<(), MemoryError> {
        let range = self.span(addr, 8)?;
        E::write_u64(&mut self.storage[range], value);
        Ok(())
    }
}
