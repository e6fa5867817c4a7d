// SPDX-License-Identifier: MIT

use crate::{VolIO, VolIOResult, errors::VolIOError};

/// In-memory implementation of `VolIO`.
///
/// Useful for tests, RAM-backed volumes, virtual disks.
#[derive(Debug)]
pub struct MemVolIO<'a> {
    buffer: &'a mut [u8],
    base_offset: u64,
    read_only: bool,
}

impl<'a> MemVolIO<'a> {
    #[inline]
    pub fn new(buffer: &'a mut [u8]) -> Self {
        Self {
            buffer,
            base_offset: 0,
            read_only: false,
        }
    }

    #[inline]
    pub fn new_with_offset(buffer: &'a mut [u8], base_offset: u64) -> Self {
        Self {
            buffer,
            base_offset,
            read_only: false,
        }
    }

    /// Marks the volume read-only; writes fail with `ReadOnly` after this.
    #[inline]
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    #[inline]
    fn check_bounds(&self, abs_off: u64, len: usize) -> VolIOResult {
        let end = abs_off
            .checked_add(len as u64)
            .ok_or(VolIOError::OutOfBounds)?;
        if end > self.buffer.len() as u64 {
            return Err(VolIOError::OutOfBounds);
        }
        Ok(())
    }
}

impl<'a> VolIO for MemVolIO<'a> {
    #[inline(always)]
    fn write_at(&mut self, offset: u64, data: &[u8]) -> VolIOResult {
        if self.read_only {
            return Err(VolIOError::ReadOnly);
        }
        let abs_offset = self.base_offset + offset;
        self.check_bounds(abs_offset, data.len())?;
        let dst = &mut self.buffer[abs_offset as usize..abs_offset as usize + data.len()];
        dst.copy_from_slice(data);
        Ok(())
    }

    #[inline(always)]
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> VolIOResult {
        let abs_offset = self.base_offset + offset;
        self.check_bounds(abs_offset, buf.len())?;
        let src = &self.buffer[abs_offset as usize..abs_offset as usize + buf.len()];
        buf.copy_from_slice(src);
        Ok(())
    }

    #[inline]
    fn flush(&mut self) -> VolIOResult {
        Ok(())
    }

    #[inline]
    fn is_read_only(&self) -> bool {
        self.read_only
    }

    #[inline]
    fn set_offset(&mut self, base_offset: u64) -> u64 {
        self.base_offset = base_offset;
        base_offset
    }

    #[inline]
    fn volume_offset(&self) -> u64 {
        self.base_offset
    }
}
