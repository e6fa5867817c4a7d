// SPDX-License-Identifier: MIT

#[cfg(feature = "std")]
use ::std::io::{Error, ErrorKind, Read, Seek, SeekFrom, Write};

#[cfg(feature = "std")]
use crate::{VolIO, VolIOResult, errors::VolIOError};

/// `VolIO` backend over any `Read + Write + Seek` (image files, raw devices).
#[cfg(feature = "std")]
#[derive(Debug)]
pub struct StdVolIO<'a, T: Read + Write + Seek> {
    io: &'a mut T,
    base_offset: u64,
    read_only: bool,
}

#[cfg(feature = "std")]
impl<'a, T: Read + Write + Seek> StdVolIO<'a, T> {
    #[inline]
    pub fn new(io: &'a mut T) -> Self {
        Self {
            io,
            base_offset: 0,
            read_only: false,
        }
    }

    #[inline]
    pub fn new_with_offset(io: &'a mut T, base_offset: u64) -> Self {
        Self {
            io,
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
}

#[cfg(feature = "std")]
impl<'a, T: Read + Write + Seek> VolIO for StdVolIO<'a, T> {
    fn write_at(&mut self, offset: u64, data: &[u8]) -> VolIOResult {
        if self.read_only {
            return Err(VolIOError::ReadOnly);
        }
        let abs_offset = self.base_offset + offset;
        self.io.seek(SeekFrom::Start(abs_offset))?;
        self.io.write_all(data)?;
        Ok(())
    }

    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> VolIOResult {
        let abs_offset = self.base_offset + offset;
        self.io.seek(SeekFrom::Start(abs_offset))?;
        self.io.read_exact(buf)?;
        Ok(())
    }

    fn flush(&mut self) -> VolIOResult {
        self.io.flush()?;
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

#[cfg(feature = "std")]
impl From<Error> for VolIOError {
    #[cold]
    #[inline(never)]
    fn from(e: Error) -> Self {
        if e.kind() == ErrorKind::UnexpectedEof {
            return VolIOError::ShortRead;
        }
        // Leak the string to produce a 'static str. Acceptable for error mapping.
        let leaked_str: &'static str = Box::leak(e.to_string().into_boxed_str());
        VolIOError::Other(leaked_str)
    }
}
