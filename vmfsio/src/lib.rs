// SPDX-License-Identifier: MIT
#![cfg_attr(not(feature = "std"), no_std)]

// Core modules
pub mod errors;
mod macros;
pub mod stats;

// Backend modules
#[cfg(feature = "mem")]
mod mem;

#[cfg(feature = "std")]
mod std;

// Prelude re-exports (central entrypoint)
pub mod prelude {
    pub use super::VolIO;
    pub use super::VolIOExt;
    pub use super::VolIOStructExt;
    pub use super::errors::*;
    pub use super::stats::*;

    #[cfg(feature = "mem")]
    pub use super::mem::MemVolIO;

    #[cfg(feature = "std")]
    pub use super::std::StdVolIO;
}

// Internal use
use errors::*;

// Constants

/// Maximum size of internal scratch buffer (typed struct reads).
/// 4 KiB = typical page size and common device sector size.
pub const VOL_BUF_SIZE: usize = 4096;

// Traits

/// Volume IO abstraction trait.
///
/// Presents a volume as a flat byte space addressed by absolute offsets.
/// Extent spanning across physical devices is the backend's concern;
/// callers above this trait never see extent boundaries.
/// Implementations may target RAM, image files, raw block devices, etc.
pub trait VolIO {
    /// Writes `data` at `offset` (absolute).
    fn write_at(&mut self, offset: u64, data: &[u8]) -> VolIOResult;

    /// Reads `buf.len()` bytes into `buf` from `offset` (absolute).
    ///
    /// Fills the whole buffer or fails; a partial read is never an Ok outcome.
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> VolIOResult;

    /// Flushes any buffered data (may be a no-op).
    fn flush(&mut self) -> VolIOResult;

    /// Whether the volume was opened read-only.
    fn is_read_only(&self) -> bool;

    /// Rebases the volume at `base_offset` within the backing store.
    fn set_offset(&mut self, base_offset: u64) -> u64;

    /// Current base offset of the volume within the backing store.
    fn volume_offset(&self) -> u64;
}

/// Extension helpers for VolIO.
///
/// Provides little-endian primitive read/write helpers (u16/u32/u64/u128),
/// the granularity every on-disk VMFS field uses.
pub trait VolIOExt: VolIO {
    // Implements read/write helpers for primitive types (u16, u32, u64, u128)
    volio_impl_primitive_rw!(u16, u32, u64, u128);
}

impl<T: VolIO + ?Sized> VolIOExt for T {}

/// Extension trait for reading and writing on-disk records using zerocopy.
///
/// Requires the record type to implement the zerocopy traits for safe
/// conversion; layout mismatches surface as errors, never as UB.
pub trait VolIOStructExt: VolIO {
    /// Reads a record of type `T` from the given offset.
    fn read_struct<T: zerocopy::FromBytes + zerocopy::KnownLayout + zerocopy::Immutable>(
        &mut self,
        offset: u64,
    ) -> VolIOResult<T> {
        let size = core::mem::size_of::<T>();
        assert!(size <= VOL_BUF_SIZE, "read_struct: type too large");
        let mut buf = [0u8; VOL_BUF_SIZE];
        self.read_at(offset, &mut buf[..size])?;
        T::read_from_bytes(&buf[..size]).map_err(|_| VolIOError::Other("read_struct failed"))
    }

    /// Writes a record of type `T` at the given offset.
    fn write_struct<T: zerocopy::IntoBytes + zerocopy::KnownLayout + zerocopy::Immutable>(
        &mut self,
        offset: u64,
        val: &T,
    ) -> VolIOResult {
        let bytes = val.as_bytes();
        self.write_at(offset, bytes)
    }
}

impl<T: VolIO + ?Sized> VolIOStructExt for T {}
