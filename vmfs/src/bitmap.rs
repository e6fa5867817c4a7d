// SPDX-License-Identifier: MIT
//! Narrow contract over the four system resource bitmaps.
//!
//! The on-disk bitmap allocator itself lives outside this crate; the
//! filesystem handle only needs to open the four system bitmaps, query
//! their usage for diagnostics, and release them on close.

#[cfg(feature = "alloc")]
use alloc::{boxed::Box, vec::Vec};

use core::fmt;

#[cfg(feature = "alloc")]
use crate::errors::FsBitmapResult;
#[cfg(feature = "alloc")]
use vmfsio::VolIO;

/// The four system resource bitmaps of a VMFS volume.
///
/// Order matters: it is the acquisition order during mount and the fixed
/// order of the diagnostic dump.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitmapKind {
    /// File blocks.
    Fbb,
    /// File descriptors.
    Fdc,
    /// Pointer blocks.
    Pbc,
    /// Sub-blocks.
    Sbc,
}

impl BitmapKind {
    pub const ALL: [BitmapKind; 4] = [
        BitmapKind::Fbb,
        BitmapKind::Fdc,
        BitmapKind::Pbc,
        BitmapKind::Sbc,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BitmapKind::Fbb => "FBB",
            BitmapKind::Fdc => "FDC",
            BitmapKind::Pbc => "PBC",
            BitmapKind::Sbc => "SBC",
        }
    }
}

impl fmt::Display for BitmapKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())?;
        Ok(())
    }
}

/// Geometry handed to the bitmap collaborator at open time.
///
/// `header_size` / `entry_count` are populated for the file-descriptor
/// bitmap only; the other three derive their layout from `block_size`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitmapOpenParams {
    pub block_size: u64,
    pub header_size: Option<u32>,
    pub entry_count: Option<u32>,
}

impl BitmapOpenParams {
    pub fn new(block_size: u64) -> Self {
        Self {
            block_size,
            header_size: None,
            entry_count: None,
        }
    }

    pub fn with_header(block_size: u64, header_size: u32, entry_count: u32) -> Self {
        Self {
            block_size,
            header_size: Some(header_size),
            entry_count: Some(entry_count),
        }
    }
}

/// Allocation detail for one bitmap entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitmapEntryUsage {
    pub id: u32,
    pub total: u32,
    pub free: u32,
}

/// Usage summary reported by a bitmap, as gathered by the diagnostic dump.
#[cfg(feature = "alloc")]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitmapUsage {
    pub total: u32,
    pub free: u32,
    pub entries: Vec<BitmapEntryUsage>,
}

#[cfg(feature = "alloc")]
impl BitmapUsage {
    #[inline]
    pub fn used(&self) -> u32 {
        self.total - self.free
    }
}

/// An opened system bitmap, owned by the filesystem handle.
///
/// Release is drop-based; implementations holding on-disk state must
/// clean up in `Drop`.
#[cfg(feature = "alloc")]
pub trait Bitmap {
    fn kind(&self) -> BitmapKind;

    /// Queries the usage summary. Must not mutate bitmap state.
    fn usage(&mut self, io: &mut dyn VolIO) -> FsBitmapResult<BitmapUsage>;
}

/// Opens system bitmaps against a volume.
#[cfg(feature = "alloc")]
pub trait BitmapOpener {
    fn open(
        &mut self,
        io: &mut dyn VolIO,
        kind: BitmapKind,
        params: &BitmapOpenParams,
    ) -> FsBitmapResult<Box<dyn Bitmap>>;
}
