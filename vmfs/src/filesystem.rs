// SPDX-License-Identifier: MIT
//! Filesystem handle: mount lifecycle and block-granular IO.

use alloc::boxed::Box;
use alloc::format;
use alloc::vec::Vec;

use vmfsio::{VolIO, VolIOStructExt};

use crate::bitmap::{Bitmap, BitmapKind, BitmapOpenParams, BitmapOpener};
use crate::checker::{BitmapDump, BitmapReport, DumpSelect, Finding, Severity};
use crate::constant::FSINFO_BASE;
use crate::errors::{FsError, FsResult};
use crate::fsinfo::{FsInfo, FsInfoRaw};
use crate::meta::VmfsMeta;
use crate::resolver::{RootDir, RootResolver};
use crate::{bail, ensure};

/// Lifecycle state of a filesystem handle.
///
/// `Created → Open → Closed`, one way; a closed handle is never reopened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsState {
    Created,
    Open,
    Closed,
}

/// Creation-time options.
#[derive(Debug, Clone, Copy)]
pub struct FsOptions {
    /// Verbosity of dump reports. `Info` adds per-entry allocation detail.
    pub verbosity: Severity,
}

impl Default for FsOptions {
    fn default() -> Self {
        Self {
            verbosity: Severity::Warn,
        }
    }
}

/// A VMFS filesystem bound to a volume.
///
/// The volume is borrowed, never owned; its lifetime and concurrency
/// guarantees belong to the caller. The four system bitmaps and the root
/// directory handle are owned from `open` until `close`.
pub struct VmfsFs<'a> {
    io: &'a mut dyn VolIO,
    opts: FsOptions,
    state: FsState,
    info: Option<FsInfo>,
    meta: Option<VmfsMeta>,
    // Acquisition order: FBB, FDC, PBC, SBC. Released in reverse.
    bitmaps: Vec<Box<dyn Bitmap>>,
    root: Option<Box<dyn RootDir>>,
}

impl<'a> VmfsFs<'a> {
    /// Binds an empty handle to `io`. Performs no IO.
    pub fn new(io: &'a mut dyn VolIO) -> Self {
        Self::with_options(io, FsOptions::default())
    }

    pub fn with_options(io: &'a mut dyn VolIO, opts: FsOptions) -> Self {
        Self {
            io,
            opts,
            state: FsState::Created,
            info: None,
            meta: None,
            bitmaps: Vec::new(),
            root: None,
        }
    }

    #[inline]
    pub fn state(&self) -> FsState {
        self.state
    }

    #[inline]
    pub fn info(&self) -> Option<&FsInfo> {
        self.info.as_ref()
    }

    #[inline]
    pub fn meta(&self) -> Option<VmfsMeta> {
        self.meta
    }

    #[inline]
    pub fn block_size(&self) -> Option<u64> {
        self.meta.map(|m| m.block_size())
    }

    #[inline]
    pub fn root(&self) -> Option<&dyn RootDir> {
        self.root.as_deref()
    }

    /// Mounts the filesystem.
    ///
    /// Decodes and validates the superblock, derives the geometry, opens
    /// the four system bitmaps and resolves the root directory. Any
    /// failure unwinds every resource acquired so far before returning;
    /// a partially mounted filesystem is never exposed.
    pub fn open(
        &mut self,
        bitmaps: &mut dyn BitmapOpener,
        resolver: &mut dyn RootResolver,
    ) -> FsResult<()> {
        ensure!(self.state == FsState::Created, FsError::InvalidState);

        let raw: FsInfoRaw = self.io.read_struct(FSINFO_BASE)?;
        let info = FsInfo::decode(&raw)?;
        let meta = VmfsMeta::from_info(&info)?;

        for kind in BitmapKind::ALL {
            let params = match kind {
                BitmapKind::Fdc => BitmapOpenParams::with_header(
                    meta.block_size(),
                    meta.fdc_header_size(),
                    meta.fdc_bitmap_count(),
                ),
                _ => BitmapOpenParams::new(meta.block_size()),
            };
            match bitmaps.open(&mut *self.io, kind, &params) {
                Ok(bmp) => self.bitmaps.push(bmp),
                Err(e) => {
                    self.release();
                    bail!(FsError::BitmapOpen(kind, e));
                }
            }
        }

        match resolver.resolve_root(&mut *self.io, &meta) {
            Ok(root) => self.root = Some(root),
            Err(e) => {
                self.release();
                bail!(FsError::RootDir(e));
            }
        }

        self.info = Some(info);
        self.meta = Some(meta);
        self.state = FsState::Open;
        Ok(())
    }

    /// Reads `buf.len()` bytes from `block` at `offset` within the block.
    ///
    /// The span must stay inside the block; the buffer is filled entirely
    /// or an error is returned.
    pub fn read(&mut self, block: u32, offset: u64, buf: &mut [u8]) -> FsResult<()> {
        let meta = self.open_meta()?;
        meta.check_span(offset, buf.len())?;
        let pos = meta.block_offset(block)? + offset;
        self.io.read_at(pos, buf)?;
        Ok(())
    }

    /// Writes `data` to `block` at `offset` within the block.
    ///
    /// Refuses read-only volumes before touching the write primitive.
    pub fn write(&mut self, block: u32, offset: u64, data: &[u8]) -> FsResult<()> {
        let meta = self.open_meta()?;
        ensure!(!self.io.is_read_only(), FsError::ReadOnly);
        meta.check_span(offset, data.len())?;
        let pos = meta.block_offset(block)? + offset;
        self.io.write_at(pos, data)?;
        Ok(())
    }

    /// Unmounts the filesystem, releasing the bitmaps and the root
    /// directory in reverse acquisition order. Idempotent.
    pub fn close(&mut self) {
        if self.state == FsState::Closed {
            return;
        }
        self.release();
        self.state = FsState::Closed;
    }

    /// Dumps the usage of all four system bitmaps.
    pub fn dump_bitmaps(&mut self) -> FsResult<BitmapReport> {
        self.dump_bitmaps_with(DumpSelect::ALL)
    }

    /// Dumps the usage of the selected system bitmaps, in fixed FBB, FDC,
    /// PBC, SBC order.
    ///
    /// A failing bitmap is recorded as an error entry and the dump moves
    /// on to the next one; bitmap state is never mutated.
    pub fn dump_bitmaps_with(&mut self, select: DumpSelect) -> FsResult<BitmapReport> {
        ensure!(self.state == FsState::Open, FsError::InvalidState);

        let mut rep = BitmapReport::default();
        for bmp in self.bitmaps.iter_mut() {
            let kind = bmp.kind();
            if !select.contains(kind.into()) {
                continue;
            }
            match bmp.usage(&mut *self.io) {
                Ok(usage) => {
                    rep.push(Finding::info(
                        kind.as_str(),
                        format!(
                            "total={} free={} used={}",
                            usage.total,
                            usage.free,
                            usage.used()
                        ),
                    ));
                    if self.opts.verbosity == Severity::Info {
                        for e in &usage.entries {
                            rep.push(Finding::info(
                                kind.as_str(),
                                format!("entry {}: {}/{} used", e.id, e.total - e.free, e.total),
                            ));
                        }
                    }
                    rep.record(BitmapDump {
                        kind,
                        result: Ok(usage),
                    });
                }
                Err(e) => {
                    rep.push(Finding::err(kind.as_str(), e.msg()));
                    rep.record(BitmapDump {
                        kind,
                        result: Err(e),
                    });
                }
            }
        }
        Ok(rep)
    }

    fn open_meta(&self) -> FsResult<VmfsMeta> {
        match (self.state, self.meta) {
            (FsState::Open, Some(meta)) => Ok(meta),
            _ => Err(FsError::InvalidState),
        }
    }

    // Reverse acquisition order: root first, then SBC back to FBB.
    fn release(&mut self) {
        self.root = None;
        while self.bitmaps.pop().is_some() {}
    }
}
