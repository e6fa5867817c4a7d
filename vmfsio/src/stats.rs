// SPDX-License-Identifier: MIT

use crate::{VolIO, VolIOResult};

/// Simple counters, no_std friendly.
#[derive(Clone, Copy, Default, Debug)]
pub struct IoStats {
    pub reads: u64,
    pub read_bytes: u64,
    pub writes: u64,
    pub write_bytes: u64,
    pub flushes: u64,
}

impl IoStats {
    #[inline]
    pub fn reset(&mut self) {
        *self = IoStats::default();
    }
}

/// Transparent instrumentation wrapper.
///
/// Counts operations without altering behaviour; useful to verify which
/// primitives a code path actually reached.
pub struct IoCounter<'a, IO: VolIO + ?Sized> {
    inner: &'a mut IO,
    pub stats: IoStats,
}

impl<'a, IO: VolIO + ?Sized> IoCounter<'a, IO> {
    #[inline]
    pub fn new(inner: &'a mut IO) -> Self {
        Self {
            inner,
            stats: IoStats::default(),
        }
    }

    #[inline]
    pub fn snapshot(&self) -> IoStats {
        self.stats
    }

    #[inline]
    pub fn into_inner(self) -> &'a mut IO {
        self.inner
    }
}

impl<'a, IO: VolIO + ?Sized> VolIO for IoCounter<'a, IO> {
    #[inline]
    fn write_at(&mut self, offset: u64, data: &[u8]) -> VolIOResult {
        self.stats.writes += 1;
        self.stats.write_bytes += data.len() as u64;
        self.inner.write_at(offset, data)
    }

    #[inline]
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> VolIOResult {
        self.stats.reads += 1;
        self.stats.read_bytes += buf.len() as u64;
        self.inner.read_at(offset, buf)
    }

    #[inline]
    fn flush(&mut self) -> VolIOResult {
        self.stats.flushes += 1;
        self.inner.flush()
    }

    #[inline]
    fn is_read_only(&self) -> bool {
        self.inner.is_read_only()
    }

    #[inline]
    fn set_offset(&mut self, base_offset: u64) -> u64 {
        self.inner.set_offset(base_offset)
    }

    #[inline]
    fn volume_offset(&self) -> u64 {
        self.inner.volume_offset()
    }
}
