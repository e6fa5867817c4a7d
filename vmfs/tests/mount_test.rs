// SPDX-License-Identifier: MIT
//! Mount lifecycle against an in-memory volume with counting collaborators.

use std::cell::RefCell;
use std::rc::Rc;

use vmfs::prelude::*;

const VOL_SIZE: usize = FSINFO_BASE as usize + 0x10000;

type EventLog = Rc<RefCell<Vec<String>>>;

fn sample_raw() -> FsInfoRaw {
    let mut label = [0u8; FSINFO_LABEL_SIZE];
    label[..10].copy_from_slice(b"datastore1");

    FsInfoRaw {
        magic: FSINFO_MAGIC,
        vol_version: 3,
        version: FSINFO_SUPPORTED_VERSION,
        uuid: [0x11; 16],
        reserved0: [0; 4],
        label,
        dev_block_size: 512,
        block_size: 0x1000000,
        ctime: 1_242_000_000,
        reserved1: [0; 4],
        lvm_uuid: [0x22; 16],
        reserved2: [0; 16],
        fdc_header_size: 0x800,
        fdc_bitmap_count: 64,
        subblock_size: 0x10000,
    }
}

fn format_volume(buf: &mut [u8], raw: &FsInfoRaw) {
    let mut io = MemVolIO::new(buf);
    io.write_struct(FSINFO_BASE, raw).unwrap();
}

fn sample_usage(kind: BitmapKind) -> BitmapUsage {
    let total: u32 = match kind {
        BitmapKind::Fbb => 4096,
        BitmapKind::Fdc => 1280,
        BitmapKind::Pbc => 256,
        BitmapKind::Sbc => 3968,
    };
    BitmapUsage {
        total,
        free: total - 96,
        entries: vec![
            BitmapEntryUsage {
                id: 0,
                total: total / 2,
                free: total / 2 - 96,
            },
            BitmapEntryUsage {
                id: 1,
                total: total / 2,
                free: total / 2,
            },
        ],
    }
}

struct MockBitmap {
    kind: BitmapKind,
    log: EventLog,
    fail_usage: bool,
}

impl Bitmap for MockBitmap {
    fn kind(&self) -> BitmapKind {
        self.kind
    }

    fn usage(&mut self, _io: &mut dyn VolIO) -> FsBitmapResult<BitmapUsage> {
        if self.fail_usage {
            return Err(FsBitmapError::Other("mock usage failure"));
        }
        Ok(sample_usage(self.kind))
    }
}

impl Drop for MockBitmap {
    fn drop(&mut self) {
        self.log.borrow_mut().push(format!("close {}", self.kind));
    }
}

struct MockOpener {
    log: EventLog,
    fail_on: Option<BitmapKind>,
    fail_usage_on: Option<BitmapKind>,
    seen: Vec<(BitmapKind, BitmapOpenParams)>,
}

impl MockOpener {
    fn new(log: &EventLog) -> Self {
        Self {
            log: log.clone(),
            fail_on: None,
            fail_usage_on: None,
            seen: Vec::new(),
        }
    }
}

impl BitmapOpener for MockOpener {
    fn open(
        &mut self,
        _io: &mut dyn VolIO,
        kind: BitmapKind,
        params: &BitmapOpenParams,
    ) -> FsBitmapResult<Box<dyn Bitmap>> {
        self.seen.push((kind, *params));
        if self.fail_on == Some(kind) {
            return Err(FsBitmapError::Invalid("mock open failure"));
        }
        self.log.borrow_mut().push(format!("open {kind}"));
        Ok(Box::new(MockBitmap {
            kind,
            log: self.log.clone(),
            fail_usage: self.fail_usage_on == Some(kind),
        }))
    }
}

struct MockRoot {
    block: u32,
    log: EventLog,
}

impl RootDir for MockRoot {
    fn descriptor(&self) -> u32 {
        self.block
    }
}

impl Drop for MockRoot {
    fn drop(&mut self) {
        self.log.borrow_mut().push("close ROOT".into());
    }
}

struct MockResolver {
    log: EventLog,
    fail: bool,
}

impl MockResolver {
    fn new(log: &EventLog) -> Self {
        Self {
            log: log.clone(),
            fail: false,
        }
    }
}

impl RootResolver for MockResolver {
    fn resolve_root(
        &mut self,
        _io: &mut dyn VolIO,
        _meta: &VmfsMeta,
    ) -> FsResolverResult<Box<dyn RootDir>> {
        if self.fail {
            return Err(FsResolverError::NotFound);
        }
        self.log.borrow_mut().push("open ROOT".into());
        Ok(Box::new(MockRoot {
            block: 4,
            log: self.log.clone(),
        }))
    }
}

#[test]
fn test_open_succeeds_and_serves_io() {
    let mut buf = vec![0u8; VOL_SIZE];
    format_volume(&mut buf, &sample_raw());

    let log: EventLog = EventLog::default();
    let mut opener = MockOpener::new(&log);
    let mut resolver = MockResolver::new(&log);

    let mut io = MemVolIO::new(&mut buf);
    let mut fs = VmfsFs::new(&mut io);
    assert_eq!(fs.state(), FsState::Created);

    fs.open(&mut opener, &mut resolver).unwrap();
    assert_eq!(fs.state(), FsState::Open);

    let info = fs.info().unwrap();
    assert_eq!(info.label(), b"datastore1");
    assert_eq!(info.magic(), 0x2fabf15e);
    assert_eq!(fs.block_size(), Some(0x1000000));
    assert_eq!(fs.root().unwrap().descriptor(), 4);

    // Bitmaps opened in fixed order, FDC with its header geometry
    let kinds: Vec<BitmapKind> = opener.seen.iter().map(|(k, _)| *k).collect();
    assert_eq!(kinds, BitmapKind::ALL);

    let (_, fdc) = opener.seen[1];
    assert_eq!(fdc.block_size, 0x1000000);
    assert_eq!(fdc.header_size, Some(0x800));
    assert_eq!(fdc.entry_count, Some(64));
    let (_, fbb) = opener.seen[0];
    assert_eq!(fbb.header_size, None);
    assert_eq!(fbb.entry_count, None);

    // Geometry scenario: byte offset past one 16 MiB block
    let meta = fs.meta().unwrap();
    assert_eq!(meta.split_offset(0x1800001).unwrap(), (1, 0x800001));
    assert_eq!(meta.subblock_size(), 0x10000);

    // Block IO round trip within block 0
    fs.write(0, 64, &[0xAB; 8]).unwrap();
    let mut out = [0u8; 8];
    fs.read(0, 64, &mut out).unwrap();
    assert_eq!(out, [0xAB; 8]);
}

#[test]
fn test_reopen_rejected() {
    let mut buf = vec![0u8; VOL_SIZE];
    format_volume(&mut buf, &sample_raw());

    let log: EventLog = EventLog::default();
    let mut opener = MockOpener::new(&log);
    let mut resolver = MockResolver::new(&log);

    let mut io = MemVolIO::new(&mut buf);
    let mut fs = VmfsFs::new(&mut io);
    fs.open(&mut opener, &mut resolver).unwrap();

    assert_eq!(
        fs.open(&mut opener, &mut resolver),
        Err(FsError::InvalidState)
    );
}

#[test]
fn test_open_rejects_bad_magic() {
    let mut raw = sample_raw();
    raw.magic = 0x12345678;

    let mut buf = vec![0u8; VOL_SIZE];
    format_volume(&mut buf, &raw);

    let log: EventLog = EventLog::default();
    let mut opener = MockOpener::new(&log);
    let mut resolver = MockResolver::new(&log);

    let mut io = MemVolIO::new(&mut buf);
    let mut fs = VmfsFs::new(&mut io);

    assert_eq!(
        fs.open(&mut opener, &mut resolver),
        Err(FsError::Decode(FsDecodeError::BadMagic(0x12345678)))
    );
    assert_eq!(fs.state(), FsState::Created);
    assert!(opener.seen.is_empty());
}

#[test]
fn test_open_rejects_bad_geometry() {
    // 0x18000 does not divide the 16 MiB block size
    let mut raw = sample_raw();
    raw.subblock_size = 0x18000;

    let mut buf = vec![0u8; VOL_SIZE];
    format_volume(&mut buf, &raw);

    let log: EventLog = EventLog::default();
    let mut opener = MockOpener::new(&log);
    let mut resolver = MockResolver::new(&log);

    let mut io = MemVolIO::new(&mut buf);
    let mut fs = VmfsFs::new(&mut io);

    assert!(matches!(
        fs.open(&mut opener, &mut resolver),
        Err(FsError::Geometry(FsGeometryError::InvalidGeometry(_)))
    ));
    assert!(opener.seen.is_empty());
}

#[test]
fn test_bitmap_open_failure_unwinds() {
    let mut buf = vec![0u8; VOL_SIZE];
    format_volume(&mut buf, &sample_raw());

    let log: EventLog = EventLog::default();
    let mut opener = MockOpener::new(&log);
    opener.fail_on = Some(BitmapKind::Pbc);
    let mut resolver = MockResolver::new(&log);

    let mut io = MemVolIO::new(&mut buf);
    let mut fs = VmfsFs::new(&mut io);

    assert!(matches!(
        fs.open(&mut opener, &mut resolver),
        Err(FsError::BitmapOpen(BitmapKind::Pbc, _))
    ));

    // Earlier bitmaps released in reverse order, nothing left open
    assert_eq!(
        *log.borrow(),
        ["open FBB", "open FDC", "close FDC", "close FBB"]
    );
}

#[test]
fn test_root_failure_unwinds_bitmaps() {
    let mut buf = vec![0u8; VOL_SIZE];
    format_volume(&mut buf, &sample_raw());

    let log: EventLog = EventLog::default();
    let mut opener = MockOpener::new(&log);
    let mut resolver = MockResolver::new(&log);
    resolver.fail = true;

    let mut io = MemVolIO::new(&mut buf);
    let mut fs = VmfsFs::new(&mut io);

    assert_eq!(
        fs.open(&mut opener, &mut resolver),
        Err(FsError::RootDir(FsResolverError::NotFound))
    );
    assert_eq!(
        *log.borrow(),
        [
            "open FBB", "open FDC", "open PBC", "open SBC", "close SBC", "close PBC",
            "close FDC", "close FBB"
        ]
    );
}

#[test]
fn test_read_span_out_of_bounds() {
    let mut buf = vec![0u8; VOL_SIZE];
    format_volume(&mut buf, &sample_raw());

    let log: EventLog = EventLog::default();
    let mut opener = MockOpener::new(&log);
    let mut resolver = MockResolver::new(&log);

    let mut io = MemVolIO::new(&mut buf);
    let mut fs = VmfsFs::new(&mut io);
    fs.open(&mut opener, &mut resolver).unwrap();

    let block_size = fs.block_size().unwrap();
    let mut out = [0u8; 20];
    assert_eq!(
        fs.read(5, block_size - 10, &mut out),
        Err(FsError::Geometry(FsGeometryError::OutOfBlockBounds))
    );
}

#[test]
fn test_write_on_read_only_volume_never_reaches_device() {
    let mut buf = vec![0u8; VOL_SIZE];
    format_volume(&mut buf, &sample_raw());

    let log: EventLog = EventLog::default();
    let mut opener = MockOpener::new(&log);
    let mut resolver = MockResolver::new(&log);

    let mut mem = MemVolIO::new(&mut buf).read_only();
    let mut counter = IoCounter::new(&mut mem);
    {
        let mut fs = VmfsFs::new(&mut counter);
        fs.open(&mut opener, &mut resolver).unwrap();

        assert_eq!(fs.write(0, 64, &[0xAB; 8]), Err(FsError::ReadOnly));

        // Reads still work on a read-only mount
        let mut out = [0u8; 8];
        fs.read(0, 64, &mut out).unwrap();
    }
    assert_eq!(counter.stats.writes, 0);
}

#[test]
fn test_close_is_idempotent() {
    let mut buf = vec![0u8; VOL_SIZE];
    format_volume(&mut buf, &sample_raw());

    let log: EventLog = EventLog::default();
    let mut opener = MockOpener::new(&log);
    let mut resolver = MockResolver::new(&log);

    let mut io = MemVolIO::new(&mut buf);
    let mut fs = VmfsFs::new(&mut io);
    fs.open(&mut opener, &mut resolver).unwrap();

    fs.close();
    assert_eq!(fs.state(), FsState::Closed);
    assert!(fs.root().is_none());

    // Root released first, then bitmaps in reverse acquisition order
    assert_eq!(
        *log.borrow(),
        [
            "open FBB", "open FDC", "open PBC", "open SBC", "open ROOT", "close ROOT",
            "close SBC", "close PBC", "close FDC", "close FBB"
        ]
    );

    let events_after_close = log.borrow().len();
    fs.close(); // no-op, not an error
    assert_eq!(fs.state(), FsState::Closed);
    assert_eq!(log.borrow().len(), events_after_close);

    let mut out = [0u8; 4];
    assert_eq!(fs.read(0, 0, &mut out), Err(FsError::InvalidState));
    assert_eq!(
        fs.open(&mut opener, &mut resolver),
        Err(FsError::InvalidState)
    );
}

#[test]
fn test_dump_bitmaps_tolerates_partial_failure() {
    let mut buf = vec![0u8; VOL_SIZE];
    format_volume(&mut buf, &sample_raw());

    let log: EventLog = EventLog::default();
    let mut opener = MockOpener::new(&log);
    opener.fail_usage_on = Some(BitmapKind::Fdc);
    let mut resolver = MockResolver::new(&log);

    let mut io = MemVolIO::new(&mut buf);
    let mut fs = VmfsFs::new(&mut io);
    fs.open(&mut opener, &mut resolver).unwrap();

    let rep = fs.dump_bitmaps().unwrap();

    // All four visited in order despite the FDC failure
    let kinds: Vec<BitmapKind> = rep.dumps.iter().map(|d| d.kind).collect();
    assert_eq!(kinds, BitmapKind::ALL);

    assert_eq!(rep.usage(BitmapKind::Fbb).unwrap().total, 4096);
    assert_eq!(rep.usage(BitmapKind::Sbc).unwrap().used(), 96);
    assert_eq!(
        rep.bitmap_error(BitmapKind::Fdc),
        Some(FsBitmapError::Other("mock usage failure"))
    );
    assert!(rep.has_error());

    let shown = format!("{rep}");
    assert!(shown.contains("INFO: FBB"));
    assert!(shown.contains("ERR : FDC"));
}

#[test]
fn test_dump_verbosity_and_selection() {
    let mut buf = vec![0u8; VOL_SIZE];
    format_volume(&mut buf, &sample_raw());

    let log: EventLog = EventLog::default();
    let mut opener = MockOpener::new(&log);
    let mut resolver = MockResolver::new(&log);

    let mut io = MemVolIO::new(&mut buf);
    let mut fs = VmfsFs::with_options(
        &mut io,
        FsOptions {
            verbosity: Severity::Info,
        },
    );
    fs.open(&mut opener, &mut resolver).unwrap();

    let rep = fs.dump_bitmaps().unwrap();
    // Verbose dump: one summary + two entry findings per bitmap
    assert_eq!(rep.count(Severity::Info), 12);
    assert!(format!("{rep}").contains("entry 0:"));

    let rep = fs
        .dump_bitmaps_with(DumpSelect::FBB | DumpSelect::SBC)
        .unwrap();
    let kinds: Vec<BitmapKind> = rep.dumps.iter().map(|d| d.kind).collect();
    assert_eq!(kinds, [BitmapKind::Fbb, BitmapKind::Sbc]);
}
