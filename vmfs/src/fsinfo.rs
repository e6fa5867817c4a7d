// SPDX-License-Identifier: MIT
//! VMFS superblock (FS information record) codec.

#[cfg(feature = "alloc")]
use alloc::vec::Vec;

use core::fmt;

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::constant::*;
#[cfg(feature = "alloc")]
use crate::ensure;
#[cfg(feature = "alloc")]
use crate::errors::{FsDecodeError, FsDecodeResult};

/// On-disk FS information record, located at [`FSINFO_BASE`].
///
/// Field order and sizes are fixed by the format; the record is packed
/// with no padding. All integers are little-endian on disk.
#[derive(IntoBytes, FromBytes, KnownLayout, Immutable, Copy, Clone, Debug)]
#[repr(C, packed)]
pub struct FsInfoRaw {
    pub magic: u32,
    pub vol_version: u32,
    pub version: u8,
    pub uuid: [u8; 16],
    pub reserved0: [u8; 4],
    pub label: [u8; FSINFO_LABEL_SIZE],
    pub dev_block_size: u32,
    pub block_size: u64,
    pub ctime: u32,
    pub reserved1: [u8; 4],
    pub lvm_uuid: [u8; 16],
    pub reserved2: [u8; 16],
    pub fdc_header_size: u32,
    pub fdc_bitmap_count: u32,
    pub subblock_size: u32,
}

// Ensure the record is exactly the on-disk size
const _: () = assert!(core::mem::size_of::<FsInfoRaw>() == FSINFO_RECORD_SIZE);

/// Decoded FS information.
///
/// Immutable once decoded; geometry derivations read it, never mutate it.
/// Reserved fields are carried verbatim so `encode` reproduces the record
/// byte-for-byte.
#[cfg(feature = "alloc")]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsInfo {
    magic: u32,
    vol_version: u32,
    version: u8,
    uuid: [u8; 16],
    label: Vec<u8>,
    dev_block_size: u32,
    block_size: u64,
    ctime: u32,
    lvm_uuid: [u8; 16],
    fdc_header_size: u32,
    fdc_bitmap_count: u32,
    subblock_size: u32,
    reserved0: [u8; 4],
    reserved1: [u8; 4],
    reserved2: [u8; 16],
}

#[cfg(feature = "alloc")]
impl FsInfo {
    /// Decodes and validates a raw FS information record.
    ///
    /// Rejects foreign magics and any format revision outside the
    /// supported set; unknown versions are never best-effort parsed.
    pub fn decode(raw: &FsInfoRaw) -> FsDecodeResult<Self> {
        let magic = raw.magic;
        ensure!(magic == FSINFO_MAGIC, FsDecodeError::BadMagic(magic));

        let vol_version = raw.vol_version;
        let version = raw.version;
        ensure!(
            is_supported_version(vol_version, version),
            FsDecodeError::UnsupportedVersion(vol_version, version)
        );

        // Owned, NUL-bounded copy; bytes are not trusted to be text.
        let label_len = raw
            .label
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(FSINFO_LABEL_SIZE);
        let label = raw.label[..label_len].to_vec();

        Ok(Self {
            magic,
            vol_version,
            version,
            uuid: raw.uuid,
            label,
            dev_block_size: raw.dev_block_size,
            block_size: raw.block_size,
            ctime: raw.ctime,
            lvm_uuid: raw.lvm_uuid,
            fdc_header_size: raw.fdc_header_size,
            fdc_bitmap_count: raw.fdc_bitmap_count,
            subblock_size: raw.subblock_size,
            reserved0: raw.reserved0,
            reserved1: raw.reserved1,
            reserved2: raw.reserved2,
        })
    }

    /// Byte-exact inverse of [`FsInfo::decode`] for canonical records.
    pub fn encode(&self) -> FsInfoRaw {
        let mut label = [0u8; FSINFO_LABEL_SIZE];
        label[..self.label.len()].copy_from_slice(&self.label);

        FsInfoRaw {
            magic: self.magic,
            vol_version: self.vol_version,
            version: self.version,
            uuid: self.uuid,
            reserved0: self.reserved0,
            label,
            dev_block_size: self.dev_block_size,
            block_size: self.block_size,
            ctime: self.ctime,
            reserved1: self.reserved1,
            lvm_uuid: self.lvm_uuid,
            reserved2: self.reserved2,
            fdc_header_size: self.fdc_header_size,
            fdc_bitmap_count: self.fdc_bitmap_count,
            subblock_size: self.subblock_size,
        }
    }

    #[inline]
    pub fn magic(&self) -> u32 {
        self.magic
    }

    #[inline]
    pub fn vol_version(&self) -> u32 {
        self.vol_version
    }

    #[inline]
    pub fn version(&self) -> u8 {
        self.version
    }

    #[inline]
    pub fn uuid(&self) -> &[u8; 16] {
        &self.uuid
    }

    /// Raw label bytes, bounded at the first on-disk NUL.
    #[inline]
    pub fn label(&self) -> &[u8] {
        &self.label
    }

    /// Label as text, with non-UTF8 bytes replaced for display.
    pub fn label_lossy(&self) -> alloc::borrow::Cow<'_, str> {
        alloc::string::String::from_utf8_lossy(&self.label)
    }

    #[inline]
    pub fn dev_block_size(&self) -> u32 {
        self.dev_block_size
    }

    #[inline]
    pub fn block_size(&self) -> u64 {
        self.block_size
    }

    /// Creation time, seconds since the epoch.
    #[inline]
    pub fn ctime(&self) -> u32 {
        self.ctime
    }

    #[inline]
    pub fn lvm_uuid(&self) -> &[u8; 16] {
        &self.lvm_uuid
    }

    #[inline]
    pub fn fdc_header_size(&self) -> u32 {
        self.fdc_header_size
    }

    #[inline]
    pub fn fdc_bitmap_count(&self) -> u32 {
        self.fdc_bitmap_count
    }

    #[inline]
    pub fn subblock_size(&self) -> u32 {
        self.subblock_size
    }
}

#[inline]
pub fn is_supported_version(vol_version: u32, version: u8) -> bool {
    (FSINFO_MIN_VOL_VERSION..=FSINFO_MAX_VOL_VERSION).contains(&vol_version)
        && version == FSINFO_SUPPORTED_VERSION
}

/// VMFS textual form of a 128-bit identifier
/// (`xxxxxxxx-xxxxxxxx-xxxx-xxxxxxxxxxxx`, mixed-endian like the on-disk
/// representation).
#[derive(Debug, Clone, Copy)]
pub struct UuidText(pub [u8; 16]);

impl fmt::Display for UuidText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let u = &self.0;
        let a = u32::from_le_bytes([u[0], u[1], u[2], u[3]]);
        let b = u32::from_le_bytes([u[4], u[5], u[6], u[7]]);
        let c = u16::from_le_bytes([u[8], u[9]]);
        write!(
            f,
            "{a:08x}-{b:08x}-{c:04x}-{:02x}{:02x}{:02x}{:02x}{:02x}{:02x}",
            u[10], u[11], u[12], u[13], u[14], u[15]
        )?;
        Ok(())
    }
}

#[cfg(feature = "std")]
impl fmt::Display for FsInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "VMFS version    : {}.{}", self.vol_version, self.version)?;
        writeln!(f, "Label           : {}", self.label_lossy())?;
        writeln!(f, "UUID            : {}", UuidText(self.uuid))?;
        match time::OffsetDateTime::from_unix_timestamp(self.ctime as i64) {
            Ok(t) => writeln!(f, "Creation date   : {t}")?,
            Err(_) => writeln!(f, "Creation date   : {} (raw)", self.ctime)?,
        }
        writeln!(f, "Block size      : {}", self.block_size)?;
        writeln!(f, "Sub-block size  : {}", self.subblock_size)?;
        writeln!(f, "LVM UUID        : {}", UuidText(self.lvm_uuid))?;
        Ok(())
    }
}

#[cfg(all(test, feature = "std"))]
mod tests {
    use super::*;
    use zerocopy::IntoBytes;

    fn sample_raw() -> FsInfoRaw {
        let mut label = [0u8; FSINFO_LABEL_SIZE];
        label[..10].copy_from_slice(b"datastore1");

        FsInfoRaw {
            magic: FSINFO_MAGIC,
            vol_version: 3,
            version: FSINFO_SUPPORTED_VERSION,
            uuid: [0x11; 16],
            reserved0: [0xA5; 4],
            label,
            dev_block_size: 512,
            block_size: 0x1000000,
            ctime: 1_242_000_000,
            reserved1: [0x5A; 4],
            lvm_uuid: [0x22; 16],
            reserved2: [0xC3; 16],
            fdc_header_size: 0x800,
            fdc_bitmap_count: 64,
            subblock_size: 0x10000,
        }
    }

    #[test]
    fn test_decode_encode_round_trip() {
        let raw = sample_raw();
        let info = FsInfo::decode(&raw).unwrap();

        assert_eq!(info.label(), b"datastore1");
        assert_eq!(info.block_size(), 0x1000000);
        assert_eq!(info.subblock_size(), 0x10000);
        assert_eq!(info.fdc_header_size(), 0x800);
        assert_eq!(info.fdc_bitmap_count(), 64);

        let encoded = info.encode();
        assert_eq!(raw.as_bytes(), encoded.as_bytes());

        let again = FsInfo::decode(&encoded).unwrap();
        assert_eq!(again, info);
    }

    #[test]
    fn test_reserved_bytes_preserved() {
        let raw = sample_raw();
        let encoded = FsInfo::decode(&raw).unwrap().encode();

        assert_eq!(encoded.reserved0, [0xA5; 4]);
        assert_eq!(encoded.reserved1, [0x5A; 4]);
        assert_eq!(encoded.reserved2, [0xC3; 16]);
    }

    #[test]
    fn test_bad_magic_rejected() {
        let mut raw = sample_raw();
        raw.magic = 0xEF53;

        assert_eq!(
            FsInfo::decode(&raw),
            Err(FsDecodeError::BadMagic(0xEF53))
        );
    }

    #[test]
    fn test_unsupported_version_rejected() {
        let mut raw = sample_raw();
        raw.version = 99;
        assert_eq!(
            FsInfo::decode(&raw),
            Err(FsDecodeError::UnsupportedVersion(3, 99))
        );

        let mut raw = sample_raw();
        raw.vol_version = 42;
        assert_eq!(
            FsInfo::decode(&raw),
            Err(FsDecodeError::UnsupportedVersion(42, FSINFO_SUPPORTED_VERSION))
        );
    }

    #[test]
    fn test_label_nul_bounded_and_binary_safe() {
        let mut raw = sample_raw();
        raw.label = [0u8; FSINFO_LABEL_SIZE];
        raw.label[0] = 0xFF;
        raw.label[1] = b'x';
        raw.label[2] = 0;
        raw.label[3] = b'y'; // past the terminator, must be ignored

        let info = FsInfo::decode(&raw).unwrap();
        assert_eq!(info.label(), &[0xFF, b'x']);
        assert_eq!(info.label_lossy(), "\u{FFFD}x");
    }

    #[test]
    fn test_uuid_text_form() {
        let mut uuid = [0u8; 16];
        uuid[..4].copy_from_slice(&0x4c261451u32.to_le_bytes());
        uuid[4..8].copy_from_slice(&0x8c1e3af1u32.to_le_bytes());
        uuid[8..10].copy_from_slice(&0x5d9au16.to_le_bytes());
        uuid[10..].copy_from_slice(&[0x00, 0x1b, 0x21, 0x7a, 0x7d, 0x20]);

        assert_eq!(
            format!("{}", UuidText(uuid)),
            "4c261451-8c1e3af1-5d9a-001b217a7d20"
        );
    }
}
