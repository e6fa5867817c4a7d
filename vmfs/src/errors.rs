// SPDX-License-Identifier: MIT

use core::fmt;

use crate::bitmap::BitmapKind;

pub use vmfsio::errors::*;

/// Superblock decode failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsDecodeError {
    IO(VolIOError),
    /// Magic field mismatch; carries the value found on disk.
    BadMagic(u32),
    /// Format revision outside the supported set; carries `(vol_version, version)`.
    UnsupportedVersion(u32, u8),
    Invalid(&'static str),
    Other(&'static str),
}

impl FsDecodeError {
    pub fn msg(&self) -> &'static str {
        match self {
            FsDecodeError::IO(_) => "IO error",
            FsDecodeError::BadMagic(_) => "Bad magic, not a VMFS volume",
            FsDecodeError::UnsupportedVersion(..) => "Unsupported VMFS version",
            FsDecodeError::Invalid(msg) => msg,
            FsDecodeError::Other(msg) => msg,
        }
    }

    pub fn source(&self) -> Option<FsError> {
        match self {
            FsDecodeError::IO(e) => Some(FsError::IO(*e)),
            _ => None,
        }
    }
}

impl fmt::Display for FsDecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.msg())?;
        match self {
            FsDecodeError::BadMagic(found) => write!(f, " (found 0x{found:08x})")?,
            FsDecodeError::UnsupportedVersion(vol, ver) => {
                write!(f, " (vol_version={vol}, version={ver})")?
            }
            _ => {}
        }
        let mut current = self.source();
        while let Some(src) = current {
            write!(f, "\n  caused by: {}", src.msg())?;
            current = src.source();
        }
        Ok(())
    }
}

/// Block/sub-block arithmetic failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsGeometryError {
    InvalidGeometry(&'static str),
    /// A single operation would straddle a block boundary.
    OutOfBlockBounds,
    /// Block arithmetic exceeded the addressable range.
    Overflow,
    Other(&'static str),
}

impl FsGeometryError {
    pub fn msg(&self) -> &'static str {
        match self {
            FsGeometryError::InvalidGeometry(msg) => msg,
            FsGeometryError::OutOfBlockBounds => "Span exceeds block bounds",
            FsGeometryError::Overflow => "Block address overflow",
            FsGeometryError::Other(msg) => msg,
        }
    }
}

impl fmt::Display for FsGeometryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.msg())?;
        Ok(())
    }
}

/// Failures reported by the resource bitmap collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsBitmapError {
    IO(VolIOError),
    Invalid(&'static str),
    Other(&'static str),
}

impl FsBitmapError {
    pub fn msg(&self) -> &'static str {
        match self {
            FsBitmapError::IO(_) => "IO error",
            FsBitmapError::Invalid(msg) => msg,
            FsBitmapError::Other(msg) => msg,
        }
    }

    pub fn source(&self) -> Option<FsError> {
        match self {
            FsBitmapError::IO(e) => Some(FsError::IO(*e)),
            _ => None,
        }
    }
}

impl fmt::Display for FsBitmapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.msg())?;
        let mut current = self.source();
        while let Some(src) = current {
            write!(f, "\n  caused by: {}", src.msg())?;
            current = src.source();
        }
        Ok(())
    }
}

/// Failures reported by the directory collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsResolverError {
    IO(VolIOError),
    NotFound,
    Invalid(&'static str),
    Other(&'static str),
}

impl FsResolverError {
    pub fn msg(&self) -> &'static str {
        match self {
            FsResolverError::IO(_) => "IO error",
            FsResolverError::NotFound => "Root directory not found",
            FsResolverError::Invalid(msg) => msg,
            FsResolverError::Other(msg) => msg,
        }
    }

    pub fn source(&self) -> Option<FsError> {
        match self {
            FsResolverError::IO(e) => Some(FsError::IO(*e)),
            _ => None,
        }
    }
}

impl fmt::Display for FsResolverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.msg())?;
        let mut current = self.source();
        while let Some(src) = current {
            write!(f, "\n  caused by: {}", src.msg())?;
            current = src.source();
        }
        Ok(())
    }
}

/// Top-level error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsError {
    IO(VolIOError),
    Decode(FsDecodeError),
    Geometry(FsGeometryError),
    /// One of the system bitmaps failed to open during mount.
    BitmapOpen(BitmapKind, FsBitmapError),
    Bitmap(FsBitmapError),
    /// The root directory could not be resolved during mount.
    RootDir(FsResolverError),
    /// Operation not valid in the handle's current lifecycle state.
    InvalidState,
    /// Write attempted against a read-only volume.
    ReadOnly,
    Other(&'static str),
}

impl FsError {
    pub fn msg(&self) -> &'static str {
        match self {
            FsError::IO(e) => e.msg(),
            FsError::Decode(e) => e.msg(),
            FsError::Geometry(e) => e.msg(),
            FsError::BitmapOpen(..) => "Bitmap open failed",
            FsError::Bitmap(e) => e.msg(),
            FsError::RootDir(e) => e.msg(),
            FsError::InvalidState => "Invalid filesystem state",
            FsError::ReadOnly => "Volume is read-only",
            FsError::Other(msg) => msg,
        }
    }

    pub fn source(&self) -> Option<FsError> {
        match self {
            FsError::Decode(e) => e.source(),
            FsError::BitmapOpen(_, e) => Some(FsError::Bitmap(*e)),
            FsError::Bitmap(e) => e.source(),
            FsError::RootDir(e) => e.source(),
            _ => None,
        }
    }
}

impl fmt::Display for FsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.msg())?;
        if let FsError::BitmapOpen(kind, _) = self {
            write!(f, " ({kind})")?;
        }
        let mut current = self.source();
        while let Some(src) = current {
            write!(f, "\n  caused by: {}", src.msg())?;
            current = src.source();
        }
        Ok(())
    }
}

// === impl From ===

impl From<VolIOError> for FsDecodeError {
    fn from(e: VolIOError) -> Self {
        FsDecodeError::IO(e)
    }
}

impl From<VolIOError> for FsBitmapError {
    fn from(e: VolIOError) -> Self {
        FsBitmapError::IO(e)
    }
}

impl From<VolIOError> for FsResolverError {
    fn from(e: VolIOError) -> Self {
        FsResolverError::IO(e)
    }
}

// === impl From to FsError top-level ===

impl From<VolIOError> for FsError {
    fn from(e: VolIOError) -> Self {
        FsError::IO(e)
    }
}

impl From<FsDecodeError> for FsError {
    fn from(e: FsDecodeError) -> Self {
        FsError::Decode(e)
    }
}

impl From<FsGeometryError> for FsError {
    fn from(e: FsGeometryError) -> Self {
        FsError::Geometry(e)
    }
}

impl From<FsBitmapError> for FsError {
    fn from(e: FsBitmapError) -> Self {
        FsError::Bitmap(e)
    }
}

impl From<FsResolverError> for FsError {
    fn from(e: FsResolverError) -> Self {
        FsError::RootDir(e)
    }
}

impl From<&'static str> for FsDecodeError {
    fn from(msg: &'static str) -> Self {
        FsDecodeError::Other(msg)
    }
}

impl From<&'static str> for FsGeometryError {
    fn from(msg: &'static str) -> Self {
        FsGeometryError::Other(msg)
    }
}

impl From<&'static str> for FsBitmapError {
    fn from(msg: &'static str) -> Self {
        FsBitmapError::Other(msg)
    }
}

impl From<&'static str> for FsResolverError {
    fn from(msg: &'static str) -> Self {
        FsResolverError::Other(msg)
    }
}

impl From<&'static str> for FsError {
    fn from(msg: &'static str) -> Self {
        FsError::Other(msg)
    }
}

// === type Fs*Result ===

pub type FsResult<T = ()> = Result<T, FsError>;
pub type FsDecodeResult<T = ()> = Result<T, FsDecodeError>;
pub type FsGeometryResult<T = ()> = Result<T, FsGeometryError>;
pub type FsBitmapResult<T = ()> = Result<T, FsBitmapError>;
pub type FsResolverResult<T = ()> = Result<T, FsResolverError>;
