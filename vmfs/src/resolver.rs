// SPDX-License-Identifier: MIT
//! Narrow contract over the directory collaborator.
//!
//! Directory-tree and file-descriptor parsing live outside this crate;
//! mount only needs the root directory resolved and held as an opaque
//! handle for the lifetime of the filesystem.

#[cfg(feature = "alloc")]
use alloc::boxed::Box;

#[cfg(feature = "alloc")]
use crate::errors::FsResolverResult;
#[cfg(feature = "alloc")]
use crate::meta::VmfsMeta;
#[cfg(feature = "alloc")]
use vmfsio::VolIO;

/// Opaque handle to the resolved root directory.
#[cfg(feature = "alloc")]
pub trait RootDir {
    /// Block address of the root directory's file descriptor.
    fn descriptor(&self) -> u32;
}

/// Resolves the root directory of a mounted volume.
#[cfg(feature = "alloc")]
pub trait RootResolver {
    fn resolve_root(
        &mut self,
        io: &mut dyn VolIO,
        meta: &VmfsMeta,
    ) -> FsResolverResult<Box<dyn RootDir>>;
}
