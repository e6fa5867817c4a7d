// SPDX-License-Identifier: MIT
#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "alloc")]
extern crate alloc;

// Core modules
pub mod bitmap;
pub mod checker;
pub mod constant;
pub mod errors;
mod macros;
pub mod fsinfo;
pub mod meta;
pub mod resolver;

#[cfg(feature = "alloc")]
pub mod filesystem;

// Prelude re-exports (central entrypoint)
pub mod prelude {
    pub use super::bitmap::*;
    pub use super::checker::*;
    pub use super::constant::*;
    pub use super::errors::*;
    pub use super::fsinfo::*;
    pub use super::meta::*;
    pub use super::resolver::*;

    #[cfg(feature = "alloc")]
    pub use super::filesystem::*;

    pub use vmfsio::prelude::*;
}
