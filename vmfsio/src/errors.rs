// SPDX-License-Identifier: MIT

use core::fmt;

/// Result type for volume IO operations.
pub type VolIOResult<T = ()> = core::result::Result<T, VolIOError>;

/// Error type for volume IO operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolIOError {
    Other(&'static str),
    OutOfBounds,
    /// The backend delivered fewer bytes than requested.
    ShortRead,
    ReadOnly,
    Unsupported,
}

impl VolIOError {
    pub fn msg(&self) -> &'static str {
        match self {
            VolIOError::Other(msg) => msg,
            VolIOError::OutOfBounds => "Out of bounds",
            VolIOError::ShortRead => "Short read",
            VolIOError::ReadOnly => "Volume is read-only",
            VolIOError::Unsupported => "Unsupported operation",
        }
    }
}

impl From<&'static str> for VolIOError {
    #[inline]
    fn from(msg: &'static str) -> Self {
        VolIOError::Other(msg)
    }
}

impl fmt::Display for VolIOError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.msg())?;
        Ok(())
    }
}
