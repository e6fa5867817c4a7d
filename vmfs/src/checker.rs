// SPDX-License-Identifier: MIT
//! Diagnostic report types for the bitmap dump.

#[cfg(feature = "alloc")]
use alloc::{string::String, vec::Vec};

use core::cmp::Ordering;
#[cfg(feature = "alloc")]
use core::fmt;

use bitflags::bitflags;

use crate::bitmap::BitmapKind;
#[cfg(feature = "alloc")]
use crate::bitmap::BitmapUsage;
#[cfg(feature = "alloc")]
use crate::errors::FsBitmapError;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warn,
    Error,
}

impl PartialOrd for Severity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Severity {
    fn cmp(&self, other: &Self) -> Ordering {
        fn rank(s: Severity) -> u8 {
            match s {
                Severity::Info => 0,
                Severity::Warn => 1,
                Severity::Error => 2,
            }
        }
        rank(*self).cmp(&rank(*other))
    }
}

bitflags! {
    /// Selects which system bitmaps a dump visits.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct DumpSelect: u32 {
        const FBB = 1 << 0;
        const FDC = 1 << 1;
        const PBC = 1 << 2;
        const SBC = 1 << 3;
        const ALL = u32::MAX;
    }
}

impl From<BitmapKind> for DumpSelect {
    fn from(kind: BitmapKind) -> Self {
        match kind {
            BitmapKind::Fbb => DumpSelect::FBB,
            BitmapKind::Fdc => DumpSelect::FDC,
            BitmapKind::Pbc => DumpSelect::PBC,
            BitmapKind::Sbc => DumpSelect::SBC,
        }
    }
}

#[cfg(feature = "alloc")]
#[derive(Clone, Debug)]
pub struct Finding {
    pub sev: Severity,
    pub code: &'static str,
    pub msg: String,
}

#[cfg(feature = "alloc")]
impl Finding {
    pub fn info(code: &'static str, msg: impl Into<String>) -> Self {
        Self {
            sev: Severity::Info,
            code,
            msg: msg.into(),
        }
    }

    pub fn warn(code: &'static str, msg: impl Into<String>) -> Self {
        Self {
            sev: Severity::Warn,
            code,
            msg: msg.into(),
        }
    }

    pub fn err(code: &'static str, msg: impl Into<String>) -> Self {
        Self {
            sev: Severity::Error,
            code,
            msg: msg.into(),
        }
    }
}

/// Outcome of querying one system bitmap.
#[cfg(feature = "alloc")]
#[derive(Clone, Debug)]
pub struct BitmapDump {
    pub kind: BitmapKind,
    pub result: Result<BitmapUsage, FsBitmapError>,
}

/// Assembled diagnostic report over the four system bitmaps.
///
/// A failing bitmap contributes an error entry instead of aborting the
/// dump; partial information beats none for a diagnostic tool.
#[cfg(feature = "alloc")]
#[derive(Clone, Debug, Default)]
pub struct BitmapReport {
    pub findings: Vec<Finding>,
    pub dumps: Vec<BitmapDump>,
}

#[cfg(feature = "alloc")]
impl BitmapReport {
    pub fn push(&mut self, f: Finding) {
        self.findings.push(f)
    }

    pub fn record(&mut self, dump: BitmapDump) {
        self.dumps.push(dump)
    }

    pub fn usage(&self, kind: BitmapKind) -> Option<&BitmapUsage> {
        self.dumps
            .iter()
            .find(|d| d.kind == kind)
            .and_then(|d| d.result.as_ref().ok())
    }

    pub fn bitmap_error(&self, kind: BitmapKind) -> Option<FsBitmapError> {
        self.dumps
            .iter()
            .find(|d| d.kind == kind)
            .and_then(|d| d.result.as_ref().err().copied())
    }

    pub fn has_error(&self) -> bool {
        self.findings
            .iter()
            .any(|f| matches!(f.sev, Severity::Error))
    }

    pub fn ok(&self) -> bool {
        !self.has_error()
    }

    pub fn count(&self, s: Severity) -> usize {
        self.findings.iter().filter(|f| f.sev == s).count()
    }

    /// Display filtered to findings at or above `min_level`.
    pub fn display_min(&self, min_level: Severity) -> ReportDisplay<'_> {
        ReportDisplay {
            rep: self,
            min_level,
        }
    }
}

#[cfg(feature = "alloc")]
pub struct ReportDisplay<'a> {
    rep: &'a BitmapReport,
    min_level: Severity,
}

#[cfg(feature = "alloc")]
impl<'a> fmt::Display for ReportDisplay<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for it in &self.rep.findings {
            if it.sev < self.min_level {
                continue;
            }
            let tag = match it.sev {
                Severity::Info => "INFO",
                Severity::Warn => "WARN",
                Severity::Error => "ERR ",
            };
            writeln!(f, "{tag}: {:<4} {}", it.code, it.msg)?;
        }
        Ok(())
    }
}

#[cfg(feature = "alloc")]
impl fmt::Display for BitmapReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.display_min(Severity::Info).fmt(f)
    }
}
