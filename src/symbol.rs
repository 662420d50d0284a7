//! Symbol records.
//!
//! Tracks the functions named by the map file as they are enriched with file
//! offsets and padding measurements.

use std::fmt;

/// A function entry parsed from the map file.
///
/// Created with only `name` and `virtual_address`; `raw_offset` is filled in by
/// address translation and the padding fields by the scanner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolRecord {
    /// Mangled name as written by the linker.
    pub name: String,
    /// Absolute virtual address (`RVA+Base` column).
    pub virtual_address: u64,
    /// File offset of the first byte of the function.
    pub raw_offset: Option<usize>,
    /// File offset of the first filler byte.
    pub pad_start: usize,
    /// Number of filler bytes directly before `raw_offset`.
    pub pad_len: usize,
}

impl SymbolRecord {
    pub fn new(name: impl Into<String>, virtual_address: u64) -> Self {
        Self {
            name: name.into(),
            virtual_address,
            raw_offset: None,
            pad_start: 0,
            pad_len: 0,
        }
    }

    /// Whether the scanner found anything worth patching.
    pub fn has_padding(&self) -> bool {
        self.pad_len >= 1
    }

    /// Byte range covered by the padding.
    pub fn pad_range(&self) -> std::ops::Range<usize> {
        self.pad_start..self.pad_start + self.pad_len
    }
}

/// Why a symbol was dropped from the candidate set.
///
/// None of these abort a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SkipReason {
    /// Address falls inside the image header.
    ReservedHeader,
    /// Address is outside every section, or past the end of the file.
    Unmapped,
    /// No filler before the function.
    NoPadding,
    /// Filler is not preceded by a return instruction.
    PrecheckFailed,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            SkipReason::ReservedHeader => "address in reserved header region",
            SkipReason::Unmapped => "address not mapped by any section",
            SkipReason::NoPadding => "no padding",
            SkipReason::PrecheckFailed => "padding not preceded by a return",
        };
        f.write_str(text)
    }
}
