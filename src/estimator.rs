//! Rough in-memory size of a buffered row.
//!
//! The estimate is deliberately pessimistic: every character is charged four
//! bytes, and each row pays a fixed bookkeeping overhead that depends on the
//! pointer width of the target.

use std::sync::OnceLock;

use crate::row::Row;

/// Bytes charged per character of a present field.
pub const BYTES_PER_CHAR: u64 = 4;

/// Per-row overhead constants for the current process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizingConfig {
    pub row_overhead: u64,
}

impl SizingConfig {
    /// Overhead used when pointers are 4 bytes wide.
    pub const NARROW: SizingConfig = SizingConfig::for_pointer_width(4);
    /// Overhead used when pointers are 8 bytes wide.
    pub const WIDE: SizingConfig = SizingConfig::for_pointer_width(8);

    const fn for_pointer_width(ptr: u64) -> SizingConfig {
        // allocation header, three 4-byte counters, one reference to the row
        // and the header of the field vector
        let alloc_header = 2 * ptr;
        let counters = 12;
        let reference = ptr;
        let vec_header = 3 * ptr;
        SizingConfig {
            row_overhead: alloc_header + counters + reference + vec_header,
        }
    }

    /// Constants for the pointer width this binary was built for. Unknown
    /// widths fall back to the wide constants, which over-estimate.
    pub fn detect() -> SizingConfig {
        match usize::BITS {
            32 => SizingConfig::NARROW,
            _ => SizingConfig::WIDE,
        }
    }

    /// Process-wide sizing constants, computed on first use.
    pub fn global() -> &'static SizingConfig {
        static SIZING: OnceLock<SizingConfig> = OnceLock::new();
        SIZING.get_or_init(SizingConfig::detect)
    }

    pub fn estimate(&self, row: &Row) -> u64 {
        let text: u64 = row
            .iter()
            .flatten()
            .map(|field| field.chars().count() as u64 * BYTES_PER_CHAR)
            .sum();
        text + self.row_overhead
    }
}

/// Estimated bytes held by `row` while buffered, using the process-wide
/// sizing constants.
pub fn estimate(row: &Row) -> u64 {
    SizingConfig::global().estimate(row)
}
