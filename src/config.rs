use std::path::PathBuf;

use crate::diskio::compression::Compression;
use crate::diskio::stream::{FLUSH_INTERVAL, SEGMENT_BUFFER_SIZE, STREAM_BUFFER_SIZE};
use crate::error::{Result, SortError};

/// Default upper bound on the number of spill segments.
pub const DEFAULT_MAX_SEGMENTS: u32 = 1024;

/// Sorter configuration.
#[derive(Debug, Clone)]
pub struct SortConfig {
    /// Upper bound used to size batches; the budget is chosen so that the
    /// input spills into at most this many segments.
    pub max_segments: u32,
    /// Directory for spill segments.
    pub temp_dir: PathBuf,
    /// Compression for the input, the segments and the output.
    pub compression: Compression,
    /// Rows between encoder flushes and compression resets.
    pub flush_interval: usize,
    /// Read buffer for the sort input.
    pub read_buffer_size: usize,
    /// Read buffer for each segment during the merge.
    pub segment_buffer_size: usize,
    /// Raise the batch budget to half of the available memory when that is
    /// larger than the size-derived budget.
    pub use_free_memory: bool,
}

impl Default for SortConfig {
    fn default() -> Self {
        Self {
            max_segments: DEFAULT_MAX_SEGMENTS,
            temp_dir: std::env::temp_dir(),
            compression: Compression::default(),
            flush_interval: FLUSH_INTERVAL,
            read_buffer_size: STREAM_BUFFER_SIZE,
            segment_buffer_size: SEGMENT_BUFFER_SIZE,
            use_free_memory: true,
        }
    }
}

impl SortConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_segments == 0 {
            return Err(SortError::InvalidConfig(
                "max_segments must be at least 1".to_string(),
            ));
        }
        if self.flush_interval == 0 {
            return Err(SortError::InvalidConfig(
                "flush_interval must be at least 1".to_string(),
            ));
        }
        if self.read_buffer_size == 0 || self.segment_buffer_size == 0 {
            return Err(SortError::InvalidConfig(
                "buffer sizes must be non-zero".to_string(),
            ));
        }
        if let Compression::Gzip { level } = self.compression {
            if level > 9 {
                return Err(SortError::InvalidConfig(format!(
                    "gzip level must be 0-9, got {level}"
                )));
            }
        }
        Ok(())
    }
}
