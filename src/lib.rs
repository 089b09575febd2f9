// External row sort library
//
// Rows (sequences of optional text fields) are buffered up to a memory
// budget, sorted in memory, spilled to compressed segment files and finally
// merged into one sorted row stream.

/// Statistics about a sort operation
#[derive(Clone, Debug, Default)]
pub struct SortStats {
    pub rows: u64,
    pub budget: u64,
    pub num_segments: usize,
    pub segments_info: Vec<SegmentInfo>,
    pub partition_time_ms: Option<u128>,
    pub merge_time_ms: Option<u128>,
}

impl std::fmt::Display for SortStats {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        writeln!(f, "SortStats:")?;
        writeln!(f, "  Rows: {}", self.rows)?;
        writeln!(f, "  Batch budget: {} bytes", self.budget)?;
        writeln!(f, "  Number of segments: {}", self.num_segments)?;
        writeln!(
            f,
            "  (P) time: {} ms",
            self.partition_time_ms.unwrap_or(0)
        )?;
        writeln!(f, "  (M) time: {} ms", self.merge_time_ms.unwrap_or(0))?;

        if !self.segments_info.is_empty() {
            let spilled: u64 = self.segments_info.iter().map(|s| s.file_size).sum();
            let estimated: u64 = self.segments_info.iter().map(|s| s.estimated_bytes).sum();
            writeln!(
                f,
                "  Spilled: {} bytes on disk for {} estimated bytes in memory",
                spilled, estimated
            )?;
            if estimated > 0 {
                writeln!(
                    f,
                    "  Spill ratio: {:.2}x",
                    estimated as f64 / spilled.max(1) as f64
                )?;
            }
            if self.segments_info.len() <= 32 {
                for (i, info) in self.segments_info.iter().enumerate() {
                    writeln!(f, "    S{}: {}", i, info)?;
                }
            }
        }

        Ok(())
    }
}

/// Information about a single spill segment
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SegmentInfo {
    pub rows: u64,
    pub estimated_bytes: u64,
    pub file_size: u64,
}

impl std::fmt::Display for SegmentInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "rows={}, estimated_bytes={}, file_size={}",
            self.rows, self.estimated_bytes, self.file_size
        )
    }
}

// Implementations
pub mod cancel;
pub mod codec;
pub mod config;
pub mod diskio;
pub mod error;
pub mod estimator;
pub mod rand;
pub mod row;
pub mod sort;

// Export the main types
pub use cancel::CancellationToken;
pub use config::SortConfig;
pub use diskio::compression::Compression;
pub use diskio::stream::{RowReader, RowWriter, read_rows, write_rows};
pub use error::{Result, SortError};
pub use row::{Row, RowSink, lexicographic, row_of};
pub use sort::cursor::SegmentCursor;
pub use sort::merge::MergeScheduler;
pub use sort::partition::{BatchPartitioner, compute_budget, compute_budget_with_free_memory};
pub use sort::segment::SpillSegment;
pub use sort::sorter::{ExternalSorter, sort};
pub use sort::{merge, partition};
