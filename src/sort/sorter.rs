use std::cmp::Ordering;
use std::path::Path;
use std::time::Instant;

use log::info;

use crate::cancel::CancellationToken;
use crate::config::SortConfig;
use crate::diskio::file::regular_file_len;
use crate::diskio::stream::{RowReader, RowWriter};
use crate::error::Result;
use crate::row::{Row, lexicographic};
use crate::sort::merge::MergeScheduler;
use crate::sort::partition::{BatchPartitioner, compute_budget, compute_budget_with_free_memory};
use crate::{SegmentInfo, SortStats};

/// Sorts one row-stream file into another through spill segments on disk.
pub struct ExternalSorter {
    config: SortConfig,
    cancel: CancellationToken,
}

impl Default for ExternalSorter {
    fn default() -> Self {
        Self::new(SortConfig::default())
    }
}

impl ExternalSorter {
    pub fn new(config: SortConfig) -> Self {
        Self {
            config,
            cancel: CancellationToken::new(),
        }
    }

    /// Attaches a token that can stop the sort from another thread.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Sorts `input` into `output` column by column.
    pub fn sort(&self, input: impl AsRef<Path>, output: impl AsRef<Path>) -> Result<SortStats> {
        self.sort_by(input, output, lexicographic)
    }

    /// Sorts `input` into `output` using `cmp`.
    ///
    /// A missing or empty input is not an error: nothing is written and
    /// `output` is left untouched.
    pub fn sort_by<C>(
        &self,
        input: impl AsRef<Path>,
        output: impl AsRef<Path>,
        cmp: C,
    ) -> Result<SortStats>
    where
        C: Fn(&Row, &Row) -> Ordering,
    {
        self.config.validate()?;
        let input = input.as_ref();
        let output = output.as_ref();

        let input_len = match regular_file_len(input)? {
            Some(len) if len > 0 => len,
            _ => {
                info!("{} is missing or empty, nothing to sort", input.display());
                return Ok(SortStats::default());
            }
        };

        let budget = if self.config.use_free_memory {
            compute_budget(input_len, self.config.max_segments)?
        } else {
            compute_budget_with_free_memory(input_len, self.config.max_segments, 0)?
        };

        // Partition phase
        let partition_start = Instant::now();
        let reader = RowReader::open(input, self.config.compression, self.config.read_buffer_size)?;
        let segments = BatchPartitioner::new(budget, &self.config)
            .with_cancellation(self.cancel.clone())
            .partition(reader, &cmp)?;
        let partition_time_ms = partition_start.elapsed().as_millis();

        let segments_info: Vec<SegmentInfo> =
            segments.iter().map(|segment| segment.info().clone()).collect();
        info!(
            "generated {} segments in {} ms",
            segments.len(),
            partition_time_ms
        );

        // Merge phase
        let merge_start = Instant::now();
        let mut writer = RowWriter::create(output, self.config.compression, self.config.flush_interval)?;
        let rows = MergeScheduler::new(&self.config)
            .with_cancellation(self.cancel.clone())
            .merge(segments, &cmp, &mut writer)?;
        writer.finish()?;
        let merge_time_ms = merge_start.elapsed().as_millis();

        info!("merged {} rows in {} ms", rows, merge_time_ms);

        Ok(SortStats {
            rows,
            budget,
            num_segments: segments_info.len(),
            segments_info,
            partition_time_ms: Some(partition_time_ms),
            merge_time_ms: Some(merge_time_ms),
        })
    }
}

/// Sorts `input` into `output` with the default configuration and returns the
/// number of rows written.
pub fn sort(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Result<u64> {
    Ok(ExternalSorter::default().sort(input, output)?.rows)
}
