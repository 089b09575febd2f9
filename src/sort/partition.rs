use std::cmp::Ordering;
use std::fs;
use std::path::PathBuf;

use log::{debug, info};

use crate::cancel::CancellationToken;
use crate::config::SortConfig;
use crate::diskio::compression::Compression;
use crate::diskio::file::available_memory;
use crate::error::{Result, SortError};
use crate::estimator::BYTES_PER_CHAR;
use crate::row::Row;
use crate::sort::segment::{SegmentWriter, SpillSegment};
use crate::sort::sort_buffer::SortBuffer;

/// Batch budget for an input of `input_len` bytes, using the memory that is
/// available right now as a floor.
pub fn compute_budget(input_len: u64, max_segments: u32) -> Result<u64> {
    compute_budget_with_free_memory(input_len, max_segments, available_memory())
}

/// `ceil(input_len * 4 / max_segments)`, raised to `free_memory / 2` when
/// that is larger.
pub fn compute_budget_with_free_memory(
    input_len: u64,
    max_segments: u32,
    free_memory: u64,
) -> Result<u64> {
    if max_segments == 0 {
        return Err(SortError::InvalidConfig(
            "max_segments must be at least 1".to_string(),
        ));
    }

    let expanded = u128::from(input_len) * u128::from(BYTES_PER_CHAR);
    let budget = expanded.div_ceil(u128::from(max_segments));
    let budget = u64::try_from(budget).unwrap_or(u64::MAX);
    let floor = free_memory / 2;

    debug!(
        "budget for {} input bytes over {} segments: {} (floor {})",
        input_len, max_segments, budget, floor
    );
    Ok(budget.max(floor))
}

/// Splits a row stream into sorted spill segments of bounded estimated size.
pub struct BatchPartitioner {
    budget: u64,
    temp_dir: PathBuf,
    compression: Compression,
    flush_interval: usize,
    cancel: CancellationToken,
}

impl BatchPartitioner {
    pub fn new(budget: u64, config: &SortConfig) -> Self {
        Self {
            budget,
            temp_dir: config.temp_dir.clone(),
            compression: config.compression,
            flush_interval: config.flush_interval,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Consumes `rows` and returns one segment per flushed batch.
    ///
    /// Segments already written are removed again if this fails.
    pub fn partition<I, C>(&self, rows: I, cmp: C) -> Result<Vec<SpillSegment>>
    where
        I: IntoIterator<Item = Result<Row>>,
        C: Fn(&Row, &Row) -> Ordering,
    {
        fs::create_dir_all(&self.temp_dir)?;

        let mut segments = Vec::new();
        let mut buffer = SortBuffer::new(self.budget);

        for row in rows {
            self.cancel.check()?;
            if !buffer.append(row?) {
                segments.push(self.spill(&mut buffer, &cmp)?);
            }
        }
        if !buffer.is_empty() {
            segments.push(self.spill(&mut buffer, &cmp)?);
        }

        info!(
            "partitioned input into {} segments (budget {} bytes)",
            segments.len(),
            self.budget
        );
        Ok(segments)
    }

    fn spill<C>(&self, buffer: &mut SortBuffer, cmp: &C) -> Result<SpillSegment>
    where
        C: Fn(&Row, &Row) -> Ordering,
    {
        self.cancel.check()?;
        debug!(
            "sorting batch of {} rows ({} estimated bytes)",
            buffer.len(),
            buffer.memory_used()
        );
        buffer.sort(cmp);
        let estimated = buffer.memory_used();

        let mut writer = SegmentWriter::create(&self.temp_dir, self.compression, self.flush_interval)?;
        for row in buffer.drain() {
            writer.write(&row)?;
        }
        let segment = writer.finish(estimated)?;

        debug!(
            "spilled {} rows to {}",
            segment.info().rows,
            segment.path().display()
        );
        Ok(segment)
    }
}
