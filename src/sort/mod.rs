pub mod cursor;
pub mod merge;
pub mod partition;
pub mod segment;
pub mod sort_buffer;
pub mod sorter;

use std::cmp::Ordering;

use crate::config::SortConfig;
use crate::error::Result;
use crate::row::{Row, RowSink};
use segment::SpillSegment;

/// Splits `rows` into sorted segments of at most roughly `budget` estimated
/// bytes each, in the default temp directory.
pub fn partition<I, C>(rows: I, cmp: C, budget: u64) -> Result<Vec<SpillSegment>>
where
    I: IntoIterator<Item = Result<Row>>,
    C: Fn(&Row, &Row) -> Ordering,
{
    partition::BatchPartitioner::new(budget, &SortConfig::default()).partition(rows, cmp)
}

/// Merges segments produced by [`partition`] into `sink`.
pub fn merge<C, S>(segments: Vec<SpillSegment>, cmp: C, sink: &mut S) -> Result<u64>
where
    C: Fn(&Row, &Row) -> Ordering,
    S: RowSink + ?Sized,
{
    merge::MergeScheduler::new(&SortConfig::default()).merge(segments, cmp, sink)
}
