use std::cmp::Ordering;
use std::collections::BinaryHeap;

use log::{debug, warn};

use crate::cancel::CancellationToken;
use crate::config::SortConfig;
use crate::diskio::compression::Compression;
use crate::error::Result;
use crate::row::{Row, RowSink};
use crate::sort::cursor::SegmentCursor;
use crate::sort::segment::SpillSegment;

// Heap entry: an active cursor ordered by its lookahead row. Cursors are only
// advanced after being popped from the heap and pushed back afterwards.
struct HeapEntry<'a, C> {
    cursor: SegmentCursor,
    cmp: &'a C,
}

impl<C> HeapEntry<'_, C>
where
    C: Fn(&Row, &Row) -> Ordering,
{
    fn compare_heads(&self, other: &Self) -> Ordering {
        match (self.cursor.peek(), other.cursor.peek()) {
            (Some(a), Some(b)) => (self.cmp)(a, b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }
}

// Implement reverse ordering for min-heap
impl<C> Ord for HeapEntry<'_, C>
where
    C: Fn(&Row, &Row) -> Ordering,
{
    fn cmp(&self, other: &Self) -> Ordering {
        other.compare_heads(self)
    }
}

impl<C> PartialOrd for HeapEntry<'_, C>
where
    C: Fn(&Row, &Row) -> Ordering,
{
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<C> Eq for HeapEntry<'_, C> where C: Fn(&Row, &Row) -> Ordering {}

impl<C> PartialEq for HeapEntry<'_, C>
where
    C: Fn(&Row, &Row) -> Ordering,
{
    fn eq(&self, other: &Self) -> bool {
        self.compare_heads(other) == Ordering::Equal
    }
}

/// K-way merge of spill segments into a single sorted row stream.
pub struct MergeScheduler {
    compression: Compression,
    buffer_size: usize,
    cancel: CancellationToken,
}

impl MergeScheduler {
    pub fn new(config: &SortConfig) -> Self {
        Self {
            compression: config.compression,
            buffer_size: config.segment_buffer_size,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Merges `segments` into `sink` and returns the number of rows emitted.
    ///
    /// Each segment is deleted as soon as it is exhausted. On failure the
    /// open cursors are closed and the remaining segments deleted before the
    /// error is returned; whatever already reached `sink` stays there.
    /// Rows that compare equal may come out in any segment order.
    pub fn merge<C, S>(&self, segments: Vec<SpillSegment>, cmp: C, sink: &mut S) -> Result<u64>
    where
        C: Fn(&Row, &Row) -> Ordering,
        S: RowSink + ?Sized,
    {
        let mut heap = BinaryHeap::with_capacity(segments.len());
        let mut pending = segments.into_iter();

        for segment in pending.by_ref() {
            self.cancel.check()?;
            let cursor = SegmentCursor::open(segment, self.compression, self.buffer_size)?;
            if cursor.is_exhausted() {
                retire(cursor);
            } else {
                heap.push(HeapEntry { cursor, cmp: &cmp });
            }
        }
        debug!("merging {} non-empty segments", heap.len());

        let mut emitted = 0u64;
        while let Some(mut entry) = heap.pop() {
            self.cancel.check()?;

            let Some(row) = entry.cursor.pop()? else {
                retire(entry.cursor);
                continue;
            };
            sink.push(&row)?;
            emitted += 1;

            if entry.cursor.is_exhausted() {
                retire(entry.cursor);
            } else {
                heap.push(entry);
            }
        }

        Ok(emitted)
    }
}

// Closes an exhausted cursor and deletes its segment.
fn retire(cursor: SegmentCursor) {
    let segment = cursor.into_segment();
    let path = segment.path().to_path_buf();
    if let Err(e) = segment.delete() {
        warn!("failed to delete spill segment {}: {}", path.display(), e);
    }
}
