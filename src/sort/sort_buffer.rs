use std::cmp::Ordering;

use crate::estimator::SizingConfig;
use crate::row::Row;

/// In-memory batch of rows bounded by an estimated byte budget.
pub struct SortBuffer {
    data: Vec<Row>,
    memory_used: u64,
    memory_limit: u64,
    sizing: SizingConfig,
}

impl SortBuffer {
    pub fn new(memory_limit: u64) -> Self {
        Self::with_sizing(memory_limit, *SizingConfig::global())
    }

    pub fn with_sizing(memory_limit: u64, sizing: SizingConfig) -> Self {
        Self {
            data: Vec::new(),
            memory_used: 0,
            memory_limit,
            sizing,
        }
    }
}

impl SortBuffer {
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn memory_used(&self) -> u64 {
        self.memory_used
    }

    /// Adds a row. Returns `false` once the estimated size has reached the
    /// limit, at which point the batch should be flushed.
    pub fn append(&mut self, row: Row) -> bool {
        self.memory_used += self.sizing.estimate(&row);
        self.data.push(row);
        self.memory_used < self.memory_limit
    }

    /// Stable sort: rows that compare equal keep their insertion order.
    ///
    /// `cmp` may be inconsistent across rows of different lengths (a row
    /// ties with every extension of itself); the sort still terminates with
    /// every row kept.
    pub fn sort<C>(&mut self, cmp: C)
    where
        C: Fn(&Row, &Row) -> Ordering,
    {
        let data = std::mem::take(&mut self.data);
        self.data = merge_sort(data, &cmp);
    }

    pub fn drain(&mut self) -> std::vec::IntoIter<Row> {
        let data = std::mem::take(&mut self.data);
        self.memory_used = 0;
        data.into_iter()
    }
}

// Top-down merge sort. The right run wins only when its head is strictly
// smaller, which keeps equal rows in input order.
fn merge_sort<C>(mut rows: Vec<Row>, cmp: &C) -> Vec<Row>
where
    C: Fn(&Row, &Row) -> Ordering,
{
    if rows.len() <= 1 {
        return rows;
    }
    let right = rows.split_off(rows.len() / 2);
    let left = merge_sort(rows, cmp);
    let right = merge_sort(right, cmp);

    let mut merged = Vec::with_capacity(left.len() + right.len());
    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();
    loop {
        let take_right = match (left.peek(), right.peek()) {
            (Some(l), Some(r)) => cmp(r, l).is_lt(),
            (Some(_), None) => false,
            (None, Some(_)) => true,
            (None, None) => break,
        };
        merged.extend(if take_right { right.next() } else { left.next() });
    }
    merged
}
