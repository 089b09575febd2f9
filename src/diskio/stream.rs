//! Row-stream files: encoded rows behind block compression and a fixed-size
//! buffer. Spill segments, the sort input and the sort output all use this
//! layout.

use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use crate::codec;
use crate::diskio::compression::{CompressedReader, CompressedWriter, Compression};
use crate::error::Result;
use crate::row::{Row, RowSink};

/// Buffer size for writers and for reading the sort input.
pub const STREAM_BUFFER_SIZE: usize = 4096;
/// Buffer size for each spill segment opened by the merge.
pub const SEGMENT_BUFFER_SIZE: usize = 2048;
/// Rows written between compression resets.
pub const FLUSH_INTERVAL: usize = 10_000;

/// Encodes rows into a row-stream file.
pub struct RowWriter {
    out: BufWriter<CompressedWriter>,
    rows: u64,
    since_reset: usize,
    flush_interval: usize,
}

impl RowWriter {
    /// Creates or truncates `path`.
    pub fn create(
        path: impl AsRef<Path>,
        compression: Compression,
        flush_interval: usize,
    ) -> Result<Self> {
        let path = path.as_ref();
        let file = File::create(path)?;
        Ok(Self::from_file(file, compression, flush_interval))
    }

    /// Creates `path`, failing if anything already exists there.
    pub fn create_new(
        path: impl AsRef<Path>,
        compression: Compression,
        flush_interval: usize,
    ) -> std::io::Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new().write(true).create_new(true).open(path)?;
        Ok(Self::from_file(file, compression, flush_interval))
    }

    fn from_file(file: File, compression: Compression, flush_interval: usize) -> Self {
        Self {
            out: BufWriter::with_capacity(STREAM_BUFFER_SIZE, compression.writer(file)),
            rows: 0,
            since_reset: 0,
            flush_interval: flush_interval.max(1),
        }
    }

    pub fn write(&mut self, row: &Row) -> Result<()> {
        codec::write_row(&mut self.out, row)?;
        self.rows += 1;
        self.since_reset += 1;

        if self.since_reset >= self.flush_interval {
            self.out.flush()?;
            self.out.get_mut().reset()?;
            self.since_reset = 0;
        }
        Ok(())
    }

    /// Flushes everything to disk and returns the number of rows written.
    pub fn finish(self) -> Result<u64> {
        let inner = self.out.into_inner().map_err(|e| e.into_error())?;
        inner.finish()?;
        Ok(self.rows)
    }
}

impl RowSink for RowWriter {
    fn push(&mut self, row: &Row) -> Result<()> {
        self.write(row)
    }
}

/// Decodes rows from a row-stream file.
pub struct RowReader {
    inner: BufReader<CompressedReader>,
}

impl RowReader {
    pub fn open(
        path: impl AsRef<Path>,
        compression: Compression,
        buffer_size: usize,
    ) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self {
            inner: BufReader::with_capacity(buffer_size.max(1), compression.reader(file)),
        })
    }

    /// Next row, or `Ok(None)` at a clean end of stream.
    pub fn next_row(&mut self) -> Result<Option<Row>> {
        codec::decode(&mut self.inner)
    }
}

impl Iterator for RowReader {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_row().transpose()
    }
}

/// Writes `rows` to a new row-stream file at `path`.
pub fn write_rows<I>(path: impl AsRef<Path>, rows: I, compression: Compression) -> Result<u64>
where
    I: IntoIterator<Item = Row>,
{
    let mut writer = RowWriter::create(path, compression, FLUSH_INTERVAL)?;
    for row in rows {
        writer.write(&row)?;
    }
    writer.finish()
}

/// Reads a whole row-stream file into memory.
pub fn read_rows(path: impl AsRef<Path>, compression: Compression) -> Result<Vec<Row>> {
    RowReader::open(path, compression, STREAM_BUFFER_SIZE)?.collect()
}
