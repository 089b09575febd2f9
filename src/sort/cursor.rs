use crate::diskio::compression::Compression;
use crate::diskio::stream::RowReader;
use crate::error::Result;
use crate::row::Row;
use crate::sort::segment::SpillSegment;

/// Sequential reader over one spill segment with one row of lookahead.
pub struct SegmentCursor {
    // Declared before `segment` so the file is closed before the segment is
    // removed on drop.
    reader: Option<RowReader>,
    head: Option<Row>,
    segment: SpillSegment,
}

impl SegmentCursor {
    /// Opens `segment` and decodes its first row. A cursor over an empty
    /// segment starts out exhausted.
    pub fn open(segment: SpillSegment, compression: Compression, buffer_size: usize) -> Result<Self> {
        let reader = RowReader::open(segment.path(), compression, buffer_size)?;
        let mut cursor = Self {
            reader: Some(reader),
            head: None,
            segment,
        };
        cursor.advance()?;
        Ok(cursor)
    }

    fn advance(&mut self) -> Result<()> {
        self.head = match self.reader.as_mut() {
            Some(reader) => reader.next_row()?,
            None => None,
        };
        Ok(())
    }

    pub fn peek(&self) -> Option<&Row> {
        self.head.as_ref()
    }

    /// Returns the current row and decodes the next one.
    pub fn pop(&mut self) -> Result<Option<Row>> {
        let Some(row) = self.head.take() else {
            return Ok(None);
        };
        self.advance()?;
        Ok(Some(row))
    }

    pub fn is_exhausted(&self) -> bool {
        self.head.is_none()
    }

    /// Releases the underlying file. Safe to call more than once.
    pub fn close(&mut self) {
        self.reader = None;
    }

    /// Closes the cursor and returns the segment it was reading.
    pub fn into_segment(mut self) -> SpillSegment {
        self.close();
        self.segment
    }
}
