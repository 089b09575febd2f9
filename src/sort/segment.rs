use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use log::warn;

use crate::SegmentInfo;
use crate::diskio::compression::Compression;
use crate::diskio::stream::RowWriter;
use crate::error::Result;
use crate::rand::unique_suffix;
use crate::row::Row;

static NEXT_SEGMENT: AtomicU64 = AtomicU64::new(0);

/// A sorted spill file.
///
/// The segment owns its file: dropping a segment that was not explicitly
/// deleted removes the file, so every exit path of a sort cleans up the
/// segments it still holds.
#[derive(Debug)]
pub struct SpillSegment {
    path: PathBuf,
    info: SegmentInfo,
    deleted: bool,
}

impl SpillSegment {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn info(&self) -> &SegmentInfo {
        &self.info
    }

    /// Removes the backing file now.
    pub fn delete(mut self) -> std::io::Result<()> {
        self.deleted = true;
        fs::remove_file(&self.path)
    }
}

impl Drop for SpillSegment {
    fn drop(&mut self) {
        if self.deleted {
            return;
        }
        if let Err(e) = fs::remove_file(&self.path) {
            if e.kind() != ErrorKind::NotFound {
                warn!("failed to remove spill segment {}: {}", self.path.display(), e);
            }
        }
    }
}

/// Writes one sorted batch into a fresh segment file.
pub struct SegmentWriter {
    // Field order matters: the file is closed before a failed segment is
    // removed on drop.
    writer: RowWriter,
    segment: SpillSegment,
}

impl SegmentWriter {
    pub fn create(dir: &Path, compression: Compression, flush_interval: usize) -> Result<Self> {
        loop {
            let seq = NEXT_SEGMENT.fetch_add(1, Ordering::Relaxed);
            let path = dir.join(format!(
                "segment_{}_{:06}_{}.spill",
                std::process::id(),
                seq,
                unique_suffix()
            ));
            match RowWriter::create_new(&path, compression, flush_interval) {
                Ok(writer) => {
                    return Ok(Self {
                        writer,
                        segment: SpillSegment {
                            path,
                            info: SegmentInfo::default(),
                            deleted: false,
                        },
                    });
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }

    pub fn write(&mut self, row: &Row) -> Result<()> {
        self.writer.write(row)
    }

    /// Completes the file and hands over ownership of the segment.
    pub fn finish(self, estimated_bytes: u64) -> Result<SpillSegment> {
        let mut segment = self.segment;
        segment.info.rows = self.writer.finish()?;
        segment.info.estimated_bytes = estimated_bytes;
        segment.info.file_size = fs::metadata(&segment.path)?.len();
        Ok(segment)
    }
}
