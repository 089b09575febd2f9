//! Block compression wrapped around row streams.
//!
//! Gzip streams are written as a sequence of concatenated gzip members.
//! [`CompressedWriter::reset`] closes the current member and opens a new one,
//! which drops the encoder's back-reference window without changing the
//! decoded bytes. Readers always use a multi-member decoder.

use std::fs::File;
use std::io::{self, Read, Write};

use flate2::Compression as GzLevel;
use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;

/// Compression applied to every row stream the sorter reads or writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    /// Raw records, no transform.
    None,
    /// Gzip with the given level (0-9).
    Gzip { level: u32 },
}

impl Default for Compression {
    fn default() -> Self {
        Compression::Gzip { level: 6 }
    }
}

impl Compression {
    pub fn writer(self, file: File) -> CompressedWriter {
        let encoder = match self {
            Compression::None => Encoder::Plain(file),
            Compression::Gzip { level } => {
                Encoder::Gzip(GzEncoder::new(file, GzLevel::new(level.min(9))))
            }
        };
        CompressedWriter {
            encoder: Some(encoder),
            compression: self,
        }
    }

    pub fn reader(self, file: File) -> CompressedReader {
        match self {
            Compression::None => CompressedReader::Plain(file),
            Compression::Gzip { .. } => CompressedReader::Gzip(MultiGzDecoder::new(file)),
        }
    }
}

enum Encoder {
    Plain(File),
    Gzip(GzEncoder<File>),
}

impl Encoder {
    fn finish(self) -> io::Result<File> {
        match self {
            Encoder::Plain(file) => Ok(file),
            Encoder::Gzip(encoder) => encoder.finish(),
        }
    }
}

/// Compressing byte sink over a file.
pub struct CompressedWriter {
    // None only after a failed reset; every later call reports an error.
    encoder: Option<Encoder>,
    compression: Compression,
}

impl CompressedWriter {
    /// Ends the current compression block and starts a fresh one.
    pub fn reset(&mut self) -> io::Result<()> {
        if let Compression::None = self.compression {
            return self.flush();
        }
        let encoder = self.encoder.take().ok_or_else(broken)?;
        let mut file = encoder.finish()?;
        file.flush()?;
        *self = self.compression.writer(file);
        Ok(())
    }

    /// Writes any trailing compression data and returns the file.
    pub fn finish(mut self) -> io::Result<File> {
        let encoder = self.encoder.take().ok_or_else(broken)?;
        let mut file = encoder.finish()?;
        file.flush()?;
        Ok(file)
    }
}

impl Write for CompressedWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.encoder.as_mut().ok_or_else(broken)? {
            Encoder::Plain(file) => file.write(buf),
            Encoder::Gzip(encoder) => encoder.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.encoder.as_mut().ok_or_else(broken)? {
            Encoder::Plain(file) => file.flush(),
            Encoder::Gzip(encoder) => encoder.flush(),
        }
    }
}

fn broken() -> io::Error {
    io::Error::other("compressed writer is no longer usable after an earlier failure")
}

/// Decompressing byte source over a file.
pub enum CompressedReader {
    Plain(File),
    Gzip(MultiGzDecoder<File>),
}

impl Read for CompressedReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            CompressedReader::Plain(file) => file.read(buf),
            CompressedReader::Gzip(decoder) => decoder.read(buf),
        }
    }
}
