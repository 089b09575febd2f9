//! Binary row record format used by spill segments and row-stream files.
//!
//! A record is laid out as
//!
//! ```text
//! [i32 field count]
//! field count x ( [u8 presence flag] [u32 byte length] [UTF-8 bytes] )
//! ```
//!
//! where the length and payload only follow a presence flag of `1`. All
//! integers are big-endian. There is no terminating record: a stream ends
//! when it runs out of bytes exactly at a record boundary.

use std::io::{ErrorKind, Read, Write};

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{Result, SortError};
use crate::row::Row;

const FIELD_ABSENT: u8 = 0;
const FIELD_PRESENT: u8 = 1;

/// Encoded size of a row in bytes.
pub fn encoded_len(row: &Row) -> usize {
    4 + row
        .iter()
        .map(|f| 1 + f.as_ref().map_or(0, |s| 4 + s.len()))
        .sum::<usize>()
}

/// Encodes one row into a standalone buffer.
pub fn encode(row: &Row) -> Result<Bytes> {
    let count = field_count(row.len())?;

    let mut buf = BytesMut::with_capacity(encoded_len(row));
    buf.put_i32(count);
    for field in row {
        match field {
            Some(text) => {
                let len = field_len(text.len())?;
                buf.put_u8(FIELD_PRESENT);
                buf.put_u32(len);
                buf.put_slice(text.as_bytes());
            }
            None => buf.put_u8(FIELD_ABSENT),
        }
    }
    Ok(buf.freeze())
}

fn field_count(count: usize) -> Result<i32> {
    i32::try_from(count).map_err(|_| SortError::encode(format!("too many fields: {count}")))
}

fn field_len(len: usize) -> Result<u32> {
    u32::try_from(len).map_err(|_| SortError::encode(format!("field too long: {len} bytes")))
}

/// Encodes `row` and writes it to `writer`.
pub fn write_row<W: Write>(writer: &mut W, row: &Row) -> Result<()> {
    let record = encode(row)?;
    writer.write_all(&record)?;
    Ok(())
}

/// Decodes the next row from `reader`.
///
/// Returns `Ok(None)` when the stream is exhausted before the first byte of a
/// new record. Running out of bytes anywhere else is a decode error.
pub fn decode<R: Read>(reader: &mut R) -> Result<Option<Row>> {
    let mut header = [0u8; 4];
    match read_full(reader, &mut header)? {
        0 => return Ok(None),
        4 => {}
        n => {
            return Err(SortError::decode(format!(
                "truncated field count: got {n} of 4 bytes"
            )));
        }
    }

    let count = (&header[..]).get_i32();
    if count < 0 {
        return Err(SortError::decode(format!("negative field count {count}")));
    }

    // Do not trust the count for preallocation beyond a sane bound.
    let mut row = Row::with_capacity((count as usize).min(1024));
    for index in 0..count {
        let mut flag = [0u8; 1];
        expect_bytes(reader, &mut flag, "presence flag")?;
        match flag[0] {
            FIELD_ABSENT => row.push(None),
            FIELD_PRESENT => {
                let mut len = [0u8; 4];
                expect_bytes(reader, &mut len, "field length")?;
                let len = (&len[..]).get_u32() as usize;

                let mut payload = Vec::new();
                let got = (&mut *reader).take(len as u64).read_to_end(&mut payload)?;
                if got != len {
                    return Err(SortError::decode(format!(
                        "truncated field {index}: got {got} of {len} bytes"
                    )));
                }
                let text = String::from_utf8(payload).map_err(|e| {
                    SortError::decode(format!("field {index} is not valid UTF-8: {e}"))
                })?;
                row.push(Some(text));
            }
            other => {
                return Err(SortError::decode(format!(
                    "invalid presence flag {other} for field {index}"
                )));
            }
        }
    }
    Ok(Some(row))
}

fn expect_bytes<R: Read>(reader: &mut R, buf: &mut [u8], what: &str) -> Result<()> {
    let n = read_full(reader, buf)?;
    if n != buf.len() {
        return Err(SortError::decode(format!(
            "truncated {what}: got {n} of {} bytes",
            buf.len()
        )));
    }
    Ok(())
}

/// Reads until `buf` is full or the stream ends, returning the byte count.
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
