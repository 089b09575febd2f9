use std::cmp::Ordering;

use crate::error::Result;

/// One row: an ordered sequence of optional text fields.
///
/// Rows of the same file may have different column counts.
pub type Row = Vec<Option<String>>;

/// Column-by-column string comparison.
///
/// Only the first `min(a.len(), b.len())` fields take part, so a row and any
/// extension of it compare equal. An absent field compares as `""`.
pub fn lexicographic(a: &Row, b: &Row) -> Ordering {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let x = x.as_deref().unwrap_or("");
            let y = y.as_deref().unwrap_or("");
            x.cmp(y)
        })
        .find(|ord| ord.is_ne())
        .unwrap_or(Ordering::Equal)
}

/// Downstream consumer of sorted rows.
pub trait RowSink {
    fn push(&mut self, row: &Row) -> Result<()>;
}

impl RowSink for Vec<Row> {
    fn push(&mut self, row: &Row) -> Result<()> {
        Vec::push(self, row.clone());
        Ok(())
    }
}

impl<S: RowSink + ?Sized> RowSink for &mut S {
    fn push(&mut self, row: &Row) -> Result<()> {
        (**self).push(row)
    }
}

/// Builds a row with every field present. Handy in tests and examples.
pub fn row_of<S: AsRef<str>>(fields: &[S]) -> Row {
    fields.iter().map(|f| Some(f.as_ref().to_string())).collect()
}
