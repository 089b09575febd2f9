use thiserror::Error;

/// Errors produced while sorting.
///
/// A clean end of a row stream is not an error: readers report it as
/// `Ok(None)`. `Decode` is reserved for streams that end or go wrong in the
/// middle of a record.
#[derive(Debug, Error)]
pub enum SortError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed row record: {reason}")]
    Decode { reason: String },

    #[error("row cannot be encoded: {reason}")]
    Encode { reason: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("sort was cancelled")]
    Cancelled,
}

impl SortError {
    pub(crate) fn decode(reason: impl Into<String>) -> Self {
        SortError::Decode {
            reason: reason.into(),
        }
    }

    pub(crate) fn encode(reason: impl Into<String>) -> Self {
        SortError::Encode {
            reason: reason.into(),
        }
    }
}

pub type Result<T, E = SortError> = std::result::Result<T, E>;
