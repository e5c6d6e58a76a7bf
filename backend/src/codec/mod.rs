//! Outbound encodings: the streaming tick buffer and the analysis reshape.

mod reshape;
mod stream;

pub use reshape::{reshape_histogram, reshape_rows};
pub use stream::{buffer_len, ObjectRecord, TickBuffer, HEADER_LEN, OBJECT_STRIDE, SUN_LEN};

use crate::models::TimeFields;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CodecError {
    #[error("Tick buffer of {0} floats does not match the 6 + 2 + 4n layout")]
    BufferLength(usize),

    #[error("Byte length {0} is not a multiple of 4")]
    ByteLength(usize),

    #[error("Invalid calendar time in analysis table: {0:?}")]
    InvalidTime(TimeFields),

    #[error("Transit series lengths {found:?} differ from time series length {expected}")]
    RaggedSeries { expected: usize, found: Vec<usize> },
}
