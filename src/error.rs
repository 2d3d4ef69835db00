//! Decode-side error taxonomy.
//!
//! Encoding never fails: both compressors fall back to verbatim storage
//! rather than erroring. Decoding returns one of these when the stream
//! declares something the caller-provided capacity or the format cannot
//! satisfy. Truncated streams are not errors — decoding stops and returns
//! the bytes produced so far.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The header's uncompressed length exceeds the caller's output capacity.
    #[error("declared length {declared} exceeds output capacity {capacity}")]
    CorruptLength { declared: usize, capacity: usize },

    /// A decoded literal rank fell outside the 256-entry alphabet.
    #[error("literal rank {0} outside the 256-entry alphabet")]
    CorruptLiteralRank(usize),

    /// A block token references bytes before the start of the output.
    #[error("block offset {offset} reaches before the {produced} bytes produced so far")]
    CorruptOffset { offset: usize, produced: usize },
}
