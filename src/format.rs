// src/format.rs
//! Stream identification and decode dispatch.
//!
//! Both formats open with a fixed 4-byte tag followed by big-endian
//! uncompressed and compressed lengths. Anything else is an old headerless
//! cart whose code section is plain text, copied through verbatim.

use crate::error::CodecError;
use crate::{legacy, pxa};

/// Code-section size cap shared by both formats.
pub const CODE_MAX: usize = 0x10000;
/// Headerless carts store at most this much plain text.
pub const HEADERLESS_MAX: usize = 0x3d00;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Byte-oriented `:c:` stream.
    Legacy,
    /// Bit-packed `\0pxa` stream.
    Pxa,
}

/// Identifies a stream by its leading magic, or None for headerless text.
pub fn detect(input: &[u8]) -> Option<Format> {
    if input.len() < 4 {
        None
    } else if input[..4] == legacy::MAGIC {
        Some(Format::Legacy)
    } else if input[..4] == pxa::MAGIC {
        Some(Format::Pxa)
    } else {
        None
    }
}

/// Routes to the decoder matching the stream's magic. Headerless input is
/// treated as plain text: copied up to [`HEADERLESS_MAX`], ending at the
/// first NUL.
pub fn decompress(input: &[u8], max_len: usize) -> Result<Vec<u8>, CodecError> {
    match detect(input) {
        Some(Format::Legacy) => legacy::decompress(input, max_len),
        Some(Format::Pxa) => pxa::decompress(input, max_len),
        None => {
            let text = &input[..HEADERLESS_MAX.min(max_len).min(input.len())];
            let end = text.iter().position(|&b| b == 0).unwrap_or(text.len());
            Ok(text[..end].to_vec())
        }
    }
}
