// src/lib.rs
//! cartpak — compressors for the 64 KiB code section of cartridge images.
//!
//! Two formats share one container layout (4-byte magic, big-endian
//! uncompressed and compressed lengths, body):
//!
//! * `:c:` — the legacy byte-oriented stream: a 60-entry literal table and
//!   2-byte block tokens found by brute-force history search.
//! * `\0pxa` — the bit-packed stream: hash-indexed match finding scored by
//!   bit cost, move-to-front adaptive literals, chain/bucket integer codes
//!   and a raw-passage escape for incompressible stretches.
//!
//! Compression never fails — both encoders fall back to storing the input
//! verbatim rather than expanding it. Decompression is total over
//! arbitrary bytes: it never reads or writes out of bounds, and malformed
//! input yields an error or truncated output, never a panic.

pub mod bits;
pub mod chain;
pub mod error;
pub mod format;
pub mod hashchain;
pub mod legacy;
pub mod mtf;
pub mod pxa;
pub mod shim;

pub use error::CodecError;
pub use format::{detect, Format, CODE_MAX};

/// Compresses `input` (at most 64 KiB) with the chosen format.
pub fn compress(input: &[u8], format: Format) -> Vec<u8> {
    match format {
        Format::Legacy => legacy::compress(input),
        Format::Pxa => pxa::compress(input),
    }
}

/// Decompresses any code-section payload, routing by magic; headerless
/// carts pass through as plain text.
pub fn decompress(input: &[u8]) -> Result<Vec<u8>, CodecError> {
    format::decompress(input, CODE_MAX)
}
