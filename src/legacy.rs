// src/legacy.rs
//! The byte-oriented `:c:` codec.
//!
//! Token stream over a fixed 60-entry literal table: a byte below 60 is a
//! literal index (0 escapes to a raw byte), anything else opens a 2-byte
//! block token packing offset and length into nibbles. Match search is a
//! brute-force backward scan; history and length caps are chosen so both
//! token bytes stay in range.

use crate::error::CodecError;
use crate::shim;

pub const MAGIC: [u8; 4] = [b':', b'c', b':', 0];

const LITERALS: usize = 60;
/// Index 0 is the escape, so its table entry (`^`) is a dummy that is never
/// produced by lookup; everything else maps common cart source characters
/// to one cheap byte.
const LITERAL_TABLE: &[u8; 60] =
    b"^\n 0123456789abcdefghijklmnopqrstuvwxyz!#%(){}[]<>+=/*:;.,~_";

/// Length field is 4 bits storing len-2.
const MAX_BLOCK_LEN: usize = 17;
/// Offset field is (token - 60) * 16 + nibble, so the first token byte
/// caps history at (255-60)*16.
const MAX_HISTORY: usize = (255 - LITERALS) * 16;

fn literal_index() -> [u8; 256] {
    let mut idx = [0u8; 256];
    for i in 1..LITERALS {
        idx[LITERAL_TABLE[i] as usize] = i as u8;
    }
    idx
}

/// Backward brute-force scan for the longest match at `pos`. Matches never
/// extend past `pos`, so legacy blocks cannot self-overlap.
fn find_block(dat: &[u8], pos: usize) -> (usize, usize) {
    let max_len = MAX_BLOCK_LEN.min(dat.len() - pos);
    let max_hist = MAX_HISTORY.min(pos);

    let mut best_len = 0;
    let mut best_off = 0;
    for i in pos - max_hist..pos {
        let mut j = 0;
        while j < max_len && i + j < pos && dat[i + j] == dat[pos + j] {
            j += 1;
        }
        if j > best_len {
            best_len = j;
            best_off = pos - i;
        }
    }
    (best_len, best_off)
}

/// Compresses `input` into a self-describing `:c:` stream. When the token
/// stream would not beat the input size, the input bytes are returned
/// unmodified (headerless) instead — callers learn which path ran from the
/// returned length and leading magic.
pub fn compress(input: &[u8]) -> Vec<u8> {
    debug_assert!(input.len() <= 0x10000);
    let idx = literal_index();
    let len = input.len();

    let mut out = Vec::with_capacity(len + 8);
    out.extend_from_slice(&MAGIC);
    out.push((len >> 8) as u8);
    out.push(len as u8);
    // compressed size, backpatched below
    out.push(0);
    out.push(0);

    let mut blocks = 0u32;
    let mut literals = 0u32;
    let mut pos = 0;
    while pos < len {
        let (block_len, block_off) = find_block(input, pos);

        // 3 performs better than 2: after one literal the next byte is
        // often the start of a block anyway
        if block_len >= 3 {
            out.push((block_off / 16 + LITERALS) as u8);
            out.push((block_off % 16 + (block_len - 2) * 16) as u8);
            pos += block_len;
            blocks += 1;
        } else {
            let i = idx[input[pos] as usize];
            out.push(i);
            if i == 0 {
                out.push(input[pos]);
            }
            pos += 1;
            literals += 1;
        }
    }

    if len > 0 && out.len() >= len {
        tracing::debug!(input = len, encoded = out.len(), "legacy verbatim fallback");
        return input.to_vec();
    }

    let total = out.len();
    out[6] = (total >> 8) as u8;
    out[7] = total as u8;
    tracing::debug!(blocks, literals, input = len, output = total, "legacy encode");
    out
}

/// Decompresses a `:c:` stream. Truncated input yields truncated output;
/// a declared length beyond `max_len` is rejected. The compatibility
/// suffix, when present, is stripped from the result.
pub fn decompress(input: &[u8], max_len: usize) -> Result<Vec<u8>, CodecError> {
    if input.len() < 8 {
        return Ok(Vec::new());
    }
    let declared = (input[4] as usize) << 8 | input[5] as usize;
    if declared > max_len {
        return Err(CodecError::CorruptLength {
            declared,
            capacity: max_len,
        });
    }

    let mut out = Vec::with_capacity(declared);
    let mut src = 8;
    while out.len() < declared && src < input.len() {
        let val = input[src] as usize;
        src += 1;

        if val < LITERALS {
            if val == 0 {
                if src >= input.len() {
                    break;
                }
                out.push(input[src]);
                src += 1;
            } else {
                out.push(LITERAL_TABLE[val]);
            }
        } else {
            if src >= input.len() {
                break;
            }
            let second = input[src] as usize;
            src += 1;
            let offset = (val - LITERALS) * 16 + second % 16;
            let block_len = second / 16 + 2;
            if offset == 0 || offset > out.len() {
                return Err(CodecError::CorruptOffset {
                    offset,
                    produced: out.len(),
                });
            }
            // byte-by-byte so foreign streams with overlapping ranges still
            // decode the run semantics
            for _ in 0..block_len {
                if out.len() >= declared {
                    break;
                }
                let b = out[out.len() - offset];
                out.push(b);
            }
        }
    }

    Ok(shim::strip(out))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_cart_source() {
        let src = b"for i=1,10 do\n print(i)\nend\nfor i=1,10 do\n print(i*i)\nend\n";
        let packed = compress(src);
        assert_eq!(&packed[..4], &MAGIC);
        assert!(packed.len() < src.len());
        let got = decompress(&packed, 0x10000).unwrap();
        assert_eq!(got, src);
    }

    #[test]
    fn common_literal_is_one_byte_rare_is_two() {
        // 'a'..'c' are in the table, '@' is not; repeats keep the stream
        // under the input size so the fallback stays out of the way
        let src: Vec<u8> = b"abc@def ".repeat(5);
        let packed = compress(&src);
        assert_eq!(&packed[..4], &MAGIC);
        let body = &packed[8..];
        let idx = literal_index();
        assert_eq!(body[0], idx[b'a' as usize]);
        assert_eq!(body[1], idx[b'b' as usize]);
        assert_eq!(body[2], idx[b'c' as usize]);
        assert_eq!(body[3], 0); // escape
        assert_eq!(body[4], b'@');
        assert_eq!(decompress(&packed, 0x10000).unwrap(), src);
    }

    #[test]
    fn block_token_layout() {
        // three copies of a 10-byte run: ten literals then two blocks of
        // offset 10, length 10
        let src: Vec<u8> = b"abcdefghij".repeat(3);
        let packed = compress(&src);
        let body = &packed[8..];
        assert_eq!(body.len(), 10 + 2 + 2);
        assert_eq!(body[10] as usize, 10 / 16 + 60);
        assert_eq!(body[11] as usize, 10 % 16 + (10 - 2) * 16);
        // the backward scan keeps the first (oldest) best candidate, so the
        // second block points all the way back to position 0
        assert_eq!(body[12] as usize, 20 / 16 + 60);
        assert_eq!(body[13] as usize, 20 % 16 + (10 - 2) * 16);
        assert_eq!(decompress(&packed, 0x10000).unwrap(), src);
    }

    #[test]
    fn incompressible_input_falls_back_to_verbatim() {
        let data: Vec<u8> = (0..=255u8).collect();
        let packed = compress(&data);
        assert_eq!(packed, data);
    }

    #[test]
    fn declared_length_beyond_capacity_is_rejected() {
        let packed = compress(b"hello world hello world hello world");
        let err = decompress(&packed, 4).unwrap_err();
        assert_eq!(
            err,
            CodecError::CorruptLength {
                declared: 35,
                capacity: 4
            }
        );
    }

    #[test]
    fn truncated_stream_stops_short() {
        let src = b"the quick brown fox the quick brown fox";
        let packed = compress(src);
        let cut = &packed[..packed.len() - 3];
        let got = decompress(cut, 0x10000).unwrap();
        assert!(got.len() < src.len());
        assert_eq!(&src[..got.len()], &got[..]);
    }

    #[test]
    fn foreign_overlapping_block_decodes_as_run() {
        // hand-built stream: literal 'a' twice then a block offset 1 len 6;
        // our encoder never emits this, the decoder must still run-copy it
        let a = literal_index()[b'a' as usize];
        let stream = [
            b':', b'c', b':', 0, 0, 8, 0, 0, //
            a, a, 60, 1 + (6 - 2) * 16,
        ];
        let got = decompress(&stream, 0x10000).unwrap();
        assert_eq!(got, b"aaaaaaaa");
    }

    #[test]
    fn corrupt_offset_is_rejected() {
        // block referencing history before the start of output
        let stream = [b':', b'c', b':', 0, 0, 8, 0, 0, 61, 0];
        let err = decompress(&stream, 0x10000).unwrap_err();
        assert!(matches!(err, CodecError::CorruptOffset { .. }));
    }

    #[test]
    fn injected_cart_roundtrips_to_original_text() {
        let src = b"t=0\nfunction _update60()t+=1 end\n";
        let staged = shim::inject(src);
        assert!(staged.len() > src.len());
        let packed = compress(&staged);
        let got = decompress(&packed, 0x10000).unwrap();
        assert_eq!(got, src);
    }

    #[test]
    fn empty_input_yields_header_only_stream() {
        let packed = compress(b"");
        assert_eq!(packed.len(), 8);
        assert_eq!(decompress(&packed, 0x10000).unwrap(), b"");
    }
}
