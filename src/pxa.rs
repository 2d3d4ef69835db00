// src/pxa.rs
//! The bit-packed `\0pxa` codec.
//!
//! Each token is one marker bit (0 = block, 1 = literal) and a payload:
//! blocks carry a bucket-coded distance plus a 3-bit length chain, literals
//! carry a category-coded move-to-front rank. The encoder scores every
//! position's best match against the literal's bit cost and takes whichever
//! is cheaper, with a short lookahead veto on mediocre matches.
//!
//! Incompressible stretches are handled twice over. Locally, the encoder
//! audits its output in ~32-byte windows: a window whose compressed bits
//! exceed its verbatim cost is rewound and rewritten as a raw passage
//! (block marker + the offset sentinel + bytes + zero terminator), with the
//! literal model restored to its pre-window state so raw bytes never
//! perturb it. Globally, a result that still exceeds the input is discarded
//! for the input bytes themselves, the same policy as the legacy codec.

use crate::bits::{BitReader, BitWriter, Checkpoint};
use crate::chain::{
    self, BLOCK_LEN_CHAIN_BITS, CHAIN_MAX_BITS, RAW_SENTINEL_BITS,
};
use crate::error::CodecError;
use crate::hashchain::{HashIndex, Match, MIN_BLOCK_LEN};
use crate::mtf::{self, MtfAlphabet};

pub const MAGIC: [u8; 4] = [0, b'p', b'x', b'a'];

/// Output span per raw-fallback audit window.
const RAW_WINDOW: usize = 32;
/// Extra slack demanded of the very first window, covering the stream
/// header the window cannot amortise yet.
const FIRST_WINDOW_MARGIN_BITS: usize = 8;
/// A match scoring at least this is taken without lookahead.
const GOOD_SCORE: i32 = 128;

/// Bits a fresh raw passage costs on top of its bytes: marker bit, bucket
/// prefix, 15-bit sentinel, zero terminator.
const RAW_PASSAGE_OVERHEAD_BITS: usize = 2 + RAW_SENTINEL_BITS as usize + 8;

fn raw_cost_bits(window_len: usize, merging: bool) -> usize {
    // merging reuses the previous passage's header and terminator slot
    if merging {
        window_len * 8
    } else {
        RAW_PASSAGE_OVERHEAD_BITS + window_len * 8
    }
}

/// Compresses `input` into a self-describing `\0pxa` stream. Infallible;
/// empty input produces the 8-byte header-only stream, incompressible
/// input comes back verbatim (headerless).
pub fn compress(input: &[u8]) -> Vec<u8> {
    debug_assert!(input.len() <= 0x10000);
    let len = input.len();

    let mut w = BitWriter::new();
    for &b in &MAGIC {
        w.put_val(b as u32, 8);
    }
    w.put_val((len >> 8) as u32 & 0xff, 8);
    w.put_val(len as u32 & 0xff, 8);
    // compressed size, backpatched once known
    w.put_val(0, 8);
    w.put_val(0, 8);

    if len == 0 {
        w.patch_byte(7, 8);
        return w.into_bytes();
    }

    let index = HashIndex::build(input);
    let mut alphabet = MtfAlphabet::new();

    let mut pos = 0usize;
    let mut window_start = 0usize;
    let mut window_ckpt = w.checkpoint();
    let mut window_alphabet = alphabet.clone();
    let mut first_window = true;
    // sits just before the previous raw passage's terminator while the
    // passage is still extendable
    let mut raw_tail: Option<Checkpoint> = None;

    let mut blocks = 0u32;
    let mut literals = 0u32;
    let mut raw_windows = 0u32;

    while pos < len {
        let rank = alphabet.rank_of(input[pos]);
        let literal_score = 256 / mtf::literal_cost_bits(rank) as i32;

        let mut chosen: Option<Match> = match index.best_match(input, pos) {
            Some(m) if m.len >= MIN_BLOCK_LEN && m.score > literal_score => Some(m),
            _ => None,
        };

        // a mediocre match may shadow a much better one starting within the
        // next two bytes; emit a literal now and let that one win instead
        if let Some(m) = chosen {
            if m.score < GOOD_SCORE {
                for step in 1..3 {
                    if pos + step >= len {
                        break;
                    }
                    if let Some(next) = index.best_match(input, pos + step) {
                        if next.score > m.score * 6 / 5 {
                            chosen = None;
                            break;
                        }
                    }
                }
            }
        }

        match chosen {
            Some(m) => {
                w.put_bit(false);
                chain::put_num(&mut w, (m.offset - 1) as u32);
                chain::put_chain(
                    &mut w,
                    (m.len - MIN_BLOCK_LEN) as u32,
                    BLOCK_LEN_CHAIN_BITS,
                    CHAIN_MAX_BITS,
                );
                pos += m.len;
                blocks += 1;
            }
            None => {
                w.put_bit(true);
                mtf::put_rank(&mut w, rank);
                alphabet.promote(rank);
                pos += 1;
                literals += 1;
            }
        }

        if pos - window_start >= RAW_WINDOW || pos == len {
            let window = &input[window_start..pos];
            let spent = w.bit_pos() - window_ckpt.bit_pos();
            let mut verbatim = raw_cost_bits(window.len(), raw_tail.is_some());
            if first_window {
                verbatim += FIRST_WINDOW_MARGIN_BITS;
            }

            // the zero byte terminates a raw passage, so a window holding
            // one can never be stored raw
            if spent > verbatim && !window.contains(&0) {
                match raw_tail {
                    Some(tail) => w.rollback(tail),
                    None => {
                        w.rollback(window_ckpt);
                        w.put_bit(false);
                        chain::put_raw_marker(&mut w);
                    }
                }
                for &b in window {
                    w.put_val(b as u32, 8);
                }
                raw_tail = Some(w.checkpoint());
                w.put_val(0, 8);
                alphabet = window_alphabet.clone();
                raw_windows += 1;
            } else {
                raw_tail = None;
            }

            window_start = pos;
            window_ckpt = w.checkpoint();
            window_alphabet = alphabet.clone();
            first_window = false;
        }
    }

    let total = w.byte_len();
    w.patch_byte(6, (total >> 8) as u8);
    w.patch_byte(7, total as u8);
    tracing::debug!(blocks, literals, raw_windows, input = len, output = total, "pxa encode");

    if total >= len {
        tracing::debug!(input = len, encoded = total, "pxa verbatim fallback");
        return input.to_vec();
    }
    w.into_bytes()
}

/// Decompresses a `\0pxa` stream. Stops at the declared lengths or the end
/// of the source, whichever comes first; corrupt ranks and offsets abort.
pub fn decompress(input: &[u8], max_len: usize) -> Result<Vec<u8>, CodecError> {
    if input.len() < 8 {
        return Ok(Vec::new());
    }
    let mut r = BitReader::new(input);
    let mut header = [0u32; 8];
    for h in header.iter_mut() {
        *h = r.get_val(8);
    }
    let raw_len = (header[4] << 8 | header[5]) as usize;
    let comp_len = (header[6] << 8 | header[7]) as usize;

    if raw_len > max_len {
        return Err(CodecError::CorruptLength {
            declared: raw_len,
            capacity: max_len,
        });
    }

    let mut alphabet = MtfAlphabet::new();
    let mut out = Vec::with_capacity(raw_len);

    while r.byte_pos() < comp_len && out.len() < raw_len {
        if !r.get_bit() {
            let (val, bits) = chain::get_num_raw(&mut r);
            if bits == RAW_SENTINEL_BITS && val == 0 {
                // verbatim passage, zero-terminated
                while out.len() < raw_len && r.byte_pos() < comp_len {
                    let b = r.get_val(8);
                    if b == 0 {
                        break;
                    }
                    out.push(b as u8);
                }
            } else {
                let offset = val as usize + 1;
                let block_len =
                    chain::get_chain(&mut r, BLOCK_LEN_CHAIN_BITS, CHAIN_MAX_BITS) as usize
                        + MIN_BLOCK_LEN;
                if offset > out.len() {
                    return Err(CodecError::CorruptOffset {
                        offset,
                        produced: out.len(),
                    });
                }
                // byte by byte: the source range may overlap the bytes this
                // same block is producing
                for _ in 0..block_len {
                    if out.len() >= raw_len {
                        break;
                    }
                    let b = out[out.len() - offset];
                    out.push(b);
                }
            }
        } else {
            let rank = mtf::get_rank(&mut r);
            if rank > 255 {
                return Err(CodecError::CorruptLiteralRank(rank));
            }
            let c = alphabet.byte_at(rank);
            out.push(c);
            alphabet.promote(rank);
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CODE_MAX: usize = 0x10000;

    fn lcg_bytes(n: usize, mut state: u32) -> Vec<u8> {
        // deterministic pseudo-random bytes, never zero
        (0..n)
            .map(|_| {
                state = state.wrapping_mul(1664525).wrapping_add(1013904223);
                ((state >> 24) as u8) | 1
            })
            .collect()
    }

    #[test]
    fn empty_input_is_a_header_only_stream() {
        let packed = compress(b"");
        assert_eq!(packed.len(), 8);
        assert_eq!(&packed[..4], &MAGIC);
        assert_eq!(packed[6], 0);
        assert_eq!(packed[7], 8);
        assert_eq!(decompress(&packed, CODE_MAX).unwrap(), b"");
    }

    #[test]
    fn long_run_compresses_dramatically() {
        let src = vec![b'a'; 1000];
        let packed = compress(&src);
        assert_eq!(&packed[..4], &MAGIC);
        assert!(packed.len() < 100, "got {} bytes", packed.len());
        assert_eq!(decompress(&packed, CODE_MAX).unwrap(), src);
    }

    #[test]
    fn self_overlapping_period_two_repeat() {
        let src: Vec<u8> = b"ab".repeat(300);
        let packed = compress(&src);
        assert!(packed.len() < src.len() / 4);
        assert_eq!(decompress(&packed, CODE_MAX).unwrap(), src);
    }

    #[test]
    fn source_text_roundtrips() {
        let src: Vec<u8> = b"function _draw()\n cls()\n for i=1,8 do\n  circfill(64,64,i*8,i)\n end\nend\n"
            .repeat(12);
        let packed = compress(&src);
        assert!(packed.len() < src.len() / 2);
        assert_eq!(decompress(&packed, CODE_MAX).unwrap(), src);
    }

    #[test]
    fn incompressible_input_engages_verbatim_fallback() {
        let src = lcg_bytes(512, 0xdead_beef);
        let packed = compress(&src);
        assert_eq!(packed, src);
        assert!(packed.len() <= src.len() + 8);
    }

    #[test]
    fn mixed_input_exercises_raw_passages() {
        // compressible head and tail around a pseudo-random middle: the
        // middle windows are rewritten raw, the stream stays smaller than
        // the input, and the literal model survives the rewinds
        let mut src: Vec<u8> = b"local t={} for i=1,64 do t[i]=i end ".repeat(8);
        src.extend(lcg_bytes(160, 0x1234_5678));
        src.extend(b"for i=1,64 do print(t[i]) end ".repeat(8));
        let packed = compress(&src);
        assert!(packed.len() < src.len(), "{} vs {}", packed.len(), src.len());
        assert_eq!(&packed[..4], &MAGIC);
        assert_eq!(decompress(&packed, CODE_MAX).unwrap(), src);
    }

    #[test]
    fn tail_match_with_lookahead_roundtrips() {
        // minimum-length mediocre match in the last three bytes: the
        // lookahead probes the final positions without running past them
        let mut src = b"hello world, ".repeat(6);
        src.extend_from_slice(b"uvw qrs uvw");
        let packed = compress(&src);
        assert_eq!(&packed[..4], &MAGIC);
        assert_eq!(decompress(&packed, CODE_MAX).unwrap(), src);
    }

    #[test]
    fn hand_built_raw_passage_decodes() {
        let mut w = BitWriter::new();
        for &b in &MAGIC {
            w.put_val(b as u32, 8);
        }
        w.put_val(0, 8);
        w.put_val(2, 8); // raw_len 2
        w.put_val(0, 8);
        w.put_val(32, 8); // comp_len, generous
        w.put_bit(false);
        chain::put_raw_marker(&mut w);
        w.put_val(b'h' as u32, 8);
        w.put_val(b'i' as u32, 8);
        w.put_val(0, 8);
        let stream = w.into_bytes();
        assert_eq!(decompress(&stream, CODE_MAX).unwrap(), b"hi");
    }

    #[test]
    fn literal_rank_past_alphabet_aborts() {
        let mut w = BitWriter::new();
        for &b in &MAGIC {
            w.put_val(b as u32, 8);
        }
        w.put_val(0, 8);
        w.put_val(2, 8);
        w.put_val(0, 8);
        w.put_val(32, 8);
        w.put_bit(true); // literal
        for _ in 0..4 {
            w.put_bit(true); // four category up-bits: base rank 240
        }
        w.put_bit(false);
        w.put_val(0xff, 8); // 240 + 255 = 495
        let stream = w.into_bytes();
        assert_eq!(
            decompress(&stream, CODE_MAX).unwrap_err(),
            CodecError::CorruptLiteralRank(495)
        );
    }

    #[test]
    fn block_before_any_output_aborts() {
        let mut w = BitWriter::new();
        for &b in &MAGIC {
            w.put_val(b as u32, 8);
        }
        w.put_val(0, 8);
        w.put_val(4, 8);
        w.put_val(0, 8);
        w.put_val(32, 8);
        w.put_bit(false);
        chain::put_num(&mut w, 5); // offset 6 with zero bytes produced
        chain::put_chain(&mut w, 0, BLOCK_LEN_CHAIN_BITS, CHAIN_MAX_BITS);
        let stream = w.into_bytes();
        assert!(matches!(
            decompress(&stream, CODE_MAX).unwrap_err(),
            CodecError::CorruptOffset { offset: 6, .. }
        ));
    }

    #[test]
    fn declared_length_beyond_capacity_is_rejected() {
        let packed = compress(&vec![b'x'; 600]);
        let err = decompress(&packed, 100).unwrap_err();
        assert_eq!(
            err,
            CodecError::CorruptLength {
                declared: 600,
                capacity: 100
            }
        );
    }

    #[test]
    fn truncation_never_panics() {
        let src: Vec<u8> = b"print('hello') print('hello') print('hello')".to_vec();
        let packed = compress(&src);
        for cut in 0..packed.len() {
            let _ = decompress(&packed[..cut], CODE_MAX);
        }
    }

    #[test]
    fn fallback_bound_holds_across_shapes() {
        for src in [
            Vec::new(),
            vec![0u8; 40],
            lcg_bytes(64, 1),
            b"abc".repeat(50),
            lcg_bytes(300, 99),
        ] {
            let packed = compress(&src);
            assert!(
                packed.len() <= src.len() + 8,
                "len {} for input {}",
                packed.len(),
                src.len()
            );
        }
    }
}
