// src/chain.rs
//! Variable-length integer codes for the pxa stream.
//!
//! Two schemes live here. Chain coding writes an unbounded value as a run
//! of fixed-width links where a saturated link means "more follows"; it
//! carries block lengths past the 3-byte minimum. Number coding writes a
//! block distance as a 1/2-bit bucket prefix choosing 5, 10 or 15 value
//! bits, biasing nearby offsets toward the short encodings.

use crate::bits::{BitReader, BitWriter};

/// Link width for block-length chains.
pub const BLOCK_LEN_CHAIN_BITS: u32 = 3;
/// Bucket step for block distances.
pub const BLOCK_DIST_BITS: u32 = 5;
/// Widest distance bucket. A zero value at this width never encodes a real
/// offset (offsets are stored minus one and always use the smallest bucket
/// that fits), so the pattern is claimed as the raw-block sentinel.
pub const RAW_SENTINEL_BITS: u32 = 3 * BLOCK_DIST_BITS;
/// Effectively-unbounded chain cap for block lengths.
pub const CHAIN_MAX_BITS: u32 = 100_000;

/// Writes `val` as `link_bits`-wide links; any link below the saturated
/// value terminates the chain. Once `max_bits` is hit the remainder is
/// implicitly zero. Returns the bits written.
pub fn put_chain(w: &mut BitWriter, mut val: u32, link_bits: u32, max_bits: u32) -> u32 {
    let max_link = (1 << link_bits) - 1;
    let mut written = 0;
    let mut vv = max_link;

    while vv == max_link {
        vv = val.min(max_link);
        w.put_val(vv, link_bits);
        written += link_bits;
        val -= vv;
        if written >= max_bits {
            return written;
        }
    }
    written
}

pub fn get_chain(r: &mut BitReader, link_bits: u32, max_bits: u32) -> u32 {
    let max_link = (1 << link_bits) - 1;
    let mut val = 0;
    let mut vv = max_link;
    let mut read = 0;

    while vv == max_link {
        vv = r.get_val(link_bits);
        read += link_bits;
        val += vv;
        if read >= max_bits {
            return val;
        }
    }
    val
}

/// Writes a distance value with its bucket prefix. `val` must fit 15 bits.
pub fn put_num(w: &mut BitWriter, val: u32) {
    debug_assert!(val < 1 << RAW_SENTINEL_BITS);
    let mut bits = BLOCK_DIST_BITS;
    while (1 << bits) <= val {
        bits += BLOCK_DIST_BITS;
    }
    put_chain(w, 3 - bits / BLOCK_DIST_BITS, 1, 2);
    w.put_val(val, bits);
}

/// Writes the raw-block escape: the widest bucket carrying value zero.
pub fn put_raw_marker(w: &mut BitWriter) {
    put_chain(w, 0, 1, 2);
    w.put_val(0, RAW_SENTINEL_BITS);
}

/// Reads a distance value together with the bucket width it used, so the
/// caller can recognise the raw-block sentinel (zero at the widest bucket).
pub fn get_num_raw(r: &mut BitReader) -> (u32, u32) {
    let bits = (3 - get_chain(r, 1, 2)) * BLOCK_DIST_BITS;
    (r.get_val(bits), bits)
}
