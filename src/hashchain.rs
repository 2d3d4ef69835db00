// src/hashchain.rs
//! Hash-indexed match finder for the pxa encoder.
//!
//! Every position (bar the last two) is bucketed by a hash of its 3-byte
//! window before encoding starts; buckets hold positions in occurrence
//! order. The search walks a bucket, extends each candidate — allowed to
//! run past the current position by cycling through the match's own period,
//! which is what lets a 2-byte pattern encode an arbitrarily long run —
//! and keeps the candidate with the best bits-per-byte score.

use crate::chain::BLOCK_DIST_BITS;

pub const HASH_BUCKETS: usize = 4096;
/// Offsets are stored in a 15-bit bucket at most.
pub const MAX_HISTORY: usize = 32767;
/// Blocks shorter than this never beat their own overhead.
pub const MIN_BLOCK_LEN: usize = 3;

#[inline]
fn mini_hash(d: &[u8], i: usize) -> usize {
    (d[i] as usize * 7 + d[i + 1] as usize * 1503 + d[i + 2] as usize * 51717)
        & (HASH_BUCKETS - 1)
}

/// A scored match candidate. `len` may be below [`MIN_BLOCK_LEN`]; callers
/// apply the acceptance threshold, the score is still wanted for lookahead
/// comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match {
    pub offset: usize,
    pub len: usize,
    /// Fixed-point bits-per-byte ratio, `len * 256 / bit_cost`; higher
    /// means the block packs more input per stream bit.
    pub score: i32,
}

/// Positional index over one input buffer. Call-scoped: built once per
/// compression call and dropped with it.
pub struct HashIndex {
    buckets: Vec<Vec<u16>>,
}

impl HashIndex {
    /// Full pre-scan of `input` (positions fit u16: inputs cap at 64 KiB).
    pub fn build(input: &[u8]) -> Self {
        let mut buckets = vec![Vec::new(); HASH_BUCKETS];
        for i in 0..input.len().saturating_sub(2) {
            buckets[mini_hash(input, i)].push(i as u16);
        }
        Self { buckets }
    }

    /// Best match starting at `pos`, or None when fewer than
    /// [`MIN_BLOCK_LEN`] bytes remain or the bucket holds no prior position.
    pub fn best_match(&self, input: &[u8], pos: usize) -> Option<Match> {
        let max_len = input.len().saturating_sub(pos);
        if max_len < MIN_BLOCK_LEN {
            return None;
        }

        let mut best: Option<Match> = None;
        for &cand in &self.buckets[mini_hash(input, pos)] {
            let p0 = cand as usize;
            if p0 >= pos {
                // bucket is position-ordered; nothing valid remains
                break;
            }
            if pos - p0 > MAX_HISTORY {
                // stale head entries; later ones may still be in range
                continue;
            }

            let period = pos - p0;
            let mut i = 0;
            while i < max_len && p0 + i < pos && input[p0 + i] == input[pos + i] {
                i += 1;
            }
            // past the current position the match reads its own output,
            // resolved modulo the repeat period
            while i < max_len && p0 + i >= pos && input[p0 + i % period] == input[pos + i] {
                i += 1;
            }

            let score = (i * 256) as i32 / block_cost_bits(period) as i32;
            if best.map_or(true, |b| score > b.score) {
                best = Some(Match {
                    offset: period,
                    len: i,
                    score,
                });
            }
        }
        best
    }
}

/// Bit cost of a block at `dist`: bucket prefix + distance bits, a flat 3
/// for the length chain, and the block/literal marker bit.
pub fn block_cost_bits(dist: usize) -> u32 {
    let mut links = 0u32;
    let mut d = dist;
    while d > 0 {
        links += 1;
        d >>= BLOCK_DIST_BITS;
    }
    links.min(2) + links * BLOCK_DIST_BITS + 3 + 1
}
