// src/mtf.rs
//! Adaptive literal model: a move-to-front permutation of the 256 byte
//! values plus the category code that writes a rank in 4 base bits, growing
//! one bit per unary up-marker. A byte just emitted is promoted to rank 0,
//! so recently used characters stay in the cheap 4–5 bit range.

use crate::bits::{BitReader, BitWriter};
use crate::chain::put_chain;

/// Base width of the rank category code.
pub const CATEGORY_BASE_BITS: u32 = 4;

/// Rank→byte permutation and its inverse. Always a bijection on 0..=255;
/// `promote` is the only mutation path.
#[derive(Clone)]
pub struct MtfAlphabet {
    order: [u8; 256],
    rank: [u8; 256],
}

impl Default for MtfAlphabet {
    fn default() -> Self {
        Self::new()
    }
}

impl MtfAlphabet {
    /// Identity start state. The initial ordering makes little difference to
    /// ratio; what matters is that encoder and decoder agree.
    pub fn new() -> Self {
        let mut order = [0u8; 256];
        let mut rank = [0u8; 256];
        for i in 0..256 {
            order[i] = i as u8;
            rank[i] = i as u8;
        }
        Self { order, rank }
    }

    pub fn rank_of(&self, byte: u8) -> usize {
        self.rank[byte as usize] as usize
    }

    pub fn byte_at(&self, rank: usize) -> u8 {
        self.order[rank]
    }

    /// Moves the byte at `rank` to the front, shifting everything between
    /// down one place.
    pub fn promote(&mut self, rank: usize) {
        if rank == 0 {
            return;
        }
        let c = self.order[rank];
        self.order.copy_within(0..rank, 1);
        for i in 1..=rank {
            self.rank[self.order[i] as usize] = i as u8;
        }
        self.order[0] = c;
        self.rank[c as usize] = 0;
    }
}

/// Bit cost of a literal at `rank`: marker bit + unary category prefix
/// (terminator included) + the category's value bits.
pub fn literal_cost_bits(rank: usize) -> u32 {
    let (cat_bits, _) = category_of(rank);
    2 + (cat_bits - CATEGORY_BASE_BITS) + cat_bits
}

fn category_of(rank: usize) -> (u32, u32) {
    let rank = rank as u32;
    let mut cat_bits = CATEGORY_BASE_BITS;
    let mut cat_max = 1u32 << cat_bits;
    let mut val = rank;
    while rank >= cat_max {
        val -= 1 << cat_bits;
        cat_bits += 1;
        cat_max += 1 << cat_bits;
    }
    (cat_bits, val)
}

/// Writes the category code for `rank` (marker bit not included).
pub fn put_rank(w: &mut BitWriter, rank: usize) {
    debug_assert!(rank < 256);
    let (cat_bits, val) = category_of(rank);
    put_chain(w, cat_bits - CATEGORY_BASE_BITS, 1, 16);
    w.put_val(val, cat_bits);
}

/// Reads a category-coded rank. Values above 255 signal corruption and are
/// returned as-is for the caller to reject.
pub fn get_rank(r: &mut BitReader) -> usize {
    let mut rank = 0usize;
    let mut extra = 0u32;
    let mut safety = 0;
    while r.get_bit() {
        if safety >= 16 {
            break;
        }
        rank += 1usize << (CATEGORY_BASE_BITS + extra);
        extra += 1;
        safety += 1;
    }
    rank + r.get_val(CATEGORY_BASE_BITS + extra) as usize
}
