// src/bits.rs
//! LSB-first bit cursors over byte buffers.
//!
//! The writer sets one bit at a time (read-modify-write, never a whole-byte
//! store), so rolling back into the middle of a byte and re-writing it is
//! safe — the raw-block fallback in the pxa encoder depends on this.
//! Neither cursor bounds-checks on behalf of the caller beyond refusing to
//! read past the end: reads past the buffer yield zero bits, which keeps
//! decoding total on truncated input.

/// A saved writer position. Rolling back to it discards everything written
/// after the checkpoint, including partial bits of the current byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint {
    bits: usize,
}

impl Checkpoint {
    pub fn bit_pos(&self) -> usize {
        self.bits
    }
}

/// Bit-granular writer over a growable byte buffer.
#[derive(Debug, Default)]
pub struct BitWriter {
    buf: Vec<u8>,
    bits: usize,
}

impl BitWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_bit(&mut self, v: bool) {
        if self.bits % 8 == 0 {
            self.buf.push(0);
        }
        if v {
            self.buf[self.bits / 8] |= 1 << (self.bits % 8);
        }
        self.bits += 1;
    }

    /// Writes the low `n` bits of `val`, least significant first.
    pub fn put_val(&mut self, val: u32, n: u32) {
        for i in 0..n {
            self.put_bit(val & (1 << i) != 0);
        }
    }

    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint { bits: self.bits }
    }

    /// Rewinds to `c`, clearing any already-set bits past it so that the
    /// next `put_bit` calls land on zeroed positions.
    pub fn rollback(&mut self, c: Checkpoint) {
        debug_assert!(c.bits <= self.bits);
        self.bits = c.bits;
        self.buf.truncate((c.bits + 7) / 8);
        if c.bits % 8 != 0 {
            self.buf[c.bits / 8] &= (1u8 << (c.bits % 8)) - 1;
        }
    }

    pub fn bit_pos(&self) -> usize {
        self.bits
    }

    /// Bytes the stream occupies so far, final partial byte included.
    pub fn byte_len(&self) -> usize {
        self.buf.len()
    }

    /// Overwrites a byte-aligned position already written. Used to backpatch
    /// the compressed-length header field once the total is known.
    pub fn patch_byte(&mut self, index: usize, value: u8) {
        self.buf[index] = value;
    }

    /// Finishes the stream. The trailing partial byte is zero-padded by
    /// construction.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

/// Bit-granular reader over a byte slice. Past-the-end reads return zeros.
#[derive(Debug)]
pub struct BitReader<'a> {
    buf: &'a [u8],
    bits: usize,
}

impl<'a> BitReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, bits: 0 }
    }

    pub fn get_bit(&mut self) -> bool {
        let i = self.bits / 8;
        let v = if i < self.buf.len() {
            self.buf[i] >> (self.bits % 8) & 1
        } else {
            0
        };
        self.bits += 1;
        v == 1
    }

    /// Reads an `n`-bit value, least significant bit first.
    pub fn get_val(&mut self, n: u32) -> u32 {
        let mut val = 0;
        for i in 0..n {
            if self.get_bit() {
                val |= 1 << i;
            }
        }
        val
    }

    /// Index of the byte the cursor currently sits in.
    pub fn byte_pos(&self) -> usize {
        self.bits / 8
    }
}
