/*
 * This file is a part of cuki
 * cuki is a free and open-source working-set-size estimator built around
 * a clock-based counting cuckoo filter.
 *
 * Copyright (c) 2026, cuki contributors
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU Affero General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 * GNU Affero General Public License for more details.
 *
 * You should have received a copy of the GNU Affero General Public License
 * along with this program. If not, see <https://www.gnu.org/licenses/>.
 *
*/

//! Fixed-capacity packed-bit storage.
//!
//! Backed by a slice of `AtomicU64` words rather than plain `u64`s: the
//! `BucketTable` above us locks at bucket granularity, but a bucket's bit
//! range is not guaranteed to be word-aligned, so two different buckets can
//! legally share a word. Atomics give every individual word access a safe,
//! race-free path without requiring a lock inside this component itself —
//! `BitVector` performs no locking of its own, exactly as spec demands.

use std::sync::atomic::{AtomicU64, Ordering};

const WORD_BITS: usize = 64;
const ORD_LD: Ordering = Ordering::Acquire;
const ORD_ST: Ordering = Ordering::AcqRel;

#[inline(always)]
fn mask(len: u32) -> u64 {
    if len >= 64 {
        u64::MAX
    } else {
        (1u64 << len) - 1
    }
}

pub struct BitVector {
    words: Box<[AtomicU64]>,
    bits: usize,
}

impl BitVector {
    /// Allocate a vector with room for at least `bits` bits, zero-filled.
    pub fn new(bits: usize) -> Self {
        let nwords = bits.div_ceil(WORD_BITS).max(1);
        let words = (0..nwords).map(|_| AtomicU64::new(0)).collect();
        Self { words, bits }
    }

    pub fn capacity_bits(&self) -> usize {
        self.bits
    }

    fn check_range(&self, off: usize, len: u32) {
        assert!((1..=64).contains(&len), "bit range width must be in 1..=64");
        assert!(
            off + len as usize <= self.bits,
            "bit offset {off} + len {len} exceeds capacity {}",
            self.bits
        );
    }

    /// Read the `len`-bit value at `off`. `len` in `1..=64`; the read may
    /// cross at most one word boundary.
    pub fn get(&self, off: usize, len: u32) -> u64 {
        self.check_range(off, len);
        let word_idx = off / WORD_BITS;
        let bit = (off % WORD_BITS) as u32;
        let avail = WORD_BITS as u32 - bit;
        if len <= avail {
            (self.words[word_idx].load(ORD_LD) >> bit) & mask(len)
        } else {
            let low = self.words[word_idx].load(ORD_LD) >> bit;
            let high_len = len - avail;
            let high = self.words[word_idx + 1].load(ORD_LD) & mask(high_len);
            low | (high << avail)
        }
    }

    /// Write the low `len` bits of `v` at `off`; bits outside `[off, off+len)`
    /// are preserved.
    pub fn set(&self, off: usize, len: u32, v: u64) {
        self.check_range(off, len);
        let v = v & mask(len);
        let word_idx = off / WORD_BITS;
        let bit = (off % WORD_BITS) as u32;
        let avail = WORD_BITS as u32 - bit;
        if len <= avail {
            self.rmw_word(word_idx, mask(len) << bit, v << bit);
        } else {
            let high_len = len - avail;
            self.rmw_word(word_idx, mask(avail) << bit, (v & mask(avail)) << bit);
            self.rmw_word(word_idx + 1, mask(high_len), v >> avail);
        }
    }

    /// Set every bit in `[off, off+len)` to 1.
    pub fn set_range(&self, off: usize, len: usize) {
        self.fill_range(off, len, true);
    }

    /// Clear every bit in `[off, off+len)` to 0.
    pub fn clear_range(&self, off: usize, len: usize) {
        self.fill_range(off, len, false);
    }

    fn fill_range(&self, off: usize, len: usize, one: bool) {
        if len == 0 {
            return;
        }
        assert!(off + len <= self.bits, "range exceeds capacity");
        let mut done = 0usize;
        while done < len {
            let chunk = (len - done).min(64) as u32;
            let v = if one { mask(chunk) } else { 0 };
            self.set(off + done, chunk, v);
            done += chunk as usize;
        }
    }

    /// Compare-and-swap retry loop that updates only the bits selected by
    /// `field_mask` within `words[idx]`, leaving the rest untouched.
    fn rmw_word(&self, idx: usize, field_mask: u64, new_bits: u64) {
        let word = &self.words[idx];
        let mut cur = word.load(ORD_LD);
        loop {
            let next = (cur & !field_mask) | new_bits;
            match word.compare_exchange_weak(cur, next, ORD_ST, ORD_LD) {
                Ok(_) => return,
                Err(observed) => cur = observed,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn roundtrip_single_word() {
        let bv = BitVector::new(128);
        bv.set(10, 20, 0xABCDE);
        assert_eq!(bv.get(10, 20), 0xABCDE);
    }

    #[test]
    fn roundtrip_crosses_word_boundary() {
        let bv = BitVector::new(256);
        bv.set(60, 20, 0xF_FFFF);
        assert_eq!(bv.get(60, 20), 0xF_FFFF);
    }

    #[test]
    fn preserves_neighbouring_bits() {
        let bv = BitVector::new(128);
        bv.set_range(0, 128);
        bv.set(40, 8, 0);
        assert_eq!(bv.get(40, 8), 0);
        assert_eq!(bv.get(0, 40), mask(40));
        assert_eq!(bv.get(48, 64), mask(64));
    }

    #[test]
    fn random_roundtrips() {
        let mut rng = rand::thread_rng();
        let bv = BitVector::new(4096);
        for _ in 0..2000 {
            let len = rng.gen_range(1..=64u32);
            let off = rng.gen_range(0..=(4096 - len as usize));
            let v = if len == 64 {
                rng.gen::<u64>()
            } else {
                rng.gen::<u64>() & mask(len)
            };
            bv.set(off, len, v);
            assert_eq!(bv.get(off, len), v, "off={off} len={len}");
        }
    }
}
