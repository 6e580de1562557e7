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

//! Typed slot storage on top of [`BitVector`], and per-bucket mutual
//! exclusion.
//!
//! Locking uses a stripe of `LOCK_NUMBER` mutexes, indexed by `bucket_ix mod
//! LOCK_NUMBER`, the same sharded shape as a `shift`-derived shard index
//! over a boxed slice of locks — here a plain `Mutex` since every bucket
//! access that needs the lock also needs to mutate.

use crate::bitvec::BitVector;
use crate::config::Config;
use parking_lot::{Mutex, MutexGuard};

/// One record: `{tag, size, clock, scope}`, packed in that field order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub tag: u64,
    pub size: u64,
    pub clock: u64,
    pub scope: u64,
}

impl Slot {
    pub const EMPTY: Self = Self {
        tag: 0,
        size: 0,
        clock: 0,
        scope: 0,
    };

    pub fn is_empty(&self) -> bool {
        self.tag == 0
    }
}

/// Bit widths and offsets derived once from [`Config`], shared by every
/// slot access so field layout stays stable within a build.
#[derive(Debug, Clone, Copy)]
pub struct SlotLayout {
    pub tag_bits: u32,
    pub size_bits: u32,
    pub clock_bits: u32,
    pub scope_bits: u32,
    pub slot_bits: u32,
    pub tags_per_bucket: u32,
}

impl SlotLayout {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            tag_bits: cfg.tag_bits,
            size_bits: cfg.size_bits,
            clock_bits: cfg.clock_bits,
            scope_bits: cfg.scope_bits,
            slot_bits: cfg.slot_bits(),
            tags_per_bucket: cfg.tags_per_bucket,
        }
    }

    fn slot_offset(&self, bucket_ix: u64, slot_ix: u32) -> usize {
        (bucket_ix * self.tags_per_bucket as u64 + slot_ix as u64) as usize
            * self.slot_bits as usize
    }
}

/// A held stripe lock for one bucket. Released on drop.
pub struct BucketGuard<'a> {
    _guard: MutexGuard<'a, ()>,
    pub bucket_ix: u64,
}

/// Two bucket locks, acquired in ascending stripe order. If both buckets
/// fall in the same stripe, `second` is `None` and `first` covers both.
pub struct TwoBucketGuard<'a> {
    pub first: BucketGuard<'a>,
    pub second: Option<BucketGuard<'a>>,
}

pub struct BucketTable {
    bits: BitVector,
    locks: Box<[Mutex<()>]>,
    layout: SlotLayout,
    num_buckets: u64,
    lock_number: u64,
}

impl BucketTable {
    pub fn new(cfg: &Config) -> Self {
        let layout = SlotLayout::from_config(cfg);
        let total_bits = cfg.num_buckets as usize
            * layout.tags_per_bucket as usize
            * layout.slot_bits as usize;
        Self {
            bits: BitVector::new(total_bits),
            locks: (0..cfg.lock_number).map(|_| Mutex::new(())).collect(),
            layout,
            num_buckets: cfg.num_buckets,
            lock_number: cfg.lock_number,
        }
    }

    pub fn num_buckets(&self) -> u64 {
        self.num_buckets
    }

    pub fn tags_per_bucket(&self) -> u32 {
        self.layout.tags_per_bucket
    }

    fn stripe_of(&self, bucket_ix: u64) -> u64 {
        bucket_ix % self.lock_number
    }

    pub fn lock(&self, bucket_ix: u64) -> BucketGuard<'_> {
        let stripe = self.stripe_of(bucket_ix) as usize;
        BucketGuard {
            _guard: self.locks[stripe].lock(),
            bucket_ix,
        }
    }

    /// Lock both `b1` and `b2`'s stripes in ascending numeric order, so
    /// cuckoo displacement (which always touches two buckets) can never
    /// deadlock against a concurrent displacement touching the same pair
    /// in the opposite order.
    pub fn lock_two(&self, b1: u64, b2: u64) -> TwoBucketGuard<'_> {
        let s1 = self.stripe_of(b1);
        let s2 = self.stripe_of(b2);
        if s1 == s2 {
            return TwoBucketGuard {
                first: self.lock(b1),
                second: None,
            };
        }
        let (lo, hi) = if s1 < s2 { (b1, b2) } else { (b2, b1) };
        let first = self.lock(lo);
        let second = Some(self.lock(hi));
        TwoBucketGuard { first, second }
    }

    pub fn read_tag(&self, bucket_ix: u64, slot_ix: u32) -> u64 {
        let base = self.layout.slot_offset(bucket_ix, slot_ix);
        self.bits.get(base, self.layout.tag_bits)
    }

    pub fn write_tag(&self, bucket_ix: u64, slot_ix: u32, tag: u64) {
        let base = self.layout.slot_offset(bucket_ix, slot_ix);
        self.bits.set(base, self.layout.tag_bits, tag);
    }

    pub fn read_size(&self, bucket_ix: u64, slot_ix: u32) -> u64 {
        let base = self.layout.slot_offset(bucket_ix, slot_ix) + self.layout.tag_bits as usize;
        self.bits.get(base, self.layout.size_bits)
    }

    pub fn write_size(&self, bucket_ix: u64, slot_ix: u32, size: u64) {
        let base = self.layout.slot_offset(bucket_ix, slot_ix) + self.layout.tag_bits as usize;
        self.bits.set(base, self.layout.size_bits, size);
    }

    pub fn read_clock(&self, bucket_ix: u64, slot_ix: u32) -> u64 {
        let base = self.layout.slot_offset(bucket_ix, slot_ix)
            + (self.layout.tag_bits + self.layout.size_bits) as usize;
        self.bits.get(base, self.layout.clock_bits)
    }

    pub fn write_clock(&self, bucket_ix: u64, slot_ix: u32, clock: u64) {
        let base = self.layout.slot_offset(bucket_ix, slot_ix)
            + (self.layout.tag_bits + self.layout.size_bits) as usize;
        self.bits.set(base, self.layout.clock_bits, clock);
    }

    pub fn read_scope(&self, bucket_ix: u64, slot_ix: u32) -> u64 {
        if self.layout.scope_bits == 0 {
            return 0;
        }
        let base = self.layout.slot_offset(bucket_ix, slot_ix)
            + (self.layout.tag_bits + self.layout.size_bits + self.layout.clock_bits) as usize;
        self.bits.get(base, self.layout.scope_bits)
    }

    pub fn write_scope(&self, bucket_ix: u64, slot_ix: u32, scope: u64) {
        if self.layout.scope_bits == 0 {
            return;
        }
        let base = self.layout.slot_offset(bucket_ix, slot_ix)
            + (self.layout.tag_bits + self.layout.size_bits + self.layout.clock_bits) as usize;
        self.bits.set(base, self.layout.scope_bits, scope);
    }

    pub fn read_slot(&self, bucket_ix: u64, slot_ix: u32) -> Slot {
        Slot {
            tag: self.read_tag(bucket_ix, slot_ix),
            size: self.read_size(bucket_ix, slot_ix),
            clock: self.read_clock(bucket_ix, slot_ix),
            scope: self.read_scope(bucket_ix, slot_ix),
        }
    }

    pub fn write_slot(&self, bucket_ix: u64, slot_ix: u32, slot: Slot) {
        self.write_tag(bucket_ix, slot_ix, slot.tag);
        self.write_size(bucket_ix, slot_ix, slot.size);
        self.write_clock(bucket_ix, slot_ix, slot.clock);
        self.write_scope(bucket_ix, slot_ix, slot.scope);
    }

    pub fn clear_slot(&self, bucket_ix: u64, slot_ix: u32) {
        self.write_slot(bucket_ix, slot_ix, Slot::EMPTY);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        Config {
            num_buckets: 16,
            lock_number: 4,
            tags_per_bucket: 4,
            tag_bits: 8,
            clock_bits: 2,
            size_bits: 16,
            ..Default::default()
        }
    }

    #[test]
    fn write_then_read_slot() {
        let t = BucketTable::new(&test_config());
        let s = Slot {
            tag: 0xAB,
            size: 1234,
            clock: 3,
            scope: 0,
        };
        t.write_slot(5, 2, s);
        assert_eq!(t.read_slot(5, 2), s);
        // neighbouring slots untouched
        assert!(t.read_slot(5, 1).is_empty());
        assert!(t.read_slot(6, 2).is_empty());
    }

    #[test]
    fn lock_two_dedupes_same_stripe() {
        let t = BucketTable::new(&test_config());
        let g = t.lock_two(1, 9); // both bucket_ix % 4 == 1
        assert!(g.second.is_none());
    }

    #[test]
    fn lock_two_distinct_stripes() {
        let t = BucketTable::new(&test_config());
        let g = t.lock_two(2, 5); // stripes 2 and 1
        assert!(g.second.is_some());
    }
}
