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

//! The clock-based counting cuckoo filter core.
//!
//! Maps keys to two candidate buckets, stores fingerprint + size + clock,
//! and performs cuckoo displacement under a bounded kick budget. This is
//! the component the rest of the crate (aging, the WSS/IRR facade) is
//! built around.

use crate::config::{Config, SizeEncode};
use crate::hash::{alt_bucket, tag_and_buckets};
use crate::table::{BucketTable, Slot};
use rand::Rng;
use std::sync::atomic::{AtomicU64, Ordering};

const ORD: Ordering = Ordering::Relaxed;

/// Result of a [`Ccf::put`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutOutcome {
    /// Filled a free slot in one of the key's two candidate buckets.
    Inserted,
    /// The key already had a live slot; its size/clock were refreshed.
    Refreshed,
    /// Both candidate buckets were full; the key was placed by evicting
    /// and relocating one or more existing entries.
    Displaced,
    /// Displacement exhausted `max_kicks`; the last evicted entry was
    /// dropped and its size subtracted from the running total. This is
    /// the graceful-degradation path, not an error.
    Dropped,
}

struct Pending {
    tag: u64,
    size_raw: u64,
    scope: u64,
}

pub struct Ccf {
    table: BucketTable,
    tag_bits: u32,
    bucket_index_bits: u32,
    size_encode: SizeEncode,
    size_bits: u32,
    size_bucket_bits: u32,
    max_kicks: u32,
    oppo_aging: bool,
    clock_max: u64,
    wss: AtomicU64,
    references: AtomicU64,
    scope_sums: Option<Box<[AtomicU64]>>,
}

impl Ccf {
    pub fn new(cfg: &Config) -> Self {
        let scope_sums = (cfg.scope_bits > 0)
            .then(|| (0..cfg.num_scope).map(|_| AtomicU64::new(0)).collect());
        Self {
            table: BucketTable::new(cfg),
            tag_bits: cfg.tag_bits,
            bucket_index_bits: cfg.bucket_index_bits(),
            size_encode: cfg.size_encode,
            size_bits: cfg.size_bits,
            size_bucket_bits: cfg.size_bucket_bits,
            max_kicks: cfg.max_kicks,
            oppo_aging: cfg.oppo_aging,
            clock_max: cfg.clock_max(),
            wss: AtomicU64::new(0),
            references: AtomicU64::new(0),
            scope_sums,
        }
    }

    pub fn num_buckets(&self) -> u64 {
        self.table.num_buckets()
    }

    pub fn references(&self) -> u64 {
        self.references.load(ORD)
    }

    /// Current running WSS estimate.
    pub fn wss(&self) -> u64 {
        self.wss.load(ORD)
    }

    pub fn scope_wss(&self, scope: u64) -> Option<u64> {
        self.scope_sums
            .as_ref()
            .and_then(|s| s.get(scope as usize))
            .map(|a| a.load(ORD))
    }

    fn max_raw(&self) -> u64 {
        (1u64 << self.size_bits) - 1
    }

    /// Raw storable value for `size` under the configured encoding. Also
    /// doubles as the "quantum" used by the refresh policy, so refresh
    /// is uniformly `max(old_raw, encode_size(new_size))` under either
    /// encoding.
    fn encode_size(&self, size: u64) -> u64 {
        match self.size_encode {
            SizeEncode::Linear => size.min(self.max_raw()),
            SizeEncode::Bucket => (size >> self.size_bucket_bits).min(self.max_raw()),
        }
    }

    /// Decoded byte count for a non-empty slot's raw `size` field.
    fn decode_size(&self, raw: u64) -> u64 {
        match self.size_encode {
            SizeEncode::Linear => raw,
            SizeEncode::Bucket if raw == 0 => 1u64 << self.size_bucket_bits,
            SizeEncode::Bucket => raw << self.size_bucket_bits,
        }
    }

    fn alt(&self, bucket: u64, tag: u64) -> u64 {
        alt_bucket(bucket, tag, self.bucket_index_bits)
    }

    fn bump_wss(&self, delta: i64, scope: u64) {
        if delta >= 0 {
            self.wss.fetch_add(delta as u64, ORD);
            if let Some(sums) = &self.scope_sums {
                if let Some(a) = sums.get(scope as usize) {
                    a.fetch_add(delta as u64, ORD);
                }
            }
        } else {
            self.wss.fetch_sub((-delta) as u64, ORD);
            if let Some(sums) = &self.scope_sums {
                if let Some(a) = sums.get(scope as usize) {
                    a.fetch_sub((-delta) as u64, ORD);
                }
            }
        }
    }

    /// Decrement every slot's clock in `bucket` by one, saturating at
    /// zero, clearing (and subtracting) any slot that reaches zero. Must
    /// be called with `bucket` already locked.
    fn age_bucket_locked(&self, bucket: u64) {
        for s in 0..self.table.tags_per_bucket() {
            let clock = self.table.read_clock(bucket, s);
            if clock == 0 {
                continue; // already empty or never touched
            }
            if clock == 1 {
                let raw = self.table.read_size(bucket, s);
                let scope = self.table.read_scope(bucket, s);
                self.table.clear_slot(bucket, s);
                self.bump_wss(-(self.decode_size(raw) as i64), scope);
            } else {
                self.table.write_clock(bucket, s, clock - 1);
            }
        }
    }

    /// Window-driven aging sweep over the whole table. Called
    /// by the facade every `aging_stride` references when `!oppo_aging`.
    pub fn sweep_all(&self) {
        for b in 0..self.table.num_buckets() {
            let _g = self.table.lock(b);
            self.age_bucket_locked(b);
        }
    }

    /// Recompute the running WSS (and per-scope sums) from scratch by
    /// scanning every slot. Bounds drift accumulated from concurrent
    /// races.
    pub fn reconcile(&self) {
        let mut total = 0u64;
        let mut scope_totals = self.scope_sums.as_ref().map(|s| vec![0u64; s.len()]);
        for b in 0..self.table.num_buckets() {
            let _g = self.table.lock(b);
            for s in 0..self.table.tags_per_bucket() {
                let slot = self.table.read_slot(b, s);
                if slot.is_empty() {
                    continue;
                }
                let decoded = self.decode_size(slot.size);
                total += decoded;
                if let Some(totals) = scope_totals.as_mut() {
                    if let Some(t) = totals.get_mut(slot.scope as usize) {
                        *t += decoded;
                    }
                }
            }
        }
        self.wss.store(total, ORD);
        if let (Some(sums), Some(totals)) = (&self.scope_sums, scope_totals) {
            for (a, t) in sums.iter().zip(totals) {
                a.store(t, ORD);
            }
        }
    }

    /// Insert or refresh `key` with the given byte size, attributing it
    /// to scope 0. See [`Ccf::put_scoped`] for per-scope accounting.
    pub fn put(&self, key: &[u8], size: u64) -> PutOutcome {
        self.put_scoped(key, size, 0)
    }

    pub fn put_scoped(&self, key: &[u8], size: u64, scope: u64) -> PutOutcome {
        self.references.fetch_add(1, ORD);
        let (tag, i1, i2) = tag_and_buckets(key, self.tag_bits, self.bucket_index_bits);

        if self.oppo_aging {
            {
                let _g = self.table.lock(i1);
                self.age_bucket_locked(i1);
            }
            if i2 != i1 {
                let _g = self.table.lock(i2);
                self.age_bucket_locked(i2);
            }
        }

        if let Some(outcome) = self.try_match_or_insert(i1, tag, size, scope) {
            return outcome;
        }
        if let Some(outcome) = self.try_match_or_insert(i2, tag, size, scope) {
            return outcome;
        }
        self.cuckoo_insert(tag, i1, i2, size, scope)
    }

    /// Under `bucket`'s lock: refresh a matching tag, or fill a free slot.
    /// Returns `None` if neither applies (bucket is full of other tags).
    fn try_match_or_insert(
        &self,
        bucket: u64,
        tag: u64,
        size: u64,
        scope: u64,
    ) -> Option<PutOutcome> {
        let _g = self.table.lock(bucket);
        let n = self.table.tags_per_bucket();
        let mut free_slot = None;
        for s in 0..n {
            let cur_tag = self.table.read_tag(bucket, s);
            if cur_tag == tag {
                let old_raw = self.table.read_size(bucket, s);
                let new_raw = old_raw.max(self.encode_size(size));
                self.table.write_size(bucket, s, new_raw);
                self.table.write_clock(bucket, s, self.clock_max);
                if new_raw != old_raw {
                    let delta = self.decode_size(new_raw) as i64 - self.decode_size(old_raw) as i64;
                    self.bump_wss(delta, scope);
                }
                return Some(PutOutcome::Refreshed);
            }
            if cur_tag == 0 && free_slot.is_none() {
                free_slot = Some(s);
            }
        }
        let s = free_slot?;
        let raw = self.encode_size(size);
        self.table.write_slot(
            bucket,
            s,
            Slot {
                tag,
                size: raw,
                clock: self.clock_max,
                scope,
            },
        );
        self.bump_wss(self.decode_size(raw) as i64, scope);
        Some(PutOutcome::Inserted)
    }

    /// Bounded cuckoo displacement loop. `target`/`sibling` are the two
    /// candidate buckets for whatever key is currently homeless (`pending`);
    /// on each iteration we lock both together, seat `pending` in whichever
    /// has room, or evict a random occupant from one of them and carry it
    /// forward as the new `pending`.
    fn cuckoo_insert(&self, tag: u64, i1: u64, i2: u64, size: u64, scope: u64) -> PutOutcome {
        let mut pending = Pending {
            tag,
            size_raw: self.encode_size(size),
            scope,
        };
        let mut target = i1;
        let mut sibling = i2;

        // the incoming entry is logically in the table from here on: every
        // kick just relocates an existing resident, which conserves the
        // running sum, so only its initial entry and its possible final
        // eviction ever touch `wss`.
        self.bump_wss(self.decode_size(pending.size_raw) as i64, pending.scope);

        for _ in 0..self.max_kicks {
            // both of the current candidate buckets' stripes, ascending.
            let guard = self.table.lock_two(target, sibling);
            let n = self.table.tags_per_bucket();
            let same_bucket = target == sibling;
            let candidates: &[u64] = if same_bucket { &[target] } else { &[target, sibling] };

            // a true free slot wins outright; failing that, under
            // opportunistic aging a slot already sitting at clock == 1 is
            // treated as empty rather than decremented again — `put_scoped`
            // already did this call's one full decrement on `i1`/`i2`.
            let mut chosen = None;
            'search: for &b in candidates {
                for s in 0..n {
                    if self.table.read_tag(b, s) == 0 {
                        chosen = Some((b, s));
                        break 'search;
                    }
                }
            }
            if chosen.is_none() && self.oppo_aging {
                'search_expired: for &b in candidates {
                    for s in 0..n {
                        if self.table.read_clock(b, s) == 1 {
                            chosen = Some((b, s));
                            break 'search_expired;
                        }
                    }
                }
            }

            if let Some((b, s)) = chosen {
                let existing = self.table.read_slot(b, s);
                if !existing.is_empty() {
                    // an about-to-expire occupant: it vanishes rather than
                    // being carried forward as a displaced victim.
                    self.bump_wss(-(self.decode_size(existing.size) as i64), existing.scope);
                }
                self.table.write_slot(
                    b,
                    s,
                    Slot {
                        tag: pending.tag,
                        size: pending.size_raw,
                        clock: self.clock_max,
                        scope: pending.scope,
                    },
                );
                return PutOutcome::Displaced;
            }

            // both candidates full: evict a random slot from one of them,
            // carry its former occupant forward.
            let evict_bucket = if !same_bucket && rand::thread_rng().gen_bool(0.5) {
                sibling
            } else {
                target
            };
            let victim_ix = rand::thread_rng().gen_range(0..n);
            let victim = self.table.read_slot(evict_bucket, victim_ix);
            self.table.write_slot(
                evict_bucket,
                victim_ix,
                Slot {
                    tag: pending.tag,
                    size: pending.size_raw,
                    clock: self.clock_max,
                    scope: pending.scope,
                },
            );
            drop(guard);

            // the evicted occupant is still in the table conceptually, just
            // carried forward as the new `pending` — no wss change. Its two
            // candidate buckets are `evict_bucket` (just vacated) and its
            // alternate.
            target = self.alt(evict_bucket, victim.tag);
            sibling = evict_bucket;
            pending = Pending {
                tag: victim.tag,
                size_raw: victim.size,
                scope: victim.scope,
            };
        }

        // exhausted max_kicks: drop the entry currently in hand.
        self.bump_wss(-(self.decode_size(pending.size_raw) as i64), pending.scope);
        log::debug!(
            "cuckoo displacement exhausted max_kicks, dropping tag {:#x}",
            pending.tag
        );
        PutOutcome::Dropped
    }

    /// Look up `key`'s decoded size without mutating anything.
    pub fn size_of(&self, key: &[u8]) -> Option<u64> {
        let (tag, i1, i2) = tag_and_buckets(key, self.tag_bits, self.bucket_index_bits);
        for bucket in [i1, i2] {
            let _g = self.table.lock(bucket);
            for s in 0..self.table.tags_per_bucket() {
                if self.table.read_tag(bucket, s) == tag {
                    return Some(self.decode_size(self.table.read_size(bucket, s)));
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn cfg(over: impl FnOnce(&mut Config)) -> Config {
        let mut c = Config {
            num_buckets: 16,
            lock_number: 4,
            tags_per_bucket: 4,
            tag_bits: 8,
            clock_bits: 2,
            size_bits: 4,
            size_encode: SizeEncode::Linear,
            ..Default::default()
        };
        over(&mut c);
        c
    }

    #[test]
    fn s1_fresh_insert() {
        let ccf = Ccf::new(&cfg(|_| {}));
        assert_eq!(ccf.put(b"a", 5), PutOutcome::Inserted);
        assert_eq!(ccf.put(b"b", 3), PutOutcome::Inserted);
        assert_eq!(ccf.wss(), 8);
    }

    #[test]
    fn s2_refresh() {
        let ccf = Ccf::new(&cfg(|_| {}));
        assert_eq!(ccf.put(b"a", 5), PutOutcome::Inserted);
        assert_eq!(ccf.put(b"a", 7), PutOutcome::Refreshed);
        assert_eq!(ccf.wss(), 7);
        assert_eq!(ccf.size_of(b"a"), Some(7));
    }

    #[test]
    fn refresh_keeps_max_on_smaller_write() {
        let ccf = Ccf::new(&cfg(|_| {}));
        ccf.put(b"a", 9);
        ccf.put(b"a", 2);
        assert_eq!(ccf.size_of(b"a"), Some(9));
        assert_eq!(ccf.wss(), 9);
    }

    #[test]
    fn s5_displacement_drop_under_full_table() {
        // A single bucket, single slot, zero kicks allowed: the second
        // distinct key can never find room, so it must be dropped.
        let c = cfg(|c| {
            c.num_buckets = 1;
            c.lock_number = 1;
            c.tags_per_bucket = 1;
            c.max_kicks = 1;
        });
        let ccf = Ccf::new(&c);
        assert_eq!(ccf.put(b"first", 5), PutOutcome::Inserted);
        let outcome = ccf.put(b"overflow-key", 9);
        assert_eq!(outcome, PutOutcome::Dropped);
        // the single kick evicted "first" to make room for the new key;
        // the running sum reflects exactly the resident entry.
        assert_eq!(ccf.wss(), 9);
        assert_eq!(ccf.size_of(b"first"), None);
        assert_eq!(ccf.size_of(b"overflow-key"), Some(9));
    }

    #[test]
    fn displacement_does_not_age_a_candidate_bucket_twice() {
        // A single bucket, two slots, opportunistic aging: each `put`
        // decrements every live clock in the bucket once. "a" reaches
        // clock 1 exactly when "c" is put and gets reused in place by the
        // displacement path's narrower check — but "b", which isn't the
        // slot being reused, must only have been aged once this call. A
        // second full decrement sweep inside displacement would leave "b"
        // one decrement further aged than it should be.
        let c = cfg(|c| {
            c.num_buckets = 1;
            c.lock_number = 1;
            c.tags_per_bucket = 2;
            c.clock_bits = 2;
            c.oppo_aging = true;
        });
        let ccf = Ccf::new(&c);
        assert_eq!(ccf.put(b"a", 1), PutOutcome::Inserted); // a: clock 3
        assert_eq!(ccf.put(b"b", 1), PutOutcome::Inserted); // a: 3->2, b: clock 3, bucket full
        let outcome = ccf.put(b"c", 1); // a: 2->1, reused; b should land at 3->2
        assert!(matches!(outcome, PutOutcome::Displaced));
        assert_eq!(ccf.size_of(b"a"), None);
        assert!(ccf.size_of(b"c").is_some());

        let (tag_b, i1, _) = tag_and_buckets(b"b", c.tag_bits, c.bucket_index_bits());
        let mut b_clock = None;
        for s in 0..ccf.table.tags_per_bucket() {
            if ccf.table.read_tag(i1, s) == tag_b {
                b_clock = Some(ccf.table.read_clock(i1, s));
            }
        }
        assert_eq!(b_clock, Some(2));
    }

    #[test]
    fn size_of_absent_key_is_none() {
        let ccf = Ccf::new(&cfg(|_| {}));
        ccf.put(b"a", 1);
        assert_eq!(ccf.size_of(b"nope"), None);
    }

    #[test]
    fn bucket_encoding_decodes_v_zero_as_minimum_quantum() {
        let c = cfg(|c| {
            c.size_encode = SizeEncode::Bucket;
            c.size_bucket_bits = 4;
            c.size_bits = 4;
        });
        let ccf = Ccf::new(&c);
        ccf.put(b"a", 1); // quantum 0
        assert_eq!(ccf.size_of(b"a"), Some(1 << 4));
    }

    #[test]
    fn concurrent_duplicate_insert_converges_after_reconcile() {
        use std::sync::Arc;
        use std::thread;
        let ccf = Arc::new(Ccf::new(&cfg(|_| {})));
        let handles: Vec<_> = (0..2)
            .map(|_| {
                let ccf = ccf.clone();
                thread::spawn(move || {
                    ccf.put(b"a", 4);
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(ccf.size_of(b"a"), Some(4));
        assert!(ccf.wss() == 4 || ccf.wss() == 8);
        ccf.reconcile();
        assert_eq!(ccf.wss(), 4);
    }
}
