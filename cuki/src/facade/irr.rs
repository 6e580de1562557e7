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

//! Inter-reference recency histogram.
//!
//! Deliberately small and approximate: a `HashMap` from key to the
//! reference index it was last seen at, and a log-scale histogram of the
//! deltas between consecutive touches of the same key. Spec frames this as
//! "a secondary small structure (out of core scope)"; the WSS path never
//! reads from it.

use parking_lot::Mutex;
use std::collections::HashMap;

const BUCKETS: usize = 64; // enough headroom for any u64 distance

pub struct IrrHistogram {
    last_seen: Mutex<HashMap<Box<[u8]>, u64>>,
    counts: [std::sync::atomic::AtomicU64; BUCKETS],
}

impl IrrHistogram {
    pub fn new() -> Self {
        Self {
            last_seen: Mutex::new(HashMap::new()),
            counts: std::array::from_fn(|_| std::sync::atomic::AtomicU64::new(0)),
        }
    }

    /// Record that `key` was referenced at `reference_index`. If it was
    /// seen before, buckets the distance into a log-scale histogram.
    pub fn touch(&self, key: &[u8], reference_index: u64) {
        let mut map = self.last_seen.lock();
        if let Some(prev) = map.insert(key.into(), reference_index) {
            let distance = reference_index.saturating_sub(prev);
            let bucket = Self::log_bucket(distance);
            self.counts[bucket].fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        }
    }

    fn log_bucket(distance: u64) -> usize {
        if distance == 0 {
            0
        } else {
            ((64 - distance.leading_zeros()) as usize).min(BUCKETS - 1)
        }
    }

    /// Snapshot of the histogram: `(log2(distance) bucket, count)` pairs
    /// for every non-empty bucket.
    pub fn snapshot(&self) -> Vec<(usize, u64)> {
        self.counts
            .iter()
            .enumerate()
            .map(|(i, c)| (i, c.load(std::sync::atomic::Ordering::Relaxed)))
            .filter(|(_, c)| *c > 0)
            .collect()
    }
}

impl Default for IrrHistogram {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_access_buckets_a_distance() {
        let h = IrrHistogram::new();
        h.touch(b"a", 1);
        h.touch(b"a", 5);
        let snap = h.snapshot();
        assert_eq!(snap.len(), 1);
        assert_eq!(snap[0].1, 1);
    }

    #[test]
    fn first_access_records_nothing() {
        let h = IrrHistogram::new();
        h.touch(b"a", 1);
        assert!(h.snapshot().is_empty());
    }
}
