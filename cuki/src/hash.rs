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

//! Key hashing into `(tag, i1, i2)`.
//!
//! A single 64-bit hash is split: the low `bucket_index_bits` of one mix
//! give `i1`, the next `tag_bits` give the raw tag (promoted to 1 if it
//! would be 0, since 0 marks an empty slot). `i2` is derived from `i1` by
//! XOR-ing in a deterministic mix of the tag, which makes `alt_bucket` its
//! own inverse for any mix function — the reciprocity property holds
//! regardless of whether that mix is odd, which only matters for
//! non-power-of-two table sizes (spec's Open Questions; `num_buckets` is
//! pinned to a power of two here, so that concern does not apply).

use std::hash::Hasher;
use twox_hash::XxHash64;

const SEED: u64 = 0x5151_c5a1_6d3e_2721;

fn h64(key: &[u8]) -> u64 {
    let mut h = XxHash64::with_seed(SEED);
    h.write(key);
    h.finish()
}

/// Golden-ratio multiplicative mix, masked down to `bits` bits taken from
/// the high end of the product for better distribution.
fn h_mix(tag: u64, bits: u32) -> u64 {
    if bits == 0 {
        return 0;
    }
    let mixed = tag.wrapping_mul(0x9E37_79B9_7F4A_7C15);
    mixed >> (64 - bits)
}

/// The alternate bucket for `i`, given the tag that placed it there.
/// `alt_bucket(alt_bucket(i, tag, bits), tag, bits) == i` always
/// property 5: cuckoo reciprocity).
pub fn alt_bucket(i: u64, tag: u64, bucket_index_bits: u32) -> u64 {
    i ^ h_mix(tag, bucket_index_bits)
}

/// Compute `(tag, i1, i2)` for `key` under a table of `2^bucket_index_bits`
/// buckets and `tag_bits`-wide fingerprints.
pub fn tag_and_buckets(key: &[u8], tag_bits: u32, bucket_index_bits: u32) -> (u64, u64, u64) {
    let h = h64(key);
    let i1 = h & ((1u64 << bucket_index_bits) - 1);
    let raw_tag = (h >> bucket_index_bits) & ((1u64 << tag_bits) - 1);
    let tag = if raw_tag == 0 { 1 } else { raw_tag };
    let i2 = alt_bucket(i1, tag, bucket_index_bits);
    (tag, i1, i2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reciprocity_holds_for_many_keys() {
        let bits = 10;
        for i in 0..10_000u64 {
            let key = i.to_le_bytes();
            let (tag, i1, i2) = tag_and_buckets(&key, 12, bits);
            assert_eq!(alt_bucket(i2, tag, bits), i1);
            assert_eq!(alt_bucket(i1, tag, bits), i2);
        }
    }

    #[test]
    fn tag_is_never_zero() {
        for i in 0..10_000u64 {
            let key = i.to_le_bytes();
            let (tag, _, _) = tag_and_buckets(&key, 8, 10);
            assert_ne!(tag, 0);
        }
    }
}
