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

//! Construction configuration for a [`crate::Ccf`] and its facade.
//!
//! A plain `serde::Deserialize` struct that can be loaded from a YAML file
//! or built programmatically, with a `validate` pass that turns malformed
//! input into a [`CukiError::ConfigInvalid`] at construction time rather
//! than panicking deep inside the table.

use crate::error::{CukiError, CukiResult};
use serde::Deserialize;

/// How a slot's `size` field is decoded into a byte count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SizeEncode {
    /// Stored value is the exact truncated size, saturating at the field's
    /// maximum.
    Linear,
    /// Stored value `v` denotes size ≈ `v * 2^size_bucket_bits`; `v = 0`
    /// decodes to `2^size_bucket_bits`, never zero, for a non-empty slot.
    Bucket,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub tags_per_bucket: u32,
    pub tag_bits: u32,
    pub size_encode: SizeEncode,
    pub size_bits: u32,
    pub size_bucket_bits: u32,
    pub clock_bits: u32,
    pub scope_bits: u32,
    pub num_scope: u32,
    pub window_size: u64,
    pub num_buckets: u64,
    pub lock_number: u64,
    pub max_kicks: u32,
    pub oppo_aging: bool,
    pub report_interval: u64,
    pub time_divisor: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tags_per_bucket: 4,
            tag_bits: 8,
            size_encode: SizeEncode::Linear,
            size_bits: 16,
            size_bucket_bits: 0,
            clock_bits: 2,
            scope_bits: 0,
            num_scope: 0,
            window_size: 1 << 20,
            num_buckets: 1 << 16,
            lock_number: 256,
            max_kicks: 500,
            oppo_aging: false,
            report_interval: 1 << 16,
            time_divisor: 1,
        }
    }
}

impl Config {
    /// Total bits occupied by one slot's fields, in declaration order
    /// (tag, size, clock, scope).
    pub fn slot_bits(&self) -> u32 {
        self.tag_bits + self.size_bits + self.clock_bits + self.scope_bits
    }

    /// `log2(num_buckets)`, used to carve the bucket-index bits out of the
    /// key hash.
    pub fn bucket_index_bits(&self) -> u32 {
        self.num_buckets.trailing_zeros()
    }

    /// Clock value written on insert/refresh: the saturating maximum,
    /// `2^clock_bits - 1`.
    pub fn clock_max(&self) -> u64 {
        (1u64 << self.clock_bits) - 1
    }

    /// Stride, in references, between window-driven aging sweeps:
    /// `max(1, window_size / (2^clock_bits - 1))`.
    pub fn aging_stride(&self) -> u64 {
        let divisor = self.clock_max().max(1);
        (self.window_size / divisor).max(1)
    }

    /// Validate every rule that would otherwise surface as `ConfigInvalid`.
    pub fn validate(&self) -> CukiResult<()> {
        let err = |msg: String| Err(CukiError::ConfigInvalid(msg));
        if !self.num_buckets.is_power_of_two() {
            return err(format!("num_buckets ({}) must be a power of two", self.num_buckets));
        }
        if !self.lock_number.is_power_of_two() {
            return err(format!("lock_number ({}) must be a power of two", self.lock_number));
        }
        if self.tags_per_bucket == 0 {
            return err("tags_per_bucket must be nonzero".into());
        }
        if self.tag_bits == 0 || self.tag_bits > 63 {
            return err(format!("tag_bits ({}) must be in 1..=63", self.tag_bits));
        }
        if self.size_bits == 0 || self.size_bits > 64 {
            return err(format!("size_bits ({}) must be in 1..=64", self.size_bits));
        }
        if self.clock_bits == 0 || self.clock_bits > 8 {
            return err(format!("clock_bits ({}) must be in 1..=8", self.clock_bits));
        }
        if self.size_encode == SizeEncode::Bucket && self.size_bucket_bits == 0 {
            return err("size_bucket_bits must be nonzero under BUCKET encoding".into());
        }
        if self.size_bits + self.size_bucket_bits > 32 {
            return err(format!(
                "size_bits + size_bucket_bits ({} + {}) must not exceed 32",
                self.size_bits, self.size_bucket_bits
            ));
        }
        if self.scope_bits == 0 && self.num_scope != 0 {
            return err("num_scope must be 0 when scope_bits is 0".into());
        }
        if self.scope_bits > 0 && self.num_scope == 0 {
            return err("num_scope must be nonzero when scope_bits is nonzero".into());
        }
        if self.scope_bits > 0 && self.num_scope > (1u32 << self.scope_bits) {
            return err(format!(
                "num_scope ({}) exceeds 2^scope_bits ({})",
                self.num_scope,
                1u32 << self.scope_bits
            ));
        }
        if self.slot_bits() > 64 {
            return err(format!(
                "slot bit width ({}) exceeds the 64-bit word a single slot read/write supports",
                self.slot_bits()
            ));
        }
        if self.max_kicks == 0 {
            return err("max_kicks must be nonzero".into());
        }
        if self.lock_number > self.num_buckets {
            return err(format!(
                "lock_number ({}) must not exceed num_buckets ({})",
                self.lock_number, self.num_buckets
            ));
        }
        if self.report_interval == 0 || self.time_divisor == 0 {
            return err("report_interval and time_divisor must be nonzero".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        Config::default().validate().unwrap();
    }

    #[test]
    fn rejects_non_power_of_two_buckets() {
        let cfg = Config {
            num_buckets: 100,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_oversized_slot() {
        let cfg = Config {
            tag_bits: 40,
            size_bits: 40,
            clock_bits: 8,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn aging_stride_matches_scenario_s3() {
        let cfg = Config {
            clock_bits: 1,
            window_size: 4,
            ..Default::default()
        };
        assert_eq!(cfg.aging_stride(), 4);
    }
}
