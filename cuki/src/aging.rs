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

//! The aging controller.
//!
//! `Ccf` itself implements both the window-driven sweep
//! ([`crate::ccf::Ccf::sweep_all`]) and the opportunistic per-bucket
//! decrement it performs inline during `put` — this module is the thin
//! policy layer that decides, on every `put`, whether a window-driven
//! sweep is due. Only one mode is active at a time, resolved once at
//! construction into a concrete variant rather than branched per call.

use crate::ccf::Ccf;
use crate::config::Config;

pub enum AgingController {
    /// `OPPO_AGING = true`: no sweep is ever driven externally; all aging
    /// happens inline inside `Ccf::put_scoped`.
    Opportunistic,
    /// `OPPO_AGING = false`: every `stride` references, a full-table sweep
    /// decrements every live clock by one.
    WindowDriven { stride: u64 },
}

impl AgingController {
    pub fn from_config(cfg: &Config) -> Self {
        if cfg.oppo_aging {
            Self::Opportunistic
        } else {
            Self::WindowDriven {
                stride: cfg.aging_stride(),
            }
        }
    }

    /// Called after every `put`, with the reference count as observed
    /// immediately after that put. Runs a sweep if one is due.
    pub fn on_reference(&self, ccf: &Ccf, references: u64) {
        if let Self::WindowDriven { stride } = self {
            if references.is_multiple_of(*stride) {
                ccf.sweep_all();
            }
        }
    }
}
