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

//! # Cuki
//!
//! A compact, concurrent, probabilistic data structure that estimates the
//! Working Set Size (WSS) and Inter-Reference Recency (IRR) distribution
//! of a stream of variable-size item accesses in an online, sliding-window
//! fashion.
//!
//! The core is the Clock-based Counting Cuckoo Filter ([`ccf::Ccf`]): a
//! bucketed, fingerprint-indexed table ([`table::BucketTable`], itself
//! backed by [`bitvec::BitVector`]) that tracks presence, attributed byte
//! size, and a per-entry aging clock, under bucket-striped locking. The
//! [`facade::Facade`] drives a [`trace::TraceReader`] through the filter
//! and emits samples to a [`sink::SampleSink`].

pub mod aging;
pub mod bitvec;
pub mod ccf;
pub mod config;
pub mod error;
pub mod facade;
pub mod hash;
pub mod sink;
pub mod table;
pub mod trace;

pub use ccf::{Ccf, PutOutcome};
pub use config::{Config, SizeEncode};
pub use error::{CukiError, CukiResult};
pub use facade::Facade;
