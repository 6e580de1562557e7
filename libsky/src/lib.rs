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

//! Shared utilities for the `cuki` workspace.
//!
//! A tiny grab-bag of terminal and constant utilities shared by the
//! library and the binary, with no domain logic of its own.

pub mod util;

use std::error::Error;

/// A generic boxed-error result, used only at the top-level glue (CLI arg
/// parsing, config file loading) where a single catch-all type is fine.
pub type CukiResult<T> = Result<T, Box<dyn Error>>;

/// Crate version, surfaced by the CLI's `--version` flag.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Project URL, printed in the CLI banner.
pub const URL: &str = "https://github.com/cuki-rs/cuki";
