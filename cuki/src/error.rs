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

//! Error types for the `cuki` crate.
//!
//! A hand-written enum with a manual [`fmt::Display`] and `From` impls for
//! the inner error types it wraps, rather than a derive-macro error crate.
//! The CCF's hot-path operations (`put`, `size_of`, `wss`) are infallible
//! by design and never produce a `CukiError`; this type only guards
//! construction and trace/sink I/O.

use std::{fmt, io};

pub type CukiResult<T> = Result<T, CukiError>;

#[derive(Debug)]
pub enum CukiError {
    /// A construction-time configuration violates an invariant
    /// (non-power-of-two table/lock size, zero field width, slot
    /// bit width overflow, ...).
    ConfigInvalid(String),
    /// I/O failure reading a trace or writing a sample sink.
    Io(io::Error),
    /// A trace record could not be parsed (malformed line, non-positive
    /// size, ...).
    TraceFormat(String),
}

impl fmt::Display for CukiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigInvalid(msg) => write!(f, "invalid configuration: {msg}"),
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::TraceFormat(msg) => write!(f, "malformed trace record: {msg}"),
        }
    }
}

impl std::error::Error for CukiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for CukiError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}
