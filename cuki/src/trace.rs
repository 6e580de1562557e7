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

//! Trace readers.
//!
//! Readers are external collaborators whose only contract is feeding
//! `(key, size)` tuples; these two implementations make that contract
//! concrete enough to run the crate end-to-end.

use crate::error::{CukiError, CukiResult};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::io::BufRead;

#[derive(Debug, Clone)]
pub struct TraceRecord {
    pub key: Vec<u8>,
    pub size: u64,
    pub timestamp: Option<u64>,
}

pub trait TraceReader {
    /// Returns the next record, or `None` at end of trace.
    fn next_record(&mut self) -> CukiResult<Option<TraceRecord>>;
}

/// A deterministic, seeded Zipfian-ish synthetic trace: keys drawn from a
/// fixed key space with skewed popularity (low-numbered keys recur far
/// more often), sizes drawn uniformly from a configured range.
pub struct SyntheticReader {
    rng: StdRng,
    key_space: u64,
    min_size: u64,
    max_size: u64,
    remaining: u64,
}

impl SyntheticReader {
    pub fn new(seed: u64, key_space: u64, min_size: u64, max_size: u64, length: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            key_space,
            min_size,
            max_size,
            remaining: length,
        }
    }

    /// Zipf-like sample over `[0, key_space)`: draws a uniform variate and
    /// squares it so low indices are heavily favoured.
    fn sample_key(&mut self) -> u64 {
        let u: f64 = self.rng.gen::<f64>();
        let skewed = u * u;
        (skewed * self.key_space as f64) as u64 % self.key_space.max(1)
    }
}

impl TraceReader for SyntheticReader {
    fn next_record(&mut self) -> CukiResult<Option<TraceRecord>> {
        if self.remaining == 0 {
            return Ok(None);
        }
        self.remaining -= 1;
        let key = self.sample_key();
        let size = if self.max_size > self.min_size {
            self.rng.gen_range(self.min_size..self.max_size)
        } else {
            self.min_size
        };
        Ok(Some(TraceRecord {
            key: key.to_le_bytes().to_vec(),
            size,
            timestamp: None,
        }))
    }
}

/// Reads `key,size[,timestamp]` lines from any `BufRead`. Column order and
/// delimiter are configurable so this can stand in for any of the
/// MSR/Twitter-style delimited trace formats the original tooling parsed.
pub struct CsvReader<R> {
    lines: std::io::Lines<R>,
    delimiter: char,
}

impl<R: BufRead> CsvReader<R> {
    pub fn new(reader: R) -> Self {
        Self::with_delimiter(reader, ',')
    }

    pub fn with_delimiter(reader: R, delimiter: char) -> Self {
        Self {
            lines: reader.lines(),
            delimiter,
        }
    }
}

impl<R: BufRead> TraceReader for CsvReader<R> {
    fn next_record(&mut self) -> CukiResult<Option<TraceRecord>> {
        loop {
            let Some(line) = self.lines.next() else {
                return Ok(None);
            };
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let mut fields = line.split(self.delimiter);
            let key = fields
                .next()
                .ok_or_else(|| CukiError::TraceFormat(format!("missing key in line: {line}")))?
                .as_bytes()
                .to_vec();
            let size = fields
                .next()
                .ok_or_else(|| CukiError::TraceFormat(format!("missing size in line: {line}")))?
                .trim()
                .parse::<u64>()
                .map_err(|e| CukiError::TraceFormat(format!("bad size in line {line:?}: {e}")))?;
            if size == 0 {
                return Err(CukiError::TraceFormat(format!(
                    "size must be positive in line: {line}"
                )));
            }
            let timestamp = match fields.next() {
                Some(t) => Some(t.trim().parse::<u64>().map_err(|e| {
                    CukiError::TraceFormat(format!("bad timestamp in line {line:?}: {e}"))
                })?),
                None => None,
            };
            return Ok(Some(TraceRecord {
                key,
                size,
                timestamp,
            }));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn synthetic_reader_is_deterministic_for_a_seed() {
        let mut a = SyntheticReader::new(42, 1000, 1, 100, 50);
        let mut b = SyntheticReader::new(42, 1000, 1, 100, 50);
        for _ in 0..50 {
            let ra = a.next_record().unwrap().unwrap();
            let rb = b.next_record().unwrap().unwrap();
            assert_eq!(ra.key, rb.key);
            assert_eq!(ra.size, rb.size);
        }
        assert!(a.next_record().unwrap().is_none());
    }

    #[test]
    fn csv_reader_parses_key_size_timestamp() {
        let data = "alpha,10,100\nbeta,20\n\n";
        let mut r = CsvReader::new(Cursor::new(data));
        let rec1 = r.next_record().unwrap().unwrap();
        assert_eq!(rec1.key, b"alpha");
        assert_eq!(rec1.size, 10);
        assert_eq!(rec1.timestamp, Some(100));
        let rec2 = r.next_record().unwrap().unwrap();
        assert_eq!(rec2.key, b"beta");
        assert_eq!(rec2.timestamp, None);
        assert!(r.next_record().unwrap().is_none());
    }

    #[test]
    fn csv_reader_rejects_zero_size() {
        let mut r = CsvReader::new(Cursor::new("k,0\n"));
        assert!(r.next_record().is_err());
    }
}
