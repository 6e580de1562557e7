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

//! Output contract: line-oriented `reference_index,wss_bytes`
//! records.

use std::io::Write;

pub trait SampleSink {
    fn emit(&mut self, reference_index: u64, wss_bytes: u64);
}

/// Writes `reference_index,wss_bytes\n` lines to any [`Write`].
pub struct LineSink<W> {
    out: W,
}

impl<W: Write> LineSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> SampleSink for LineSink<W> {
    fn emit(&mut self, reference_index: u64, wss_bytes: u64) {
        // the output contract is best-effort: a broken pipe shouldn't
        // unwind through the hot path, so failures are logged, not
        // propagated.
        if let Err(e) = writeln!(self.out, "{reference_index},{wss_bytes}") {
            log::warn!("failed to write sample: {e}");
        }
    }
}

/// An in-memory sink, useful for tests and for collecting samples to
/// post-process (e.g. plotting) without touching I/O.
#[derive(Default)]
pub struct VecSink {
    pub samples: Vec<(u64, u64)>,
}

impl SampleSink for VecSink {
    fn emit(&mut self, reference_index: u64, wss_bytes: u64) {
        self.samples.push((reference_index, wss_bytes));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_sink_writes_csv_lines() {
        let mut buf = Vec::new();
        {
            let mut sink = LineSink::new(&mut buf);
            sink.emit(10, 100);
            sink.emit(20, 150);
        }
        assert_eq!(String::from_utf8(buf).unwrap(), "10,100\n20,150\n");
    }

    #[test]
    fn vec_sink_collects_samples() {
        let mut sink = VecSink::default();
        sink.emit(1, 2);
        sink.emit(3, 4);
        assert_eq!(sink.samples, vec![(1, 2), (3, 4)]);
    }
}
