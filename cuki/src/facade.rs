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

//! The WSS/IRR estimator facade.
//!
//! Drives the CCF from an input stream of `(key, size)` pairs, forwards the
//! aging decision to the [`AgingController`], and emits
//! `(reference_index, wss_bytes)` samples to a [`crate::sink::SampleSink`]
//! at the configured cadence.

pub mod irr;

use crate::aging::AgingController;
use crate::ccf::Ccf;
use crate::config::Config;
use crate::sink::SampleSink;
use irr::IrrHistogram;

pub struct Facade {
    ccf: Ccf,
    aging: AgingController,
    irr: IrrHistogram,
    sample_every: u64,
}

impl Facade {
    pub fn new(cfg: &Config) -> Self {
        Self {
            ccf: Ccf::new(cfg),
            aging: AgingController::from_config(cfg),
            irr: IrrHistogram::new(),
            sample_every: (cfg.report_interval / cfg.time_divisor).max(1),
        }
    }

    pub fn ccf(&self) -> &Ccf {
        &self.ccf
    }

    pub fn irr(&self) -> &IrrHistogram {
        &self.irr
    }

    /// Feed one `(key, size)` access, driving the CCF, the aging
    /// controller, and the IRR histogram, and emitting a sample to `sink`
    /// if a report boundary was just crossed.
    pub fn access(&self, key: &[u8], size: u64, sink: &mut dyn SampleSink) {
        self.ccf.put(key, size);
        let refs = self.ccf.references();
        self.aging.on_reference(&self.ccf, refs);
        self.irr.touch(key, refs);
        if refs.is_multiple_of(self.sample_every) {
            sink.emit(refs, self.ccf.wss());
        }
    }

    /// Emit one final sample regardless of cadence, covering the "final
    /// line on input EOF".
    pub fn finish(&self, sink: &mut dyn SampleSink) {
        sink.emit(self.ccf.references(), self.ccf.wss());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::LineSink;

    #[test]
    fn samples_at_configured_cadence() {
        let cfg = Config {
            num_buckets: 64,
            lock_number: 8,
            report_interval: 4,
            time_divisor: 1,
            ..Default::default()
        };
        let facade = Facade::new(&cfg);
        let mut buf = Vec::new();
        let mut sink = LineSink::new(&mut buf);
        for i in 0..10u32 {
            facade.access(&i.to_le_bytes(), 1, &mut sink);
        }
        let text = String::from_utf8(buf).unwrap();
        // samples fire at references 4 and 8 (refs counted 1-based)
        assert_eq!(text.lines().count(), 2);
    }
}
