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

//! Trace-driven command-line runner for the `cuki` working-set-size
//! estimator: parses flags, builds a `Facade`, drives one or more trace
//! readers through it across a configurable number of producer threads, and
//! writes the resulting WSS samples to the configured sink.

mod args;

use args::TraceSource;
use cuki::sink::{LineSink, SampleSink, VecSink};
use cuki::trace::{CsvReader, SyntheticReader, TraceReader, TraceRecord};
use cuki::{Config, Facade};
use libsky::util::terminal;
use libsky::{CukiResult, URL, VERSION};
use std::env;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::process;
use std::sync::Arc;

fn main() {
    env_logger::Builder::new()
        .parse_filters(&env::var("CUKI_LOG").unwrap_or_else(|_| "info".to_owned()))
        .init();

    if let Err(e) = run() {
        log::error!("{e}");
        terminal::write_error(format!("cuki-cli: {e}\n")).ok();
        process::exit(1);
    }
}

fn run() -> CukiResult<()> {
    let args = args::parse(env::args().skip(1)).map_err(|e| -> Box<dyn std::error::Error> { e.into() })?;

    terminal::write_info(format!("cuki v{VERSION} | {URL}\n")).ok();

    let cfg = load_config(args.config.as_deref())?;
    cfg.validate()?;

    let records = collect_records(&args.trace)?;
    log::info!(
        "loaded {} trace records, fanning out across {} threads",
        records.len(),
        args.threads
    );

    let facade = Arc::new(Facade::new(&cfg));
    let chunks = partition(records, args.threads);

    let samples: Vec<(u64, u64)> = std::thread::scope(|scope| {
        let handles: Vec<_> = chunks
            .into_iter()
            .map(|chunk| {
                let facade = Arc::clone(&facade);
                scope.spawn(move || drive(&facade, chunk))
            })
            .collect();
        handles.into_iter().flat_map(|h| h.join().unwrap()).collect()
    });

    write_samples(args.out.as_deref(), samples, &facade)?;
    Ok(())
}

/// Loads a [`Config`] from a YAML file if `path` is given, else the
/// built-in default.
fn load_config(path: Option<&std::path::Path>) -> CukiResult<Config> {
    match path {
        Some(p) => {
            log::info!("loading configuration from {}", p.display());
            let file = File::open(p)?;
            let cfg: Config = serde_yaml::from_reader(BufReader::new(file))?;
            Ok(cfg)
        }
        None => {
            log::warn!("no --config supplied, using default settings");
            Ok(Config::default())
        }
    }
}

/// Eagerly drains a trace source into memory so it can be sliced across
/// producer threads.
fn collect_records(source: &TraceSource) -> CukiResult<Vec<TraceRecord>> {
    let mut out = Vec::new();
    match source {
        TraceSource::Synthetic {
            seed,
            key_space,
            min_size,
            max_size,
            length,
        } => {
            let mut reader = SyntheticReader::new(*seed, *key_space, *min_size, *max_size, *length);
            while let Some(rec) = reader.next_record()? {
                out.push(rec);
            }
        }
        TraceSource::Csv(path) => {
            let file = File::open(path)?;
            let mut reader = CsvReader::new(BufReader::new(file));
            while let Some(rec) = reader.next_record()? {
                out.push(rec);
            }
        }
    }
    Ok(out)
}

/// Splits `records` into up to `threads` contiguous, roughly equal chunks.
fn partition(records: Vec<TraceRecord>, threads: usize) -> Vec<Vec<TraceRecord>> {
    if records.is_empty() {
        return Vec::new();
    }
    let chunk_len = records.len().div_ceil(threads).max(1);
    records
        .chunks(chunk_len)
        .map(|c| c.to_vec())
        .collect()
}

/// Drives one thread's share of the trace through the shared facade,
/// collecting its own samples into an in-memory sink.
fn drive(facade: &Facade, records: Vec<TraceRecord>) -> Vec<(u64, u64)> {
    let mut sink = VecSink::default();
    for rec in records {
        facade.access(&rec.key, rec.size, &mut sink);
    }
    sink.samples
}

/// Merges per-thread samples into reference-index order and writes them to
/// `path` (or stdout if `None`), followed by one final unconditional line.
fn write_samples(
    path: Option<&std::path::Path>,
    mut samples: Vec<(u64, u64)>,
    facade: &Facade,
) -> CukiResult<()> {
    samples.sort_unstable_by_key(|(idx, _)| *idx);

    match path {
        Some(p) => {
            let file = BufWriter::new(File::create(p)?);
            let mut sink = LineSink::new(file);
            for (idx, wss) in samples {
                sink.emit(idx, wss);
            }
            facade.finish(&mut sink);
        }
        None => {
            let stdout = std::io::stdout();
            let mut sink = LineSink::new(BufWriter::new(stdout.lock()));
            for (idx, wss) in samples {
                sink.emit(idx, wss);
            }
            facade.finish(&mut sink);
        }
    }
    Ok(())
}
