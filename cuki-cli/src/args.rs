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

//! Hand-rolled `--flag value` argument parsing, in the same spirit as a
//! config layer that parses flag pairs itself rather than pulling in a
//! framework for four options.

use std::path::PathBuf;

#[derive(Debug, Clone)]
pub enum TraceSource {
    Synthetic {
        seed: u64,
        key_space: u64,
        min_size: u64,
        max_size: u64,
        length: u64,
    },
    Csv(PathBuf),
}

#[derive(Debug, Clone)]
pub struct Args {
    pub trace: TraceSource,
    pub config: Option<PathBuf>,
    pub threads: usize,
    pub out: Option<PathBuf>,
}

/// Parses an argument iterator (excluding `argv[0]`) into [`Args`].
///
/// Recognised flags: `--trace <synthetic|path>`, `--config <yaml>`,
/// `--threads <n>`, `--out <path>`, `--seed`, `--key-space`, `--min-size`,
/// `--max-size`, `--length` (the last five only apply to `--trace
/// synthetic`).
pub fn parse<I: Iterator<Item = String>>(mut args: I) -> Result<Args, String> {
    let mut trace: Option<TraceSource> = None;
    let mut config = None;
    let mut threads = 4usize;
    let mut out = None;
    let mut seed = 0u64;
    let mut key_space = 10_000u64;
    let mut min_size = 1u64;
    let mut max_size = 4096u64;
    let mut length = 100_000u64;

    while let Some(flag) = args.next() {
        let mut value = || args.next().ok_or_else(|| format!("{flag} requires a value"));
        match flag.as_str() {
            "--trace" => {
                let v = value()?;
                trace = Some(if v == "synthetic" {
                    // placeholder; filled in once the whole flag set is parsed
                    TraceSource::Synthetic {
                        seed,
                        key_space,
                        min_size,
                        max_size,
                        length,
                    }
                } else {
                    TraceSource::Csv(PathBuf::from(v))
                });
            }
            "--config" => config = Some(PathBuf::from(value()?)),
            "--threads" => {
                threads = value()?
                    .parse()
                    .map_err(|e| format!("bad --threads value: {e}"))?;
            }
            "--out" => out = Some(PathBuf::from(value()?)),
            "--seed" => seed = value()?.parse().map_err(|e| format!("bad --seed: {e}"))?,
            "--key-space" => {
                key_space = value()?
                    .parse()
                    .map_err(|e| format!("bad --key-space: {e}"))?
            }
            "--min-size" => {
                min_size = value()?
                    .parse()
                    .map_err(|e| format!("bad --min-size: {e}"))?
            }
            "--max-size" => {
                max_size = value()?
                    .parse()
                    .map_err(|e| format!("bad --max-size: {e}"))?
            }
            "--length" => {
                length = value()?
                    .parse()
                    .map_err(|e| format!("bad --length: {e}"))?
            }
            other => return Err(format!("unrecognised flag: {other}")),
        }
    }

    // re-resolve synthetic params now that the whole flag set has been seen,
    // since --seed etc. may appear after --trace synthetic.
    if let Some(TraceSource::Synthetic { .. }) = trace {
        trace = Some(TraceSource::Synthetic {
            seed,
            key_space,
            min_size,
            max_size,
            length,
        });
    }

    if threads == 0 {
        return Err("--threads must be nonzero".into());
    }

    Ok(Args {
        trace: trace.ok_or("--trace is required (synthetic or a CSV path)")?,
        config,
        threads,
        out,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(s: &str) -> impl Iterator<Item = String> + '_ {
        s.split_whitespace().map(String::from)
    }

    #[test]
    fn parses_synthetic_trace_with_overrides() {
        let a = parse(argv("--trace synthetic --seed 7 --threads 2")).unwrap();
        assert_eq!(a.threads, 2);
        match a.trace {
            TraceSource::Synthetic { seed, .. } => assert_eq!(seed, 7),
            _ => panic!("expected synthetic"),
        }
    }

    #[test]
    fn parses_csv_trace_path() {
        let a = parse(argv("--trace trace.csv --out out.csv")).unwrap();
        match a.trace {
            TraceSource::Csv(p) => assert_eq!(p, PathBuf::from("trace.csv")),
            _ => panic!("expected csv"),
        }
        assert_eq!(a.out, Some(PathBuf::from("out.csv")));
    }

    #[test]
    fn rejects_missing_trace() {
        assert!(parse(argv("--threads 2")).is_err());
    }

    #[test]
    fn rejects_unknown_flag() {
        assert!(parse(argv("--trace synthetic --bogus 1")).is_err());
    }
}
