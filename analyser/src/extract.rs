//! The whole extraction run: find trap logs, decode them, write one sorted CSV.

use crate::{Error, Settings, SplRecord, TrapLog};
use glob::MatchOptions;
use std::{
    io,
    path::{Component, Path, PathBuf},
};

const HEADER: [&str; 3] = ["timestamp", "ip", "spl"];

/// `*` matches neither `/` nor a leading `.`, like a shell.
const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: true,
};

/// Absolute form of `path` with `.` and `..` resolved lexically. Symlinks are left alone.
fn absolute(path: &Path) -> PathBuf {
    let path = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());

    let mut normal = PathBuf::new();

    for component in path.components() {
        match component {
            Component::CurDir => (),
            Component::ParentDir => {
                normal.pop();
            }
            other => normal.push(other),
        }
    }

    normal
}

/// Expand glob patterns into the list of files to read.
///
/// The output file is left out even if a pattern matches it. Invalid patterns match nothing.
/// Files matched by more than one pattern are listed once per match.
pub fn input_paths(patterns: &[String], out: &Path) -> Vec<PathBuf> {
    let out = absolute(out);

    let mut paths = Vec::new();

    for pattern in patterns {
        let entries = match glob::glob_with(pattern, MATCH_OPTIONS) {
            Ok(entries) => entries,
            Err(source) => {
                log::warn!(
                    "{}",
                    Error::Pattern {
                        pattern: pattern.clone(),
                        source
                    }
                );

                continue;
            }
        };

        for entry in entries {
            let path = match entry {
                Ok(path) => path,
                Err(e) => {
                    log::debug!("Skipping {}", e);

                    continue;
                }
            };

            if path.is_dir() {
                continue;
            }

            if absolute(&path) == out {
                log::debug!("Skipping output file {}", path.display());

                continue;
            }

            paths.push(path);
        }
    }

    paths
}

fn read_trap_log(path: &Path) -> Result<Vec<SplRecord>, Error> {
    let log = TrapLog::open(path)?;

    log::debug!("Reading {}", log.path().display());

    log.collect()
}

/// Decode every file in turn and sort the readings by timestamp.
///
/// A file that can't be read contributes nothing; the rest of the run carries on. The sort is
/// stable, so readings with equal timestamps keep file order.
pub fn collect_records(paths: &[PathBuf]) -> Vec<SplRecord> {
    let mut records = Vec::new();

    for path in paths {
        match read_trap_log(path) {
            Ok(rows) => {
                log::debug!("{} readings from {}", rows.len(), path.display());

                records.extend(rows);
            }
            // Gone between globbing and opening
            Err(Error::Read { ref source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                log::debug!("{} disappeared, skipping", path.display());
            }
            Err(e) => log::warn!("{}, skipping file", e),
        }
    }

    records.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));

    records
}

/// Write readings to `path`. The header row is always written, even with no readings.
pub fn write_csv(path: &Path, records: &[SplRecord]) -> Result<(), Error> {
    let write_error = |source: csv::Error| Error::Write {
        path: path.to_path_buf(),
        source,
    };

    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .terminator(csv::Terminator::CRLF)
        .from_path(path)
        .map_err(write_error)?;

    wtr.write_record(HEADER).map_err(write_error)?;

    for record in records {
        wtr.serialize(record).map_err(write_error)?;
    }

    wtr.flush().map_err(|e| write_error(e.into()))?;

    Ok(())
}

/// Run a full extraction, returning the number of readings written.
pub fn run(settings: &Settings) -> Result<usize, Error> {
    log::info!(
        "Extracting SPL readings from {} into {}",
        settings.patterns.join(", "),
        settings.out.display()
    );

    let paths = input_paths(&settings.patterns, &settings.out);

    log::info!("Found {} trap logs", paths.len());

    let records = collect_records(&paths);

    write_csv(&settings.out, &records)?;

    log::info!("Done, wrote {}", settings.out.display());

    Ok(records.len())
}
