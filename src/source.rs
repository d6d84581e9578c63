use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::parser::{self, SearchLogEntry};

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
}

/// A row the reader could not decode; it never reaches the filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowError {
    pub origin: String,
    pub line_number: usize,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct SourceBatch {
    pub entries: Vec<SearchLogEntry>,
    pub skipped: Vec<RowError>,
}

/// Read path for search-log rows. `since` lets a store prune by timestamp; the
/// filter re-checks the window either way.
pub trait SearchLogSource {
    fn fetch(&self, since: DateTime<Utc>) -> Result<SourceBatch, SourceError>;
}

/// In-process log, filled by the web layer or by tests.
#[derive(Debug, Default, Clone)]
pub struct MemoryLog {
    entries: Vec<SearchLogEntry>,
    skipped: Vec<RowError>,
}

impl MemoryLog {
    pub fn new() -> Self { Self::default() }

    pub fn from_entries(entries: Vec<SearchLogEntry>) -> Self {
        Self { entries, skipped: Vec::new() }
    }

    pub fn push(&mut self, entry: SearchLogEntry) {
        self.entries.push(entry);
    }

    /// Decode and append one JSON row. Returns false when the row was skipped.
    pub fn push_line(&mut self, line: &str) -> bool {
        let line_number = self.entries.len() + self.skipped.len() + 1;
        match parser::parse_entry(line) {
            Ok(entry) => {
                self.entries.push(entry);
                true
            }
            Err(e) => {
                self.skipped.push(RowError { origin: "memory".into(), line_number, message: e.to_string() });
                false
            }
        }
    }

    pub fn len(&self) -> usize { self.entries.len() }

    pub fn is_empty(&self) -> bool { self.entries.is_empty() }
}

impl SearchLogSource for MemoryLog {
    fn fetch(&self, since: DateTime<Utc>) -> Result<SourceBatch, SourceError> {
        Ok(SourceBatch {
            entries: self.entries.iter().filter(|e| e.searched_at >= since).cloned().collect(),
            skipped: self.skipped.clone(),
        })
    }
}

/// JSON-lines files, one row per line. `-` reads stdin.
#[derive(Debug, Clone)]
pub struct JsonlLog {
    paths: Vec<PathBuf>,
}

impl JsonlLog {
    pub fn new<P: Into<PathBuf>>(paths: impl IntoIterator<Item = P>) -> Self {
        Self { paths: paths.into_iter().map(Into::into).collect() }
    }

    pub fn stdin() -> Self {
        Self::new(["-"])
    }
}

impl SearchLogSource for JsonlLog {
    fn fetch(&self, since: DateTime<Utc>) -> Result<SourceBatch, SourceError> {
        let mut batch = SourceBatch::default();
        for p in &self.paths {
            let origin = p.display().to_string();
            let lines = read_raw_lines(p).map_err(|source| SourceError::Io { path: origin.clone(), source })?;
            decode_lines(&origin, &lines, since, &mut batch);
        }
        tracing::debug!(
            files = self.paths.len(),
            entries = batch.entries.len(),
            skipped = batch.skipped.len(),
            "fetched search log"
        );
        Ok(batch)
    }
}

fn read_raw_lines(path: &Path) -> io::Result<Vec<Vec<u8>>> {
    // Raw bytes: a row that is not UTF-8 is skipped later, not a read failure.
    if path.as_os_str() == "-" {
        let stdin = io::stdin();
        let reader = stdin.lock();
        return reader.split(b'\n').collect();
    }
    let f = File::open(path)?;
    // Larger buffer reduces syscalls on big files.
    BufReader::with_capacity(1 << 20, f).split(b'\n').collect()
}

/// Parse in parallel; collecting an indexed iterator keeps input order.
fn decode_lines(origin: &str, lines: &[Vec<u8>], since: DateTime<Utc>, batch: &mut SourceBatch) {
    let decoded: Vec<(usize, Result<SearchLogEntry, parser::EntryError>)> = lines
        .par_iter()
        .enumerate()
        .filter_map(|(i, raw)| match std::str::from_utf8(raw) {
            Ok(l) if l.trim().is_empty() => None,
            Ok(l) => Some((i + 1, parser::parse_entry(l))),
            Err(e) => Some((i + 1, Err(parser::EntryError::InvalidUtf8(e)))),
        })
        .collect();
    for (line_number, res) in decoded {
        match res {
            Ok(entry) if entry.searched_at >= since => batch.entries.push(entry),
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(origin, line_number, error = %e, "skipping malformed search-log row");
                batch.skipped.push(RowError { origin: origin.to_string(), line_number, message: e.to_string() });
            }
        }
    }
}
