// src/load/mod.rs
//! Pieces shared by the census and election loaders: output sinks, the
//! per-session dedup container, the malformed-row policy and load summaries.

pub mod dedup;
pub mod output;

pub use dedup::LookupSet;
pub use output::{CsvSink, OutputMode};

use anyhow::{bail, Context, Result};
use csv::{Reader, ReaderBuilder};
use glob::glob;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    path::{Path, PathBuf},
};
use tracing::warn;

use crate::error::LoadError;

/// What to do with a row that cannot be turned into an output row.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorPolicy {
    /// Abort the whole load on the first bad row.
    #[default]
    FailFast,
    /// Log the row, count it and keep going.
    SkipAndReport,
}

impl ErrorPolicy {
    /// Either swallow a row-level error (counting it) or hand it back.
    pub fn handle(self, err: LoadError, summary: &mut LoadSummary) -> Result<(), LoadError> {
        match self {
            ErrorPolicy::SkipAndReport if err.is_row_error() => {
                warn!(file = %summary.file.display(), error = %err, "skipping malformed row");
                summary.malformed += 1;
                Ok(())
            }
            _ => Err(err),
        }
    }
}

/// Counters for one input file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub file: PathBuf,
    /// Data rows read, excluding the header and blank lines.
    pub rows_read: u64,
    /// Rows written to the main output.
    pub accepted: u64,
    /// Rows rejected by the dataset filter.
    pub filtered: u64,
    /// Rows skipped under `ErrorPolicy::SkipAndReport`.
    pub malformed: u64,
    /// Rows dropped because their content looked wrong (merged polls with votes).
    pub anomalies: u64,
}

impl LoadSummary {
    pub fn new(file: impl Into<PathBuf>) -> Self {
        Self {
            file: file.into(),
            ..Default::default()
        }
    }
}

/// Total accepted rows across a session.
pub fn total_accepted(summaries: &[LoadSummary]) -> u64 {
    summaries.iter().map(|s| s.accepted).sum()
}

/// Open a source CSV. Records may vary in length; callers check field counts.
pub fn open_source(path: &Path) -> Result<Reader<File>, LoadError> {
    let file = File::open(path)?;
    Ok(ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(file))
}

/// Expand glob patterns into a sorted, de-duplicated list of files.
///
/// Sorting fixes which file truncates the outputs and which ones append.
pub fn expand_inputs<S: AsRef<str>>(patterns: &[S]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for pattern in patterns {
        let pattern = pattern.as_ref();
        let paths = glob(pattern).with_context(|| format!("bad input pattern {}", pattern))?;
        for entry in paths {
            let path = entry.with_context(|| format!("reading match for {}", pattern))?;
            if path.is_file() {
                files.push(path);
            }
        }
    }
    files.sort();
    files.dedup();
    if files.is_empty() {
        let shown: Vec<&str> = patterns.iter().map(|p| p.as_ref()).collect();
        bail!("no input files match {:?}", shown);
    }
    Ok(files)
}
