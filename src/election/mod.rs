// src/election/mod.rs
//! Elections Canada poll-by-poll results (`pollresults_resultatsbureau*.csv`)
//! → `election_data`.

pub mod poll;
pub mod region;

pub use poll::{candidate_name, normalize_poll};
pub use region::province_for_district;

use anyhow::{Context, Result};
use csv::StringRecord;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, instrument, trace, warn};

use crate::{
    error::LoadError,
    load::{self, CsvSink, ErrorPolicy, LoadSummary, OutputMode},
    sql,
};

/// Source column positions in the poll results files.
mod col {
    pub const DISTRICT: usize = 0;
    pub const POLL: usize = 3;
    pub const VOID: usize = 5;
    pub const MERGED_WITH: usize = 7;
    pub const FAMILY_NAME: usize = 10;
    pub const FIRST_NAME: usize = 12;
    pub const PARTY: usize = 13;
    pub const VOTES: usize = 17;
    /// Fewest fields a usable row can have.
    pub const MIN_FIELDS: usize = VOTES + 1;
}

pub const DEFAULT_INPUT: &str = "pollresults_*.csv";

/// The general elections whose poll results can be loaded.
///
/// In a run plan it is written `ge43`/`ge44` or as the year, quoted or not.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case", try_from = "ElectionKey")]
pub enum Election {
    /// 43rd general election, 2019.
    #[value(alias = "2019")]
    Ge43,
    /// 44th general election, 2021.
    #[value(alias = "2021")]
    Ge44,
}

/// How an election may be spelled in YAML.
#[derive(Deserialize)]
#[serde(untagged)]
pub enum ElectionKey {
    Year(u64),
    Name(String),
}

impl TryFrom<ElectionKey> for Election {
    type Error = String;

    fn try_from(key: ElectionKey) -> Result<Self, Self::Error> {
        match key {
            ElectionKey::Year(2019) => Ok(Election::Ge43),
            ElectionKey::Year(2021) => Ok(Election::Ge44),
            ElectionKey::Name(name) => match name.as_str() {
                "ge43" | "2019" => Ok(Election::Ge43),
                "ge44" | "2021" => Ok(Election::Ge44),
                _ => Err(format!("unknown election `{}`, expected ge43, ge44, 2019 or 2021", name)),
            },
            ElectionKey::Year(year) => Err(format!("no poll results for {}, expected 2019 or 2021", year)),
        }
    }
}

impl Election {
    pub fn id(self) -> &'static str {
        match self {
            Election::Ge43 => "43",
            Election::Ge44 => "44",
        }
    }

    /// 2021 keeps zero-vote rows of merged polls (with a normalized
    /// merged-with id) so their shares can be filled in from the poll they
    /// were merged into. 2019 drops every merged row.
    pub fn keeps_merged_polls(self) -> bool {
        matches!(self, Election::Ge44)
    }
}

/// `election_data` row in `\copy` column order.
#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct PollRow<'a> {
    pub election_id: &'static str,
    pub region_id: &'static str,
    pub ed_id: &'a str,
    pub va_id: String,
    pub category: &'static str,
    pub candidate: String,
    pub party: &'a str,
    pub votes: u64,
    pub merged_id: String,
}

/// What became of one source row.
#[derive(Debug, PartialEq, Eq)]
pub enum Mapped<'a> {
    Row(PollRow<'a>),
    /// Row of a merged poll, dropped without comment.
    Merged,
    /// Merged poll that still reports votes; dropped and reported.
    Anomaly,
}

fn field(record: &StringRecord, idx: usize) -> &str {
    record.get(idx).unwrap_or_default()
}

/// Map one source row to its `election_data` row.
pub fn map_row(election: Election, record: &StringRecord) -> Result<Mapped<'_>, LoadError> {
    let line = record.position().map_or(0, |p| p.line());
    if record.len() < col::MIN_FIELDS {
        return Err(LoadError::MalformedRow {
            line,
            reason: format!("{} fields, expected at least {}", record.len(), col::MIN_FIELDS),
        });
    }

    let ed = field(record, col::DISTRICT);
    let region = province_for_district(ed)?;
    let raw_votes = field(record, col::VOTES);
    let votes: u64 = raw_votes
        .trim()
        .parse()
        .map_err(|_| LoadError::InvalidVotes {
            line,
            value: raw_votes.to_string(),
        })?;

    // void polls all report zero votes
    if field(record, col::VOID) == "Y" {
        trace!(line, ed, poll = field(record, col::POLL), "void poll");
    }

    let raw_merged = field(record, col::MERGED_WITH);
    let merged = if election.keeps_merged_polls() {
        normalize_poll(raw_merged)
    } else {
        raw_merged.to_string()
    };
    if !merged.is_empty() {
        if votes > 0 {
            return Ok(Mapped::Anomaly);
        }
        if !election.keeps_merged_polls() {
            return Ok(Mapped::Merged);
        }
    }

    Ok(Mapped::Row(PollRow {
        election_id: election.id(),
        region_id: region,
        ed_id: ed,
        va_id: normalize_poll(field(record, col::POLL)),
        category: "",
        candidate: candidate_name(field(record, col::FIRST_NAME), field(record, col::FAMILY_NAME)),
        party: field(record, col::PARTY),
        votes,
        merged_id: merged,
    }))
}

/// Load one poll results file into `import-data.csv` in `out_dir`.
#[instrument(level = "info", skip_all, fields(file = %path.display(), election = ?election, mode = ?mode))]
pub fn load_election_file(
    path: &Path,
    election: Election,
    mode: OutputMode,
    out_dir: &Path,
    policy: ErrorPolicy,
) -> Result<LoadSummary, LoadError> {
    info!("loading {}", path.display());
    let mut summary = LoadSummary::new(path);

    let mut rdr = load::open_source(path)?;
    let mut data = CsvSink::open(out_dir.join(sql::DATA_CSV), mode)?;

    for result in rdr.records() {
        // truly blank lines never reach here; comma-only rows fail in map_row
        let record = result?;
        summary.rows_read += 1;

        match map_row(election, &record) {
            Ok(Mapped::Row(row)) => {
                data.write(&row)?;
                summary.accepted += 1;
            }
            Ok(Mapped::Merged) => summary.filtered += 1,
            Ok(Mapped::Anomaly) => {
                warn!(record = ?record, "merged poll reports votes, dropping");
                summary.anomalies += 1;
            }
            Err(e) => policy.handle(e, &mut summary)?,
        }
    }
    data.finish()?;

    info!(
        rows_read = summary.rows_read,
        merged = summary.filtered,
        anomalies = summary.anomalies,
        malformed = summary.malformed,
        "{} rows prepared",
        summary.accepted
    );
    Ok(summary)
}

/// Load every results file of `election` back to back and write `import.sql`.
pub fn load_election(
    files: &[impl AsRef<Path>],
    election: Election,
    out_dir: &Path,
    policy: ErrorPolicy,
) -> Result<Vec<LoadSummary>> {
    sql::write_script(out_dir, &sql::election_script(election))?;

    let mut summaries = Vec::with_capacity(files.len());
    for (i, file) in files.iter().enumerate() {
        let file = file.as_ref();
        let summary = load_election_file(file, election, OutputMode::for_index(i), out_dir, policy)
            .with_context(|| format!("loading poll results {}", file.display()))?;
        summaries.push(summary);
    }

    info!(
        files = summaries.len(),
        "{} rows prepared, run psql -d census -f {}",
        load::total_accepted(&summaries),
        sql::SQL_FILE
    );
    Ok(summaries)
}
