// src/census/mod.rs
//! Statistics Canada 2021 census profile tables → `census_data`,
//! `census_trait` and `census_geo`.

pub mod filter;

pub use filter::CensusFilter;

use anyhow::{Context, Result};
use csv::StringRecord;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, instrument};

use crate::{
    error::LoadError,
    load::{self, CsvSink, ErrorPolicy, LoadSummary, LookupSet, OutputMode},
    sql,
};

/// The columns of a profile table row that end up in the database.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CensusRow {
    #[serde(rename = "ALT_GEO_CODE")]
    pub alt_geo_code: String,
    #[serde(rename = "GEO_LEVEL")]
    pub geo_level: String,
    #[serde(rename = "GEO_NAME")]
    pub geo_name: String,
    #[serde(rename = "CHARACTERISTIC_ID")]
    pub characteristic_id: String,
    #[serde(rename = "CHARACTERISTIC_NAME")]
    pub characteristic_name: String,
    #[serde(rename = "C1_COUNT_TOTAL")]
    pub count_total: String,
    #[serde(rename = "C10_RATE_TOTAL")]
    pub rate_total: String,
}

/// `census_data` row: `census_id, trait_id, geo_type, geo_id, value, rate`.
#[derive(Debug, Serialize)]
pub struct DataRow<'a> {
    pub census_id: u32,
    pub trait_id: &'a str,
    pub geo_type: &'a str,
    pub geo_id: &'a str,
    pub value: &'a str,
    pub rate: &'a str,
}

/// `census_trait` row, also its lookup key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct TraitRow {
    pub census_id: u32,
    pub id: String,
    pub name: String,
}

/// `census_geo` row, also its lookup key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct GeoRow {
    pub census_id: u32,
    pub geo_type: String,
    pub id: String,
    pub name: String,
}

/// Dedup state for one run over one or more profile files.
#[derive(Debug)]
pub struct CensusSession {
    pub census_id: u32,
    pub traits: LookupSet<TraitRow>,
    pub geos: LookupSet<GeoRow>,
}

impl CensusSession {
    pub fn new(census_id: u32) -> Self {
        Self {
            census_id,
            traits: LookupSet::new(),
            geos: LookupSet::new(),
        }
    }
}

fn parse_row(record: &StringRecord, headers: &StringRecord) -> Result<CensusRow, LoadError> {
    record
        .deserialize(Some(headers))
        .map_err(|e| LoadError::MalformedRow {
            line: record.position().map_or(0, |p| p.line()),
            reason: e.to_string(),
        })
}

/// Load one profile file, writing the three CSVs into `out_dir`.
///
/// Trait and geo rows repeat on nearly every line, so they are dedup-checked
/// here against `session` instead of leaving it all to `on conflict`.
#[instrument(level = "info", skip_all, fields(file = %path.display(), filter = ?filter, mode = ?mode))]
pub fn load_census_file(
    path: &Path,
    filter: CensusFilter,
    mode: OutputMode,
    out_dir: &Path,
    session: &mut CensusSession,
    policy: ErrorPolicy,
) -> Result<LoadSummary, LoadError> {
    info!("loading {}", path.display());
    let mut summary = LoadSummary::new(path);

    let mut rdr = load::open_source(path)?;
    let headers = rdr.headers()?.clone();

    let mut data = CsvSink::open(out_dir.join(sql::DATA_CSV), mode)?;
    let mut traits = CsvSink::open(out_dir.join(sql::TRAIT_CSV), mode)?;
    let mut geos = CsvSink::open(out_dir.join(sql::GEO_CSV), mode)?;

    for result in rdr.records() {
        let record = result?;
        summary.rows_read += 1;
        if summary.rows_read == 1 {
            for (k, v) in headers.iter().zip(record.iter()) {
                debug!("... {}={}", k, v);
            }
        }

        let row = match parse_row(&record, &headers) {
            Ok(row) => row,
            Err(e) => {
                policy.handle(e, &mut summary)?;
                continue;
            }
        };
        let Some(row) = filter.apply(row) else {
            summary.filtered += 1;
            continue;
        };

        let census_id = session.census_id;
        data.write(&DataRow {
            census_id,
            trait_id: &row.characteristic_id,
            geo_type: &row.geo_level,
            geo_id: &row.alt_geo_code,
            value: &row.count_total,
            rate: &row.rate_total,
        })?;
        summary.accepted += 1;

        let trait_row = TraitRow {
            census_id,
            id: row.characteristic_id,
            name: row.characteristic_name,
        };
        if session.traits.first_seen(&trait_row) {
            traits.write(&trait_row)?;
        }

        let geo_row = GeoRow {
            census_id,
            geo_type: row.geo_level,
            id: row.alt_geo_code,
            name: row.geo_name,
        };
        if session.geos.first_seen(&geo_row) {
            geos.write(&geo_row)?;
        }
    }

    data.finish()?;
    let trait_rows = traits.finish()?;
    let geo_rows = geos.finish()?;

    info!(
        rows_read = summary.rows_read,
        accepted = summary.accepted,
        filtered = summary.filtered,
        malformed = summary.malformed,
        trait_rows,
        geo_rows,
        "{} rows prepared",
        summary.accepted
    );
    Ok(summary)
}

/// Load `files` back to back in one session (first truncates, rest append)
/// and write the matching `import.sql`.
pub fn load_census(
    files: &[impl AsRef<Path>],
    filter: CensusFilter,
    census_id: u32,
    out_dir: &Path,
    policy: ErrorPolicy,
) -> Result<Vec<LoadSummary>> {
    sql::write_script(out_dir, &sql::census_script())?;

    let mut session = CensusSession::new(census_id);
    let mut summaries = Vec::with_capacity(files.len());
    for (i, file) in files.iter().enumerate() {
        let file = file.as_ref();
        let summary = load_census_file(
            file,
            filter,
            OutputMode::for_index(i),
            out_dir,
            &mut session,
            policy,
        )
        .with_context(|| format!("loading census file {}", file.display()))?;
        summaries.push(summary);
    }

    info!(
        traits = session.traits.len(),
        geos = session.geos.len(),
        duplicates = session.traits.dropped() + session.geos.dropped(),
        "{} rows prepared, run psql -d census -f {}",
        load::total_accepted(&summaries),
        sql::SQL_FILE
    );
    Ok(summaries)
}
