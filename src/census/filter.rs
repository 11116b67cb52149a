// src/census/filter.rs

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::CensusRow;

/// Subdivision names end with a type suffix in parentheses, e.g. "Cobourg, Town (T)".
static SUBDIVISION_TYPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^.*\((\w+)\)$").expect("subdivision type regex should parse"));

/// Subdivision types kept by `CensusFilter::Subdivision`:
/// city, cité, district municipality, town, township, municipality.
const SUBDIVISION_TYPES: &[&str] = &["C", "CY", "DM", "T", "TP", "MU"];

/// Which geography rows of a census profile table are loaded, and how their
/// `GEO_LEVEL` is relabelled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum CensusFilter {
    /// Canada, provinces and territories. Territories are loaded as provinces.
    #[default]
    Province,
    /// 2023 Representation Order ridings, labelled `ED`.
    FederalRiding,
    /// Incorporated subdivisions (cities, towns, ...), labelled `SD`.
    Subdivision,
    /// Dissemination areas, labelled `DA`.
    DisseminationArea,
}

impl CensusFilter {
    /// Returns the (possibly relabelled) row, or `None` to leave it out.
    pub fn apply(self, mut row: CensusRow) -> Option<CensusRow> {
        match self {
            CensusFilter::Province => {
                if row.geo_level == "Territory" {
                    row.geo_level = "Province".into();
                }
                Some(row)
            }
            CensusFilter::FederalRiding => {
                relabel(row, "Federal electoral district (2023 Representation Order)", "ED")
            }
            CensusFilter::Subdivision => {
                let kept = row.geo_level == "Census subdivision"
                    && subdivision_type(&row.geo_name)
                        .is_some_and(|t| SUBDIVISION_TYPES.contains(&t));
                if kept {
                    row.geo_level = "SD".into();
                    Some(row)
                } else {
                    None
                }
            }
            CensusFilter::DisseminationArea => relabel(row, "Dissemination area", "DA"),
        }
    }

    /// Statistics Canada file names of the profile table each filter is meant for.
    pub fn default_inputs(self) -> &'static [&'static str] {
        match self {
            CensusFilter::Province => &["98-401-X2021001_English_CSV_data.csv"],
            CensusFilter::FederalRiding => &["98-401-X2021029_English_CSV_data.csv"],
            CensusFilter::Subdivision => &["98-401-X2021003_English_CSV_data.csv"],
            // shipped split into several parts
            CensusFilter::DisseminationArea => &["98-401-X2021006_English_CSV_data*.csv"],
        }
    }
}

fn relabel(mut row: CensusRow, level: &str, label: &str) -> Option<CensusRow> {
    if row.geo_level == level {
        row.geo_level = label.into();
        Some(row)
    } else {
        None
    }
}

/// The parenthesised suffix of a subdivision name, if any.
pub fn subdivision_type(name: &str) -> Option<&str> {
    SUBDIVISION_TYPE
        .captures(name)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}
