// src/sql/mod.rs
//! `import.sql` generation. Each destination table is loaded through a temp
//! table because `\copy` cannot skip rows that violate a unique constraint;
//! the temp table is then merged with `insert ... on conflict do nothing`.

mod election;

pub use election::election_script;

use anyhow::{Context, Result};
use std::{fs, path::Path};

pub const DATA_CSV: &str = "import-data.csv";
pub const TRAIT_CSV: &str = "import-trait.csv";
pub const GEO_CSV: &str = "import-geo.csv";
pub const SQL_FILE: &str = "import.sql";

/// A destination table and the temp table + CSV that feed it.
#[derive(Debug, Clone, Copy)]
pub struct Staging<'a> {
    pub temp: &'a str,
    pub dest: &'a str,
    pub columns: &'a [&'a str],
    pub csv: &'a str,
}

impl Staging<'_> {
    /// `create temp table` shaped like the destination.
    pub fn create(&self) -> String {
        format!(
            "create temp table {} as select * from {} with no data;\n",
            self.temp, self.dest
        )
    }

    /// psql `\copy` of the CSV into the temp table.
    pub fn copy(&self) -> String {
        format!(
            "\\copy {} ({}) from {} with (format csv);\n",
            self.temp,
            self.columns.join(", "),
            self.csv
        )
    }

    /// Row-for-row merge into the destination.
    pub fn merge(&self) -> String {
        format!(
            "insert into {} select * from {} on conflict do nothing;\n",
            self.dest, self.temp
        )
    }
}

const CENSUS_TABLES: [Staging<'static>; 3] = [
    Staging {
        temp: "tmp_trait",
        dest: "census_trait",
        columns: &["census_id", "id", "name"],
        csv: TRAIT_CSV,
    },
    Staging {
        temp: "temp_geo",
        dest: "census_geo",
        columns: &["census_id", "type", "id", "name"],
        csv: GEO_CSV,
    },
    Staging {
        temp: "temp_data",
        dest: "census_data",
        columns: &["census_id", "trait_id", "geo_type", "geo_id", "value", "rate"],
        csv: DATA_CSV,
    },
];

/// Loads the trait, geo and data CSVs, lookup tables first.
pub fn census_script() -> String {
    let mut sql = String::new();
    for table in &CENSUS_TABLES {
        sql.push_str(&table.create());
        sql.push_str(&table.copy());
        sql.push_str(&table.merge());
        sql.push('\n');
    }
    sql
}

/// Write (truncating) `import.sql` into `out_dir`.
pub fn write_script(out_dir: &Path, sql: &str) -> Result<()> {
    let path = out_dir.join(SQL_FILE);
    fs::write(&path, sql).with_context(|| format!("writing {}", path.display()))
}
