// src/plan.rs
//! Which datasets to load, from CLI flags or a YAML run plan.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::info;

use crate::{
    census::{self, CensusFilter},
    election::{self, Election},
    load::{self, ErrorPolicy, LoadSummary},
};

fn default_out_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_census_id() -> u32 {
    1
}

/// A list of datasets loaded one after another.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunPlan {
    #[serde(default = "default_out_dir")]
    pub out_dir: PathBuf,
    #[serde(default)]
    pub error_policy: ErrorPolicy,
    pub datasets: Vec<Dataset>,
}

/// One dataset; its input files share a single dedup session.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Dataset {
    Census {
        #[serde(default)]
        filter: CensusFilter,
        #[serde(default = "default_census_id")]
        census_id: u32,
        /// Glob patterns; empty means the filter's usual file.
        #[serde(default)]
        inputs: Vec<String>,
        #[serde(default)]
        out_dir: Option<PathBuf>,
    },
    Election {
        election: Election,
        #[serde(default)]
        inputs: Vec<String>,
        #[serde(default)]
        out_dir: Option<PathBuf>,
    },
}

impl Dataset {
    /// Input patterns, falling back to the dataset's published file names.
    pub fn input_patterns(&self) -> Vec<String> {
        let inputs = match self {
            Dataset::Census { inputs, .. } | Dataset::Election { inputs, .. } => inputs,
        };
        if !inputs.is_empty() {
            return inputs.clone();
        }
        match self {
            Dataset::Census { filter, .. } => filter
                .default_inputs()
                .iter()
                .map(|s| s.to_string())
                .collect(),
            Dataset::Election { .. } => vec![election::DEFAULT_INPUT.to_string()],
        }
    }

    fn out_dir<'a>(&'a self, fallback: &'a Path) -> &'a Path {
        match self {
            Dataset::Census { out_dir, .. } | Dataset::Election { out_dir, .. } => {
                out_dir.as_deref().unwrap_or(fallback)
            }
        }
    }

    /// Load every input file of this dataset and write `import.sql`.
    pub fn run(&self, out_dir: &Path, policy: ErrorPolicy) -> Result<Vec<LoadSummary>> {
        let out_dir = self.out_dir(out_dir);
        fs::create_dir_all(out_dir)
            .with_context(|| format!("creating output directory {}", out_dir.display()))?;

        let files = load::expand_inputs(&self.input_patterns())?;
        info!(files = files.len(), out_dir = %out_dir.display(), "dataset {:?}", self);

        match self {
            Dataset::Census {
                filter, census_id, ..
            } => census::load_census(&files, *filter, *census_id, out_dir, policy),
            Dataset::Election { election, .. } => {
                election::load_election(&files, *election, out_dir, policy)
            }
        }
    }
}

impl RunPlan {
    /// A plan with one dataset and default settings.
    pub fn single(dataset: Dataset) -> Self {
        Self {
            out_dir: default_out_dir(),
            error_policy: ErrorPolicy::default(),
            datasets: vec![dataset],
        }
    }

    /// Replace the plan's settings with whichever ones were given on the
    /// command line.
    pub fn with_overrides(mut self, out_dir: Option<PathBuf>, error_policy: Option<ErrorPolicy>) -> Self {
        if let Some(out_dir) = out_dir {
            self.out_dir = out_dir;
        }
        if let Some(error_policy) = error_policy {
            self.error_policy = error_policy;
        }
        self
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        serde_yaml::from_str(text).context("parsing run plan")
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading run plan {}", path.display()))?;
        Self::from_yaml(&text).with_context(|| format!("in {}", path.display()))
    }

    /// Run every dataset in order, stopping at the first failure.
    pub fn run(&self) -> Result<Vec<LoadSummary>> {
        let mut all = Vec::new();
        for (i, dataset) in self.datasets.iter().enumerate() {
            let summaries = dataset
                .run(&self.out_dir, self.error_policy)
                .with_context(|| format!("dataset #{} of the run plan", i + 1))?;
            all.extend(summaries);
        }
        Ok(all)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql;
    use tempfile::tempdir;

    #[test]
    fn test_parse_plan() -> Result<()> {
        let plan = RunPlan::from_yaml(
            r#"
out_dir: out
error_policy: skip-and-report
datasets:
  - kind: census
    filter: subdivision
  - kind: census
    filter: dissemination-area
    census_id: 2
    out_dir: da
  - kind: election
    election: ge44
    inputs: ["results/pollresults_*.csv"]
"#,
        )?;
        assert_eq!(plan.out_dir, PathBuf::from("out"));
        assert_eq!(plan.error_policy, ErrorPolicy::SkipAndReport);
        assert_eq!(plan.datasets.len(), 3);
        assert_eq!(
            plan.datasets[0],
            Dataset::Census {
                filter: CensusFilter::Subdivision,
                census_id: 1,
                inputs: vec![],
                out_dir: None,
            }
        );
        assert_eq!(
            plan.datasets[0].input_patterns(),
            vec!["98-401-X2021003_English_CSV_data.csv"]
        );
        assert_eq!(
            plan.datasets[1].input_patterns(),
            vec!["98-401-X2021006_English_CSV_data*.csv"]
        );
        assert_eq!(
            plan.datasets[2].input_patterns(),
            vec!["results/pollresults_*.csv"]
        );
        Ok(())
    }

    #[test]
    fn test_plan_defaults() -> Result<()> {
        let plan = RunPlan::from_yaml("datasets:\n  - kind: election\n    election: 2019\n")?;
        assert!(matches!(
            plan.datasets[0],
            Dataset::Election {
                election: Election::Ge43,
                ..
            }
        ));
        assert_eq!(plan.out_dir, PathBuf::from("."));
        assert_eq!(plan.error_policy, ErrorPolicy::FailFast);
        assert_eq!(plan.datasets[0].input_patterns(), vec!["pollresults_*.csv"]);
        Ok(())
    }

    #[test]
    fn test_overrides_replace_only_given_settings() -> Result<()> {
        let text = "out_dir: out\nerror_policy: fail-fast\ndatasets:\n  - kind: election\n    election: ge43\n";

        let plan = RunPlan::from_yaml(text)?.with_overrides(None, Some(ErrorPolicy::SkipAndReport));
        assert_eq!(plan.out_dir, PathBuf::from("out"));
        assert_eq!(plan.error_policy, ErrorPolicy::SkipAndReport);

        let plan = RunPlan::from_yaml(text)?.with_overrides(Some(PathBuf::from("elsewhere")), None);
        assert_eq!(plan.out_dir, PathBuf::from("elsewhere"));
        assert_eq!(plan.error_policy, ErrorPolicy::FailFast);

        let plan = RunPlan::single(Dataset::Election {
            election: Election::Ge44,
            inputs: vec![],
            out_dir: None,
        })
        .with_overrides(None, None);
        assert_eq!(plan.out_dir, PathBuf::from("."));
        assert_eq!(plan.error_policy, ErrorPolicy::FailFast);
        Ok(())
    }

    #[test]
    fn test_plan_rejects_unknown_filter() {
        assert!(RunPlan::from_yaml("datasets:\n  - kind: census\n    filter: township\n").is_err());
    }

    #[test]
    fn test_run_plan_creates_out_dir() -> Result<()> {
        let src = tempdir()?;
        let out = tempdir()?;
        let input = src.path().join("profile.csv");
        fs::write(
            &input,
            "ALT_GEO_CODE,GEO_LEVEL,GEO_NAME,CHARACTERISTIC_ID,CHARACTERISTIC_NAME,C1_COUNT_TOTAL,C10_RATE_TOTAL\n\
             62,Territory,Nunavut,1,\"Population, 2021\",36858,\n",
        )?;
        let plan = RunPlan {
            out_dir: out.path().join("nested"),
            error_policy: ErrorPolicy::FailFast,
            datasets: vec![Dataset::Census {
                filter: CensusFilter::Province,
                census_id: 1,
                inputs: vec![input.display().to_string()],
                out_dir: None,
            }],
        };

        let summaries = plan.run()?;
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].accepted, 1);
        let data = fs::read_to_string(out.path().join("nested").join(sql::DATA_CSV))?;
        assert_eq!(data, "1,1,Province,62,36858,\n");
        Ok(())
    }
}
