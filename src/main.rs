use anyhow::Result;
use cadata::{
    census::CensusFilter,
    election::Election,
    load::{ErrorPolicy, LoadSummary},
    plan::{Dataset, RunPlan},
    sql,
};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

/// Prepare Canadian census and election CSVs for `psql -f import.sql`.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Where the import CSVs and import.sql are written [default: . or the plan's out_dir]
    #[arg(long, global = true)]
    out_dir: Option<PathBuf>,

    /// What to do with rows that cannot be parsed [default: fail-fast or the plan's error_policy]
    #[arg(long, global = true, value_enum)]
    error_policy: Option<ErrorPolicy>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load a 2021 census profile table
    Census {
        #[arg(long, value_enum, default_value_t = CensusFilter::Province)]
        filter: CensusFilter,
        #[arg(long, default_value_t = 1)]
        census_id: u32,
        /// Input file or glob; repeatable. Defaults to the filter's profile table.
        #[arg(long = "input")]
        inputs: Vec<String>,
    },
    /// Load poll-by-poll general election results
    Election {
        #[arg(long, value_enum)]
        election: Election,
        /// Input file or glob; repeatable. Defaults to pollresults_*.csv.
        #[arg(long = "input")]
        inputs: Vec<String>,
    },
    /// Load every dataset listed in a YAML run plan
    Run { plan: PathBuf },
}

fn report(summaries: &[LoadSummary]) {
    for s in summaries {
        if s.malformed > 0 || s.anomalies > 0 {
            warn!(
                file = %s.file.display(),
                malformed = s.malformed,
                anomalies = s.anomalies,
                "rows dropped"
            );
        }
    }
}

fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_target(false)
        .init();

    let cli = Cli::parse();

    // ─── 2) build the plan ───────────────────────────────────────────
    // flags given on the command line win over a plan's settings
    let plan = match cli.command {
        Command::Run { plan } => RunPlan::from_file(&plan)?,
        Command::Census {
            filter,
            census_id,
            inputs,
        } => RunPlan::single(Dataset::Census {
            filter,
            census_id,
            inputs,
            out_dir: None,
        }),
        Command::Election { election, inputs } => RunPlan::single(Dataset::Election {
            election,
            inputs,
            out_dir: None,
        }),
    }
    .with_overrides(cli.out_dir, cli.error_policy);

    // ─── 3) load ─────────────────────────────────────────────────────
    let summaries = plan.run()?;
    report(&summaries);

    info!(
        files = summaries.len(),
        "done; run psql from {} with -f {}",
        plan.out_dir.display(),
        sql::SQL_FILE
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_flags_reach_run() -> Result<()> {
        let cli = Cli::try_parse_from(["cadata", "--error-policy", "skip-and-report", "run", "plan.yaml"])?;
        assert_eq!(cli.error_policy, Some(ErrorPolicy::SkipAndReport));
        assert_eq!(cli.out_dir, None);

        let cli = Cli::try_parse_from(["cadata", "run", "plan.yaml", "--out-dir", "out"])?;
        assert_eq!(cli.out_dir, Some(PathBuf::from("out")));
        assert_eq!(cli.error_policy, None);
        assert!(matches!(cli.command, Command::Run { plan } if plan == PathBuf::from("plan.yaml")));
        Ok(())
    }
}
