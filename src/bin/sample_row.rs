use anyhow::{bail, Context, Result};
use clap::Parser;
use csv::ReaderBuilder;
use std::{fs::File, path::PathBuf};

/// Print one data row of a CSV as `... column=value` lines, to see which
/// columns a new dataset carries before writing a loader for it.
#[derive(Parser, Debug)]
struct Args {
    /// CSV file with a header row
    path: PathBuf,

    /// Which data row to show (1 = first after the header)
    #[arg(long, default_value_t = 1)]
    row: usize,
}

fn main() -> Result<()> {
    let args = Args::parse();
    if args.row == 0 {
        bail!("--row starts at 1");
    }

    let file = File::open(&args.path)
        .with_context(|| format!("opening {}", args.path.display()))?;
    let mut rdr = ReaderBuilder::new().flexible(true).from_reader(file);
    let headers = rdr.headers()?.clone();

    let record = match rdr.records().nth(args.row - 1) {
        Some(record) => record.with_context(|| format!("reading row {}", args.row))?,
        None => bail!("{} has fewer than {} data rows", args.path.display(), args.row),
    };

    println!("{} ({} columns)", args.path.display(), headers.len());
    for (i, k) in headers.iter().enumerate() {
        println!("... [{}] {}={}", i, k, record.get(i).unwrap_or_default());
    }
    if record.len() > headers.len() {
        println!("... {} extra fields", record.len() - headers.len());
    }
    Ok(())
}
