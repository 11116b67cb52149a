use csv::{Writer, WriterBuilder};
use serde::Serialize;
use std::{
    fs::{File, OpenOptions},
    path::Path,
};

use crate::error::LoadError;

/// How an output CSV is opened at the start of a per-file load.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputMode {
    Truncate,
    Append,
}

impl OutputMode {
    /// First file of a session truncates, every later one appends.
    pub fn for_index(i: usize) -> Self {
        if i == 0 {
            OutputMode::Truncate
        } else {
            OutputMode::Append
        }
    }

    fn open(self, path: &Path) -> std::io::Result<File> {
        let mut opts = OpenOptions::new();
        opts.create(true);
        match self {
            OutputMode::Truncate => opts.write(true).truncate(true),
            OutputMode::Append => opts.append(true),
        };
        opts.open(path)
    }
}

/// Headerless CSV writer for one destination table.
pub struct CsvSink {
    writer: Writer<File>,
    rows: u64,
}

impl CsvSink {
    pub fn open(path: impl AsRef<Path>, mode: OutputMode) -> Result<Self, LoadError> {
        let file = mode.open(path.as_ref())?;
        let writer = WriterBuilder::new().has_headers(false).from_writer(file);
        Ok(Self { writer, rows: 0 })
    }

    /// Write one row; struct fields are emitted in declaration order.
    pub fn write<T: Serialize>(&mut self, row: &T) -> Result<(), LoadError> {
        self.writer.serialize(row)?;
        self.rows += 1;
        Ok(())
    }

    /// Flush and return how many rows were written.
    pub fn finish(mut self) -> Result<u64, LoadError> {
        self.writer.flush()?;
        Ok(self.rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::fs;
    use tempfile::tempdir;

    #[derive(Serialize)]
    struct Pair {
        id: u32,
        name: String,
    }

    #[test]
    fn test_truncate_then_append() -> Result<()> {
        let tmp = tempdir()?;
        let path = tmp.path().join("out.csv");
        fs::write(&path, "stale\n")?;

        let mut sink = CsvSink::open(&path, OutputMode::for_index(0))?;
        sink.write(&Pair {
            id: 1,
            name: "Cobourg, Town (T)".into(),
        })?;
        assert_eq!(sink.finish()?, 1);

        let mut sink = CsvSink::open(&path, OutputMode::for_index(1))?;
        sink.write(&Pair {
            id: 2,
            name: "Ottawa".into(),
        })?;
        sink.finish()?;

        assert_eq!(
            fs::read_to_string(&path)?,
            "1,\"Cobourg, Town (T)\"\n2,Ottawa\n"
        );
        Ok(())
    }
}
