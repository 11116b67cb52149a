// src/error.rs

use thiserror::Error;

/// Errors raised while turning source rows into output rows.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("line {line}: malformed row: {reason}")]
    MalformedRow { line: u64, reason: String },

    #[error("line {line}: vote count {value:?} is not an integer")]
    InvalidVotes { line: u64, value: String },

    #[error("no province for electoral district {district:?}")]
    UnknownProvince { district: String },

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl LoadError {
    /// Row-level errors can be skipped under `ErrorPolicy::SkipAndReport`;
    /// I/O and reader failures always abort the load.
    pub fn is_row_error(&self) -> bool {
        matches!(
            self,
            LoadError::MalformedRow { .. }
                | LoadError::InvalidVotes { .. }
                | LoadError::UnknownProvince { .. }
        )
    }
}
