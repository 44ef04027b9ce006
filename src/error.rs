use std::path::PathBuf;

use chrono::NaiveDate;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("failed to open {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed page view row: {0}")]
    Csv(#[from] csv::Error),

    #[error("duplicate date {date} in page view series")]
    DuplicateDate { date: NaiveDate },

    #[error("page view series contains no rows")]
    Empty,
}

#[derive(Error, Debug)]
pub enum CleanError {
    #[error("cannot clean an empty page view series")]
    Empty,

    #[error("no rows left after keeping values within [{low}, {high}]")]
    NothingLeft { low: f64, high: f64 },
}
