use std::path::PathBuf;

use thiserror::Error;

use crate::kind::TableKind;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot parse {path}: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("{path}: unsupported file type (expected .csv, .tsv, .txt, .xlsx, .xls, .xlsb or .ods)")]
    UnsupportedFormat { path: PathBuf },
    #[error("{path}: expected {expected} table, found {found}")]
    WrongKind {
        path: PathBuf,
        expected: TableKind,
        found: String,
    },
    #[error("{path}: {kind} table is missing columns: {}", missing.join(", "))]
    MissingColumns {
        path: PathBuf,
        kind: TableKind,
        missing: Vec<String>,
    },
    #[error("csv write error: {0}")]
    Write(#[from] csv::Error),
}
