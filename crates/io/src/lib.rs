//! Table loading for matplan.
//!
//! Reads the four input tables from CSV or Excel, checks that each file holds
//! the expected table with its required columns, and coerces cells into the
//! engine model. Also writes the master view back out as flat CSV.

pub mod coerce;
pub mod convert;
pub mod csv;
pub mod error;
pub mod kind;
pub mod sources;
pub mod table;
pub mod xlsx;

pub use crate::csv::write_master_csv;
pub use error::LoadError;
pub use kind::{detect_table_kind, missing_columns, TableKind};
pub use sources::{load_sources, read_table, read_table_as, LoadedSources, SourceFingerprint};
pub use table::RawTable;
