//! `matplan-recon`: maintenance material reconciliation engine.
//!
//! Pure engine crate: receives pre-loaded work packages, utilization
//! snapshots, consumption and planned material, and returns the enriched
//! master view plus statistics derived from it. No CLI or IO dependencies.
//!
//! Consumption reaches a work package either through its key (DIRECT) or,
//! for unkeyed lines, through the work package's time window, station and
//! aircraft (HEURISTIC). See [`matcher::match_consumption`].

pub mod aggregate;
pub mod analysis;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod master;
pub mod matcher;
pub mod model;
pub mod stats;
pub mod utilization;
pub mod voucher;

pub use config::{MatplanConfig, OverlapPolicy};
pub use dashboard::Dashboard;
pub use error::ReconError;
pub use master::build_master_view;
pub use model::{MasterRecord, MasterView, MatchMethod, MaterialLine, SourceTables, WorkPackage};
