use std::path::{Path, PathBuf};

use serde::Serialize;
use sha2::{Digest, Sha256};

use matplan_recon::config::MatplanConfig;
use matplan_recon::model::SourceTables;

use crate::convert;
use crate::error::LoadError;
use crate::kind::{detect_table_kind, missing_columns, TableKind};
use crate::table::RawTable;

/// Identity of one loaded input file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceFingerprint {
    pub kind: TableKind,
    pub path: String,
    pub rows: usize,
    /// `"sha256:<64 hex>"` over the file bytes.
    pub sha256: String,
}

#[derive(Debug, Default)]
pub struct LoadedSources {
    pub tables: SourceTables,
    pub fingerprints: Vec<SourceFingerprint>,
    /// Optional tables that were configured but could not be loaded. Each
    /// such table is absent from `tables`.
    pub warnings: Vec<LoadError>,
}

pub fn sha256_file(path: &Path) -> Result<String, LoadError> {
    let bytes = std::fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(format!("sha256:{:x}", hasher.finalize()))
}

/// Read a table from disk, dispatching on file extension.
pub fn read_table(path: &Path) -> Result<RawTable, LoadError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "csv" | "tsv" | "txt" => crate::csv::import(path),
        "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => crate::xlsx::import(path),
        _ => Err(LoadError::UnsupportedFormat {
            path: path.to_path_buf(),
        }),
    }
}

/// Read a table and check it holds `kind` with every required column.
pub fn read_table_as(path: &Path, kind: TableKind) -> Result<RawTable, LoadError> {
    let table = read_table(path)?;

    if let Some(found) = detect_table_kind(&table.headers) {
        if found != kind {
            return Err(LoadError::WrongKind {
                path: path.to_path_buf(),
                expected: kind,
                found: found.to_string(),
            });
        }
    }

    let missing = missing_columns(kind, &table.headers);
    if !missing.is_empty() {
        return Err(LoadError::MissingColumns {
            path: path.to_path_buf(),
            kind,
            missing,
        });
    }

    log::info!("{}: {} {} rows", path.display(), table.len(), kind);
    Ok(table)
}

fn resolve(base_dir: &Path, file: &str) -> PathBuf {
    let p = Path::new(file);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        base_dir.join(p)
    }
}

/// Load every table named in `[tables]`; unconfigured tables stay absent.
///
/// Only a failed work package table is an error. A utilization, consumption
/// or planned table that cannot be read or validated is logged, recorded in
/// [`LoadedSources::warnings`] and treated as unavailable.
pub fn load_sources(config: &MatplanConfig, base_dir: &Path) -> Result<LoadedSources, LoadError> {
    let mut out = LoadedSources::default();
    let t = &config.tables;

    let load = |out: &mut LoadedSources,
                file: &Option<String>,
                kind: TableKind|
     -> Result<Option<RawTable>, LoadError> {
        let Some(file) = file else {
            log::debug!("{kind} table not configured");
            return Ok(None);
        };
        let path = resolve(base_dir, file);
        let table = read_table_as(&path, kind)?;
        out.fingerprints.push(SourceFingerprint {
            kind,
            path: path.display().to_string(),
            rows: table.len(),
            sha256: sha256_file(&path)?,
        });
        Ok(Some(table))
    };

    let workpacks = load(&mut out, &t.workpacks, TableKind::WorkPackages)?;

    let optional = |out: &mut LoadedSources, file: &Option<String>, kind: TableKind| match load(out, file, kind) {
        Ok(table) => table,
        Err(e) => {
            log::warn!("{kind} data unavailable: {e}");
            out.warnings.push(e);
            None
        }
    };
    let utilization = optional(&mut out, &t.utilization, TableKind::Utilization);
    let consumption = optional(&mut out, &t.consumption, TableKind::Consumption);
    let planned = optional(&mut out, &t.planned, TableKind::Planned);

    out.tables = SourceTables {
        workpacks: workpacks.as_ref().map(convert::to_work_packages),
        utilization: utilization.as_ref().map(convert::to_utilization),
        consumption: consumption.as_ref().map(convert::to_consumption),
        planned: planned.as_ref().map(convert::to_planned),
    };
    Ok(out)
}
