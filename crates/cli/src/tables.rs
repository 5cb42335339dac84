//! `matplan detect` and `matplan validate`.

use std::path::PathBuf;

use serde::Serialize;

use matplan_io::{detect_table_kind, missing_columns, read_table, TableKind};

use crate::inputs::read_config;
use crate::CliError;

#[derive(Serialize)]
struct Detection {
    path: String,
    kind: Option<TableKind>,
    rows: usize,
    columns: usize,
    missing_columns: Vec<String>,
}

pub fn cmd_detect(files: Vec<PathBuf>, json: bool) -> Result<(), CliError> {
    let mut found = Vec::with_capacity(files.len());
    for path in &files {
        let table = read_table(path)?;
        let kind = detect_table_kind(&table.headers);
        found.push(Detection {
            path: path.display().to_string(),
            kind,
            rows: table.len(),
            columns: table.headers.len(),
            missing_columns: kind.map(|k| missing_columns(k, &table.headers)).unwrap_or_default(),
        });
    }

    if json {
        let s = serde_json::to_string_pretty(&found)
            .map_err(|e| CliError::general(format!("JSON serialization error: {e}")))?;
        println!("{s}");
        return Ok(());
    }

    for d in &found {
        match d.kind {
            Some(kind) => println!("{}: {} ({} rows, {} columns)", d.path, kind, d.rows, d.columns),
            None => println!("{}: unrecognized ({} rows, {} columns)", d.path, d.rows, d.columns),
        }
        if !d.missing_columns.is_empty() {
            println!("  missing: {}", d.missing_columns.join(", "));
        }
    }
    Ok(())
}

pub fn cmd_validate(config: PathBuf) -> Result<(), CliError> {
    let cfg = read_config(&config)?;
    let configured = [
        ("workpacks", &cfg.tables.workpacks),
        ("utilization", &cfg.tables.utilization),
        ("consumption", &cfg.tables.consumption),
        ("planned", &cfg.tables.planned),
    ]
    .iter()
    .filter(|(_, file)| file.is_some())
    .map(|(name, _)| *name)
    .collect::<Vec<_>>();

    println!("{}: valid", config.display());
    println!("  name:    {}", cfg.name);
    println!(
        "  tables:  {}",
        if configured.is_empty() { "none".to_string() } else { configured.join(", ") }
    );
    println!("  overlap: {}", cfg.matching.overlap);
    Ok(())
}
