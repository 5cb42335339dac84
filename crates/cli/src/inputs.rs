//! Config and table loading shared by the subcommands.

use std::path::Path;

use matplan_io::{load_sources, SourceFingerprint};
use matplan_recon::{Dashboard, MatplanConfig};

use crate::CliError;

pub(crate) fn read_config(path: &Path) -> Result<MatplanConfig, CliError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| CliError::io(format!("cannot read config {}: {e}", path.display())))?;
    Ok(MatplanConfig::from_toml(&text)?)
}

/// Loaded inputs behind a memoizing dashboard, plus what was read.
pub(crate) struct Session {
    pub dashboard: Dashboard,
    pub fingerprints: Vec<SourceFingerprint>,
}

/// Read the config and every table it names. Paths resolve against the
/// config file's directory.
pub(crate) fn open(config_path: &Path) -> Result<Session, CliError> {
    let config = read_config(config_path)?;
    let base_dir = config_path.parent().unwrap_or_else(|| Path::new("."));
    let loaded = load_sources(&config, base_dir)?;

    for fp in &loaded.fingerprints {
        log::debug!("{} {} ({} rows, {})", fp.kind, fp.path, fp.rows, fp.sha256);
    }
    Ok(Session {
        dashboard: Dashboard::new(loaded.tables, config),
        fingerprints: loaded.fingerprints,
    })
}
