use serde::Deserialize;

use crate::error::ReconError;
use crate::model::MaterialCategory;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MatplanConfig {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default)]
    pub tables: TablesConfig,
    #[serde(default)]
    pub vouchers: VoucherConfig,
    #[serde(default)]
    pub matching: MatchingConfig,
    #[serde(default)]
    pub predictor: PredictorConfig,
}

fn default_name() -> String {
    "matplan".into()
}

impl Default for MatplanConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            tables: TablesConfig::default(),
            vouchers: VoucherConfig::default(),
            matching: MatchingConfig::default(),
            predictor: PredictorConfig::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

/// Input file paths, relative to the config file's directory.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TablesConfig {
    pub workpacks: Option<String>,
    pub utilization: Option<String>,
    pub consumption: Option<String>,
    pub planned: Option<String>,
}

// ---------------------------------------------------------------------------
// Vouchers
// ---------------------------------------------------------------------------

/// Voucher modes that count as consumable or rotable movements.
///
/// AA: to aircraft, AS: to store, EA: from aircraft, ES: from store,
/// YA: rotable install, YE: rotable removal.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VoucherConfig {
    #[serde(default = "default_consumable")]
    pub consumable: Vec<String>,
    #[serde(default = "default_rotable")]
    pub rotable: Vec<String>,
    /// Drop consumption lines whose voucher mode is in neither list.
    #[serde(default = "default_true")]
    pub require_tracked: bool,
}

fn default_consumable() -> Vec<String> {
    ["AA", "EA", "AS", "ES"].iter().map(|s| s.to_string()).collect()
}

fn default_rotable() -> Vec<String> {
    ["YA", "YE"].iter().map(|s| s.to_string()).collect()
}

fn default_true() -> bool {
    true
}

impl Default for VoucherConfig {
    fn default() -> Self {
        Self {
            consumable: default_consumable(),
            rotable: default_rotable(),
            require_tracked: true,
        }
    }
}

impl VoucherConfig {
    /// Category for a voucher mode. Comparison is exact after trimming.
    pub fn categorize(&self, voucher: &str) -> Option<MaterialCategory> {
        let code = voucher.trim();
        if self.consumable.iter().any(|c| c == code) {
            Some(MaterialCategory::Consumable)
        } else if self.rotable.iter().any(|c| c == code) {
            Some(MaterialCategory::Rotable)
        } else {
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Matching
// ---------------------------------------------------------------------------

/// What happens when an unkeyed consumption line falls inside the windows of
/// several work packages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlapPolicy {
    /// Every work package whose window contains the line counts it.
    /// A line can therefore be counted more than once.
    #[default]
    Shared,
    /// The first work package in table order claims the line; later
    /// work packages no longer see it.
    Exclusive,
}

impl std::fmt::Display for OverlapPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Shared => write!(f, "shared"),
            Self::Exclusive => write!(f, "exclusive"),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MatchingConfig {
    #[serde(default)]
    pub overlap: OverlapPolicy,
}

// ---------------------------------------------------------------------------
// Predictor
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize, serde::Serialize)]
#[serde(deny_unknown_fields)]
pub struct PredictorConfig {
    #[serde(default = "default_n_trees")]
    pub n_trees: usize,
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    #[serde(default = "default_min_samples_split")]
    pub min_samples_split: usize,
    #[serde(default = "default_min_samples_leaf")]
    pub min_samples_leaf: usize,
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default = "default_cv_folds")]
    pub cv_folds: usize,
    #[serde(default = "default_min_training_samples")]
    pub min_training_samples: usize,
    /// Minimum model confidence (0-100) before falling back to the plan.
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f64,
}

fn default_n_trees() -> usize {
    100
}
fn default_max_depth() -> usize {
    10
}
fn default_min_samples_split() -> usize {
    5
}
fn default_min_samples_leaf() -> usize {
    2
}
fn default_seed() -> u64 {
    42
}
fn default_cv_folds() -> usize {
    5
}
fn default_min_training_samples() -> usize {
    10
}
fn default_confidence_threshold() -> f64 {
    30.0
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            n_trees: default_n_trees(),
            max_depth: default_max_depth(),
            min_samples_split: default_min_samples_split(),
            min_samples_leaf: default_min_samples_leaf(),
            seed: default_seed(),
            cv_folds: default_cv_folds(),
            min_training_samples: default_min_training_samples(),
            confidence_threshold: default_confidence_threshold(),
        }
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl MatplanConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: MatplanConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        let v = &self.vouchers;

        if v.require_tracked && v.consumable.is_empty() && v.rotable.is_empty() {
            return Err(ReconError::ConfigValidation(
                "vouchers.require_tracked is set but no voucher modes are listed".into(),
            ));
        }

        if let Some(code) = v.consumable.iter().find(|c| v.rotable.contains(c)) {
            return Err(ReconError::ConfigValidation(format!(
                "voucher mode '{code}' is listed as both consumable and rotable"
            )));
        }

        let p = &self.predictor;
        if p.n_trees == 0 {
            return Err(ReconError::ConfigValidation("predictor.n_trees must be at least 1".into()));
        }
        if p.max_depth == 0 {
            return Err(ReconError::ConfigValidation("predictor.max_depth must be at least 1".into()));
        }
        if p.min_samples_leaf == 0 {
            return Err(ReconError::ConfigValidation(
                "predictor.min_samples_leaf must be at least 1".into(),
            ));
        }
        if p.cv_folds < 2 {
            return Err(ReconError::ConfigValidation(format!(
                "predictor.cv_folds must be at least 2, got {}",
                p.cv_folds
            )));
        }
        if !(0.0..=100.0).contains(&p.confidence_threshold) {
            return Err(ReconError::ConfigValidation(format!(
                "predictor.confidence_threshold must be within 0..=100, got {}",
                p.confidence_threshold
            )));
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
