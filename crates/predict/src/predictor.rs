use std::path::Path;

use serde::{Deserialize, Serialize};

use matplan_recon::config::PredictorConfig;
use matplan_recon::model::MasterView;

use crate::error::PredictError;
use crate::features::{build_training_set, median, FeatureRow, PredictionInput, Encoders, FEATURE_LABELS, FEATURE_NAMES};
use crate::forest::{r2_score, ForestParams, RandomForest};
use crate::scaler::StandardScaler;

/// Bumped when the persisted layout changes.
pub const MODEL_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingStats {
    pub n_samples: usize,
    pub cv_folds: usize,
    pub cv_mean_r2: f64,
    pub cv_std_r2: f64,
    pub target_mean: f64,
    /// Sample standard deviation of the target.
    pub target_std: f64,
    pub target_min: f64,
    pub target_max: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictionMethod {
    MlModel,
    AdjustedPlanned,
    HistoricalAverage,
}

impl std::fmt::Display for PredictionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MlModel => write!(f, "ML Model"),
            Self::AdjustedPlanned => write!(f, "Adjusted Planned Material"),
            Self::HistoricalAverage => write!(f, "Historical Average"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    /// Predicted consumed part count.
    pub prediction: i64,
    /// 0-100, one decimal.
    pub confidence: f64,
    pub ci_lower: i64,
    pub ci_upper: i64,
    /// Spread of the individual tree predictions; ML only.
    pub std: Option<f64>,
    pub method: PredictionMethod,
    pub explanation: String,
}

fn round_to(v: f64, decimals: i32) -> f64 {
    let f = 10f64.powi(decimals);
    (v * f).round() / f
}

fn mean_std(values: &[f64], ddof: usize) -> (f64, f64) {
    let n = values.len();
    if n == 0 {
        return (0.0, 0.0);
    }
    let mean = values.iter().sum::<f64>() / n as f64;
    if n <= ddof {
        return (mean, 0.0);
    }
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - ddof) as f64;
    (mean, var.sqrt())
}

/// Contiguous, unshuffled k-fold R² scores. The first `n % k` folds hold
/// one extra sample.
pub fn cross_validate(x: &[FeatureRow], y: &[f64], params: ForestParams, folds: usize) -> Vec<f64> {
    let n = x.len().min(y.len());
    let k = folds.min(n);
    if k < 2 {
        return Vec::new();
    }

    let mut scores = Vec::with_capacity(k);
    let mut start = 0;
    for fold in 0..k {
        let size = n / k + usize::from(fold < n % k);
        let test = start..start + size;
        start += size;

        let (train_x, train_y): (Vec<FeatureRow>, Vec<f64>) = (0..n)
            .filter(|i| !test.contains(i))
            .map(|i| (x[i], y[i]))
            .unzip();
        let forest = RandomForest::fit(&train_x, &train_y, params);
        let predicted: Vec<f64> = test.clone().map(|i| forest.predict(&x[i])).collect();
        scores.push(r2_score(&y[test], &predicted));
    }
    scores
}

/// Random-forest predictor of consumed part counts for upcoming C-checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialPredictor {
    format_version: u32,
    feature_names: Vec<String>,
    encoders: Encoders,
    scaler: StandardScaler,
    forest: RandomForest,
    stats: TrainingStats,
    /// Median consumed/planned ratio over training rows with a plan.
    planning_accuracy_factor: f64,
    confidence_threshold: f64,
}

impl MaterialPredictor {
    pub fn train(view: &MasterView, config: &PredictorConfig) -> Result<Self, PredictError> {
        let set = build_training_set(view);
        if set.len() < config.min_training_samples.max(1) {
            return Err(PredictError::InsufficientData {
                needed: config.min_training_samples.max(1),
                found: set.len(),
            });
        }

        let params = ForestParams::from(config);
        let scaler = StandardScaler::fit(&set.rows);
        let x = scaler.transform_all(&set.rows);
        let forest = RandomForest::fit(&x, &set.target, params);

        let scores = cross_validate(&x, &set.target, params, config.cv_folds);
        let (cv_mean_r2, cv_std_r2) = mean_std(&scores, 0);
        let (target_mean, target_std) = mean_std(&set.target, 1);

        let planning_accuracy_factor = if set.accuracy_ratios.is_empty() {
            1.0
        } else {
            median(&set.accuracy_ratios)
        };

        let stats = TrainingStats {
            n_samples: set.len(),
            cv_folds: scores.len(),
            cv_mean_r2,
            cv_std_r2,
            target_mean,
            target_std,
            target_min: set.target.iter().copied().fold(f64::INFINITY, f64::min),
            target_max: set.target.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        };
        log::info!(
            "trained on {} samples, cross-validation R² {:.3} (+/- {:.3})",
            stats.n_samples,
            stats.cv_mean_r2,
            stats.cv_std_r2
        );

        Ok(Self {
            format_version: MODEL_FORMAT_VERSION,
            feature_names: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
            encoders: set.encoders,
            scaler,
            forest,
            stats,
            planning_accuracy_factor,
            confidence_threshold: config.confidence_threshold,
        })
    }

    pub fn stats(&self) -> &TrainingStats {
        &self.stats
    }

    pub fn encoders(&self) -> &Encoders {
        &self.encoders
    }

    pub fn planning_accuracy_factor(&self) -> f64 {
        self.planning_accuracy_factor
    }

    /// Feature labels with importances, most important first.
    pub fn feature_importance(&self) -> Vec<(&'static str, f64)> {
        let mut out: Vec<(&'static str, f64)> = FEATURE_LABELS
            .iter()
            .copied()
            .zip(self.forest.feature_importances().iter().copied())
            .collect();
        out.sort_by(|a, b| b.1.total_cmp(&a.1));
        out
    }

    /// Model prediction with a 95% interval from the spread of the trees.
    pub fn predict(&self, input: &PredictionInput) -> Prediction {
        let row = self.scaler.transform(&input.features(&self.encoders));
        let trees = self.forest.tree_predictions(&row);
        let (p, std) = mean_std(&trees, 0);
        let confidence = (100.0 * (1.0 - std / p.max(1.0))).clamp(0.0, 100.0);

        Prediction {
            prediction: p.round() as i64,
            confidence: round_to(confidence, 1),
            ci_lower: (p - 1.96 * std).max(0.0).round() as i64,
            ci_upper: (p + 1.96 * std).round() as i64,
            std: Some(round_to(std, 2)),
            method: PredictionMethod::MlModel,
            explanation: format!(
                "Prediction based on random forest model trained on {} C-checks",
                self.stats.n_samples
            ),
        }
    }

    /// Model prediction when confident enough; otherwise the plan scaled by
    /// the historical accuracy factor; otherwise the training mean.
    pub fn predict_with_fallback(&self, input: &PredictionInput, planned_parts: Option<usize>) -> Option<Prediction> {
        let ml = self.predict(input);
        if ml.confidence > self.confidence_threshold {
            return Some(ml);
        }
        log::debug!(
            "model confidence {:.1} not above {:.1}, falling back",
            ml.confidence,
            self.confidence_threshold
        );

        if let Some(planned) = planned_parts.filter(|&p| p > 0) {
            let adjusted = (planned as f64 * self.planning_accuracy_factor).round();
            return Some(Prediction {
                prediction: adjusted as i64,
                confidence: 60.0,
                ci_lower: (adjusted * 0.8).round() as i64,
                ci_upper: (adjusted * 1.2).round() as i64,
                std: None,
                method: PredictionMethod::AdjustedPlanned,
                explanation: format!(
                    "Based on planned material ({planned} parts) adjusted by historical accuracy factor ({:.2})",
                    self.planning_accuracy_factor
                ),
            });
        }

        if self.stats.n_samples == 0 {
            return None;
        }
        let (mean, std) = (self.stats.target_mean, self.stats.target_std);
        Some(Prediction {
            prediction: mean.round() as i64,
            confidence: 40.0,
            ci_lower: (mean - std).round() as i64,
            ci_upper: (mean + std).round() as i64,
            std: None,
            method: PredictionMethod::HistoricalAverage,
            explanation: format!(
                "Based on average material usage from {} historical C-checks",
                self.stats.n_samples
            ),
        })
    }

    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    pub fn save(&self, path: &Path) -> Result<(), PredictError> {
        let json = serde_json::to_string_pretty(self).map_err(|e| PredictError::ModelFormat {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        std::fs::write(path, json).map_err(|source| PredictError::ModelIo {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load(path: &Path) -> Result<Self, PredictError> {
        let text = std::fs::read_to_string(path).map_err(|source| PredictError::ModelIo {
            path: path.to_path_buf(),
            source,
        })?;
        let format_err = |message: String| PredictError::ModelFormat {
            path: path.to_path_buf(),
            message,
        };
        let model: Self = serde_json::from_str(&text).map_err(|e| format_err(e.to_string()))?;

        if model.format_version != MODEL_FORMAT_VERSION {
            return Err(format_err(format!(
                "format version {} (expected {MODEL_FORMAT_VERSION})",
                model.format_version
            )));
        }
        if model.feature_names != FEATURE_NAMES {
            return Err(format_err(format!(
                "feature columns {:?} do not match {:?}",
                model.feature_names, FEATURE_NAMES
            )));
        }
        if model.scaler.width() != FEATURE_NAMES.len() {
            return Err(PredictError::FeatureMismatch {
                expected: FEATURE_NAMES.len(),
                found: model.scaler.width(),
            });
        }
        Ok(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::N_FEATURES;

    #[test]
    fn folds_cover_every_sample_once() {
        let x: Vec<FeatureRow> = (0..7)
            .map(|i| {
                let mut r = [0.0; N_FEATURES];
                r[1] = i as f64;
                r
            })
            .collect();
        let y: Vec<f64> = (0..7).map(|i| i as f64).collect();
        let params = ForestParams {
            n_trees: 3,
            max_depth: 3,
            min_samples_split: 2,
            min_samples_leaf: 1,
            seed: 1,
        };
        assert_eq!(cross_validate(&x, &y, params, 3).len(), 3);
        // more folds than samples
        assert_eq!(cross_validate(&x[..2], &y[..2], params, 5).len(), 2);
        assert!(cross_validate(&x[..1], &y[..1], params, 5).is_empty());
    }

    #[test]
    fn sample_vs_population_std() {
        let (m, s) = mean_std(&[2.0, 4.0], 1);
        assert_eq!(m, 3.0);
        assert!((s - 2f64.sqrt()).abs() < 1e-12);
        assert_eq!(mean_std(&[2.0, 4.0], 0).1, 1.0);
        assert_eq!(mean_std(&[5.0], 1), (5.0, 0.0));
    }

    #[test]
    fn method_labels() {
        assert_eq!(PredictionMethod::MlModel.to_string(), "ML Model");
        assert_eq!(PredictionMethod::AdjustedPlanned.to_string(), "Adjusted Planned Material");
    }
}
