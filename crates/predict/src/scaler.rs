use serde::{Deserialize, Serialize};

use crate::features::{FeatureRow, N_FEATURES};

/// Per-feature standardization to zero mean and unit variance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    mean: Vec<f64>,
    scale: Vec<f64>,
}

impl StandardScaler {
    /// Population statistics; a constant feature keeps scale 1.
    pub fn fit(rows: &[FeatureRow]) -> Self {
        let n = rows.len().max(1) as f64;
        let mut mean = vec![0.0; N_FEATURES];
        for row in rows {
            for (m, x) in mean.iter_mut().zip(row) {
                *m += x / n;
            }
        }
        let mut scale = vec![0.0; N_FEATURES];
        for row in rows {
            for j in 0..N_FEATURES {
                scale[j] += (row[j] - mean[j]).powi(2) / n;
            }
        }
        for s in scale.iter_mut() {
            *s = s.sqrt();
            if *s == 0.0 || !s.is_finite() {
                *s = 1.0;
            }
        }
        Self { mean, scale }
    }

    pub fn transform(&self, row: &FeatureRow) -> FeatureRow {
        let mut out = *row;
        for j in 0..N_FEATURES {
            out[j] = (row[j] - self.mean[j]) / self.scale[j];
        }
        out
    }

    pub fn transform_all(&self, rows: &[FeatureRow]) -> Vec<FeatureRow> {
        rows.iter().map(|r| self.transform(r)).collect()
    }

    pub(crate) fn width(&self) -> usize {
        self.mean.len().min(self.scale.len())
    }
}
