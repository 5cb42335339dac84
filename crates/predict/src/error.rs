use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PredictError {
    #[error("insufficient training data: need at least {needed} C-checks with consumption, found {found}")]
    InsufficientData { needed: usize, found: usize },
    #[error("cannot access model file {path}: {source}")]
    ModelIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid model file {path}: {message}")]
    ModelFormat { path: PathBuf, message: String },
    #[error("model expects {expected} features, input has {found}")]
    FeatureMismatch { expected: usize, found: usize },
}
