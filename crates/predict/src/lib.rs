//! Material demand prediction for upcoming C-checks.
//!
//! A random forest is trained on master-view rows that have matched
//! consumption and predicts the consumed part count for a new check.
//! Categorical features use an explicit label encoding stored with the
//! model. When the forest is not confident, [`MaterialPredictor::predict_with_fallback`]
//! falls back to the planned part count scaled by the historical planning
//! accuracy, then to the training mean.

pub mod encoding;
pub mod error;
pub mod features;
pub mod forest;
pub mod predictor;
pub mod scaler;
pub mod similar;

pub use error::PredictError;
pub use features::{categorize_check_type, PredictionInput};
pub use predictor::{MaterialPredictor, Prediction, PredictionMethod, TrainingStats};
pub use similar::{find_similar_checks, SimilarCheck};
