use serde::{Deserialize, Serialize};

/// Stand-in for a missing categorical value.
pub const UNKNOWN: &str = "Unknown";

/// Explicit label encoding for one categorical feature.
///
/// Built at training time from the sorted distinct values and stored with
/// the model, so prediction uses exactly the training mapping. Values never
/// seen during training encode as 0.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryEncoder {
    classes: Vec<String>,
}

impl CategoryEncoder {
    pub fn fit<'a, I>(values: I) -> Self
    where
        I: IntoIterator<Item = Option<&'a str>>,
    {
        let mut classes: Vec<String> = values
            .into_iter()
            .map(|v| v.unwrap_or(UNKNOWN).to_string())
            .collect();
        classes.sort();
        classes.dedup();
        Self { classes }
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Index of `value`, `None` if it was not seen during training.
    pub fn index_of(&self, value: Option<&str>) -> Option<usize> {
        let value = value.unwrap_or(UNKNOWN);
        self.classes.binary_search_by(|c| c.as_str().cmp(value)).ok()
    }

    pub fn encode(&self, value: Option<&str>) -> f64 {
        self.index_of(value).unwrap_or(0) as f64
    }
}
