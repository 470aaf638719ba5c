pub mod http;

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use http::HttpClassifier;

/// Style prediction for one submitted drawing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClassificationResult {
    pub predicted_style: String,
    pub confidence_score: f64,
    #[serde(default)]
    pub all_predictions: HashMap<String, f64>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub suggestions: Vec<String>,
}

impl ClassificationResult {
    /// Confidence clamped into `[0, 1]`; servers occasionally report slightly out of range.
    pub fn confidence(&self) -> f64 {
        if self.confidence_score.is_nan() {
            0.0
        } else {
            self.confidence_score.clamp(0.0, 1.0)
        }
    }
}

#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, png: Vec<u8>, file_name: &str) -> Result<ClassificationResult>;
}
