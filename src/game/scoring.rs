use image::RgbaImage;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::classifier::ClassificationResult;

use super::state::ROUND_SECONDS;

pub const MAX_SPEED_BONUS: u32 = 20;
pub const STYLE_BONUS_RANGE: std::ops::Range<u32> = 0..30;
pub const FALLBACK_SCORE_RANGE: std::ops::Range<u32> = 30..80;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub confidence: u32,
    pub speed: u32,
    pub style: u32,
}

impl ScoreBreakdown {
    pub fn total(&self) -> u32 {
        self.confidence + self.speed + self.style
    }
}

/// Stand-in for a drawing complexity analysis. Implementations receive the
/// raster that was submitted for classification.
pub trait ComplexityEstimator: Send + Sync {
    fn estimate(&self, raster: &RgbaImage) -> u32;
}

/// Placeholder heuristic: a random bonus in `[0, 30)` that ignores the drawing.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomComplexity;

impl ComplexityEstimator for RandomComplexity {
    fn estimate(&self, _raster: &RgbaImage) -> u32 {
        rand::thread_rng().gen_range(STYLE_BONUS_RANGE)
    }
}

/// `floor(confidence * 100)`.
pub fn confidence_component(confidence: f64) -> u32 {
    (confidence.clamp(0.0, 1.0) * 100.0).floor() as u32
}

/// `floor(elapsed / 60 * 20)`: grows with the time used, not the time saved.
pub fn speed_component(time_remaining_secs: u32) -> u32 {
    let elapsed = ROUND_SECONDS.saturating_sub(time_remaining_secs.min(ROUND_SECONDS));
    (elapsed as f64 / ROUND_SECONDS as f64 * MAX_SPEED_BONUS as f64).floor() as u32
}

pub fn score_classification(
    result: &ClassificationResult,
    time_remaining_secs: u32,
    style_bonus: u32,
) -> ScoreBreakdown {
    ScoreBreakdown {
        confidence: confidence_component(result.confidence()),
        speed: speed_component(time_remaining_secs),
        style: style_bonus,
    }
}

/// Score awarded when the classifier could not be reached.
pub fn fallback_score() -> u32 {
    rand::thread_rng().gen_range(FALLBACK_SCORE_RANGE)
}
