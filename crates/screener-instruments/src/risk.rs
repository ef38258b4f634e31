use serde::{Deserialize, Serialize};
use ts_rs::TS;

use screener_core::models::result::RiskBand;

/// Lower edges of the `low`, `moderate` and `high` bands. A score equal to
/// an edge belongs to the higher band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RiskThresholds {
    pub low: i64,
    pub moderate: i64,
    pub high: i64,
}

impl Default for RiskThresholds {
    /// PHQ-9 / GAD-7 reference cutoffs.
    fn default() -> Self {
        Self {
            low: 5,
            moderate: 10,
            high: 15,
        }
    }
}

impl RiskThresholds {
    pub fn band(&self, score: i64) -> RiskBand {
        if score >= self.high {
            RiskBand::High
        } else if score >= self.moderate {
            RiskBand::Moderate
        } else if score >= self.low {
            RiskBand::Low
        } else {
            RiskBand::Minimal
        }
    }

    /// Edges must be non-negative and strictly increasing.
    pub fn check(&self) -> Result<(), String> {
        if self.low < 0 {
            return Err(format!("low edge {} is negative", self.low));
        }
        if !(self.low < self.moderate && self.moderate < self.high) {
            return Err(format!(
                "edges must increase strictly, got low={} moderate={} high={}",
                self.low, self.moderate, self.high
            ));
        }
        Ok(())
    }
}

/// Band the highest of `scores` with the reference table. No scores means
/// no signal, which is `Minimal`.
pub fn classify(scores: &[i64]) -> RiskBand {
    let thresholds = RiskThresholds::default();
    scores
        .iter()
        .max()
        .map_or(RiskBand::Minimal, |&max| thresholds.band(max))
}

/// Band each score by its own instrument's table and keep the most severe.
/// With one shared table this is the same as banding the maximum score.
pub fn classify_each(scores: &[(i64, &RiskThresholds)]) -> RiskBand {
    scores
        .iter()
        .map(|(score, thresholds)| thresholds.band(*score))
        .max()
        .unwrap_or_default()
}
