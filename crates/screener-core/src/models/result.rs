use std::fmt;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Coarse severity band derived from instrument scores. Ordered from least
/// to most severe so the highest band can be taken with `max`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum RiskBand {
    #[default]
    Minimal,
    Low,
    Moderate,
    High,
}

impl RiskBand {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Minimal => "minimal",
            Self::Low => "low",
            Self::Moderate => "moderate",
            Self::High => "high",
        }
    }
}

impl fmt::Display for RiskBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct InstrumentScore {
    pub instrument_id: String,
    pub score: i64,
}

/// The reportable outcome of a submitted questionnaire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct QuestionnaireResult {
    pub instrument_scores: Vec<InstrumentScore>,
    pub risk_band: RiskBand,
    #[ts(type = "string")]
    pub duration_since_start: jiff::SignedDuration,
}

impl QuestionnaireResult {
    pub fn score_for(&self, instrument_id: &str) -> Option<i64> {
        self.instrument_scores
            .iter()
            .find(|s| s.instrument_id == instrument_id)
            .map(|s| s.score)
    }
}
