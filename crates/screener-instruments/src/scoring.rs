use serde::{Deserialize, Serialize};
use ts_rs::TS;

use screener_core::models::answer::{AnswerMap, AnswerValue};
use screener_core::models::result::InstrumentScore;

use crate::risk::RiskThresholds;

/// Scoring definition for one instrument: a fixed, ordered id list summed
/// without weighting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct InstrumentDefinition {
    pub id: String,
    pub name: String,
    pub question_ids: Vec<String>,
    /// Overrides the questionnaire-wide threshold table for this instrument.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thresholds: Option<RiskThresholds>,
}

impl InstrumentDefinition {
    /// Score over the full id list, whether or not every item was shown.
    pub fn score(&self, answers: &AnswerMap) -> InstrumentScore {
        InstrumentScore {
            instrument_id: self.id.clone(),
            score: score(&self.question_ids, answers),
        }
    }
}

/// Sum the numeric answers for `question_ids`. Missing and non-numeric
/// answers contribute zero.
pub fn score(question_ids: &[String], answers: &AnswerMap) -> i64 {
    let total: f64 = question_ids
        .iter()
        .filter_map(|id| answers.get(id))
        .filter_map(AnswerValue::as_number)
        .sum();
    total.round() as i64
}

/// Look up an instrument definition by id.
pub fn find<'a>(instruments: &'a [InstrumentDefinition], id: &str) -> Option<&'a InstrumentDefinition> {
    instruments.iter().find(|i| i.id == id)
}
