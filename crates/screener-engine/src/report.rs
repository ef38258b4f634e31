//! The only shape a submitted session leaves the engine in when it is bound
//! for analytics: bucketed scores, the risk band, the duration, and a salted
//! subject hash. No answers, no identifiers in the clear.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use ts_rs::TS;
use uuid::Uuid;

use screener_core::models::result::{QuestionnaireResult, RiskBand};

use crate::session::SessionState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum ScoreBucket {
    #[serde(rename = "0-4")]
    UnderFive,
    #[serde(rename = "5-9")]
    FiveToNine,
    #[serde(rename = "10-14")]
    TenToFourteen,
    #[serde(rename = "15+")]
    FifteenPlus,
}

impl ScoreBucket {
    pub fn from_score(score: i64) -> Self {
        match score {
            i64::MIN..=4 => Self::UnderFive,
            5..=9 => Self::FiveToNine,
            10..=14 => Self::TenToFourteen,
            _ => Self::FifteenPlus,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BucketedScore {
    pub instrument_id: String,
    pub bucket: ScoreBucket,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OutcomeReport {
    /// Hex SHA-256 of the salt followed by the session id bytes.
    pub subject: String,
    pub questionnaire_id: String,
    pub questionnaire_version: u32,
    pub risk_band: RiskBand,
    pub score_buckets: Vec<BucketedScore>,
    pub duration_seconds: i64,
}

impl OutcomeReport {
    pub fn build(state: &SessionState, result: &QuestionnaireResult, salt: &str) -> Self {
        Self {
            subject: subject_hash(state.session_id(), salt),
            questionnaire_id: state.questionnaire_id().to_string(),
            questionnaire_version: state.questionnaire_version(),
            risk_band: result.risk_band,
            score_buckets: result
                .instrument_scores
                .iter()
                .map(|s| BucketedScore {
                    instrument_id: s.instrument_id.clone(),
                    bucket: ScoreBucket::from_score(s.score),
                })
                .collect(),
            duration_seconds: result.duration_since_start.as_secs(),
        }
    }
}

pub fn subject_hash(session_id: Uuid, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(session_id.as_bytes());
    format!("{:x}", hasher.finalize())
}
